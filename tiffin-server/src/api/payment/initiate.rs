use axum::{
    Json,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tiffin_core::checkout::UserContext;

use super::PaymentApiError;
use crate::state::AppState;

/// `POST /payment/initiate` — start a payment attempt.
///
/// The amount arrives in major units (rupees, decimal) and is converted to
/// minor units exactly once, inside the coordinator, before signing.
///
/// Two response modes exist because the client may either follow a redirect
/// or drive the gateway page itself: the default is a JSON body carrying the
/// redirect target, `?redirect=true` answers with a 303 to the payment page.
pub(super) async fn initiate_payment(
    state: State<AppState>,
    Query(query): Query<InitiateQuery>,
    Json(body): Json<InitiateBody>,
) -> Result<Response, PaymentApiError> {
    let initiated = state
        .coordinator
        .initiate(
            body.amount,
            UserContext {
                user_id: body.user_id,
                mobile_number: body.mobile_number,
            },
        )
        .await?;

    if query.redirect {
        Ok(Redirect::to(&initiated.redirect_url).into_response())
    } else {
        Ok(Json(initiated).into_response())
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct InitiateBody {
    /// Amount in major currency units.
    pub amount: Decimal,
    pub user_id: String,
    #[serde(default)]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct InitiateQuery {
    #[serde(default)]
    pub redirect: bool,
}

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use tiffin_core::checkout::OrderDraft;

use super::PaymentApiError;
use crate::state::AppState;

/// `POST /payment/validate/{merchant_transaction_id}` — confirm a payment
/// and persist its order.
///
/// Success here is decided by the coordinator's own status check against the
/// gateway, never by the client having reached this endpoint. Calling it
/// again for the same transaction returns the same order.
pub(super) async fn validate_payment(
    state: State<AppState>,
    Path(merchant_transaction_id): Path<String>,
    Json(draft): Json<OrderDraft>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let order = state
        .coordinator
        .confirm(&merchant_transaction_id, draft)
        .await?;

    Ok(Json(order))
}

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use super::OrderApiError;
use crate::state::AppState;

/// `POST /order/{order_id}/collect` — mark an order as picked up.
///
/// Idempotent: collecting an already collected order returns it unchanged.
pub(super) async fn collect_order(
    state: State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderApiError> {
    let order = state
        .coordinator
        .update_pickup_status(order_id)
        .await
        .map_err(OrderApiError::Checkout)?;

    Ok(Json(order))
}

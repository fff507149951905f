use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use tiffin_core::entities::order_records::GetOrderById;
use tiffin_core::framework::DatabaseProcessor;
use uuid::Uuid;

use super::OrderApiError;
use crate::state::AppState;

/// `GET /order/{order_id}` — a single order's details.
pub(super) async fn get_order(
    state: State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let order = processor
        .process(GetOrderById { order_id })
        .await
        .map_err(OrderApiError::Database)?
        .ok_or(OrderApiError::NotFound)?;

    Ok(Json(order))
}

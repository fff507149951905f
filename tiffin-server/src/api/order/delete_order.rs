use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use kanau::processor::Processor;
use tiffin_core::entities::order_records::DeleteOrder;
use tiffin_core::framework::DatabaseProcessor;
use uuid::Uuid;

use super::OrderApiError;
use crate::state::AppState;

/// `DELETE /order/{order_id}` — hard-delete an order.
pub(super) async fn delete_order(
    state: State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, OrderApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let deleted = processor
        .process(DeleteOrder { order_id })
        .await
        .map_err(OrderApiError::Database)?;

    if deleted == 0 {
        return Err(OrderApiError::NotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

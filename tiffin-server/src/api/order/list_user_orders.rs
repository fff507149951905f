use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use tiffin_core::entities::order_records::ListOrdersForUser;
use tiffin_core::framework::DatabaseProcessor;

use super::OrderApiError;
use crate::state::AppState;

/// `GET /order/user/{user_id}` — a user's order history, newest first.
pub(super) async fn list_user_orders(
    state: State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let orders = processor
        .process(ListOrdersForUser { user_id })
        .await
        .map_err(OrderApiError::Database)?;

    Ok(Json(orders))
}

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use kanau::processor::Processor;
use tiffin_core::entities::order_records::ListOrdersForShop;
use tiffin_core::framework::DatabaseProcessor;

use super::OrderApiError;
use crate::state::AppState;

/// `GET /order/shop/{shop_id}` — orders containing the shop's items, for the
/// owner's pickup board.
pub(super) async fn list_shop_orders(
    state: State<AppState>,
    Path(shop_id): Path<String>,
) -> Result<impl IntoResponse, OrderApiError> {
    let processor = DatabaseProcessor {
        pool: state.db.clone(),
    };

    let orders = processor
        .process(ListOrdersForShop { shop_id })
        .await
        .map_err(OrderApiError::Database)?;

    Ok(Json(orders))
}

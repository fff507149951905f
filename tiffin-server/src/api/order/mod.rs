//! Order API handlers.
//!
//! # Endpoints
//!
//! - `GET    /order/user/{user_id}`     – a user's order history
//! - `GET    /order/shop/{shop_id}`     – orders containing a shop's items
//! - `GET    /order/{order_id}`         – a single order's details
//! - `POST   /order/{order_id}/collect` – shop-owner pickup transition
//! - `DELETE /order/{order_id}`         – hard delete

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use tiffin_core::checkout::CheckoutError;

use crate::state::AppState;

mod collect_order;
mod delete_order;
mod get_order;
mod list_shop_orders;
mod list_user_orders;

/// Build the order API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order/user/{user_id}", get(list_user_orders::list_user_orders))
        .route("/order/shop/{shop_id}", get(list_shop_orders::list_shop_orders))
        .route("/order/{order_id}/collect", post(collect_order::collect_order))
        .route(
            "/order/{order_id}",
            get(get_order::get_order).delete(delete_order::delete_order),
        )
}

/// Errors that can occur in order API handlers.
#[derive(Debug)]
pub(super) enum OrderApiError {
    /// A database query failed.
    Database(sqlx::Error),
    /// The requested order was not found.
    NotFound,
    /// The pickup transition failed inside the coordinator.
    Checkout(CheckoutError),
}

impl IntoResponse for OrderApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            OrderApiError::Database(e) => {
                tracing::error!(error = %e, "Order API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            OrderApiError::NotFound => (StatusCode::NOT_FOUND, "order not found").into_response(),
            OrderApiError::Checkout(CheckoutError::UnknownOrder) => {
                (StatusCode::NOT_FOUND, "order not found").into_response()
            }
            OrderApiError::Checkout(e) => {
                tracing::error!(error = %e, "Order API checkout error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

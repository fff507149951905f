//! Payment API handlers.
//!
//! # Endpoints
//!
//! - `POST /payment/initiate`                             – start a payment attempt
//! - `POST /payment/validate/{merchant_transaction_id}`   – confirm and create the order
//!
//! The validate endpoint is where the gateway's browser redirect lands (via
//! the frontend) and is safe to call repeatedly: duplicate confirmations
//! return the already-created order.

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Serialize;
use tiffin_core::checkout::CheckoutError;

use crate::state::AppState;

mod initiate;
mod validate;

/// Build the payment API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payment/initiate", post(initiate::initiate_payment))
        .route(
            "/payment/validate/{merchant_transaction_id}",
            post(validate::validate_payment),
        )
}

/// Failure payload returned to the client.
#[derive(Serialize)]
struct FailureBody {
    error: &'static str,
    message: String,
}

/// Errors that can occur in payment API handlers.
#[derive(Debug)]
pub(super) struct PaymentApiError(pub(super) CheckoutError);

impl From<CheckoutError> for PaymentApiError {
    fn from(err: CheckoutError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match &self.0 {
            CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            // The status check answered; the user can retry the payment.
            CheckoutError::PaymentNotCompleted { .. } => {
                (StatusCode::CONFLICT, "payment_not_completed")
            }
            CheckoutError::Gateway(e) => {
                tracing::error!(error = %e, "Payment gateway call failed");
                (StatusCode::BAD_GATEWAY, "gateway_unavailable")
            }
            // Already logged as an operator anomaly by the coordinator.
            CheckoutError::OrderPayloadMismatch { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "order_payload_mismatch")
            }
            CheckoutError::UnknownOrder => (StatusCode::NOT_FOUND, "order_not_found"),
            CheckoutError::Database(e) => {
                tracing::error!(error = %e, "Payment API database error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    axum::Json(FailureBody {
                        error: "internal_error",
                        message: "internal server error".into(),
                    }),
                )
                    .into_response();
            }
        };

        let message = self.0.to_string();
        (status, axum::Json(FailureBody { error, message })).into_response()
    }
}

pub mod order_records;
pub mod payment_records;

use serde::{Deserialize, Serialize};

/// Lifecycle of a payment attempt as reported by the gateway.
///
/// A record only reaches the ledger after the gateway confirms it, so in
/// practice persisted rows are `Success`; the other states exist because the
/// gateway echoes them in its status payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentState {
    Pending,
    Success,
    Failed,
}

/// Pickup lifecycle of a placed order.
///
/// `Pending → Collected` is the only transition and it never runs backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Pending,
    Collected,
}

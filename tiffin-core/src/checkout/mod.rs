//! Reconciliation coordinator: initiate → redirect → confirm → persist.
//!
//! The coordinator owns the idempotency and partial-failure policy of the
//! checkout flow. Initiation writes nothing (an abandoned checkout leaves no
//! rows); confirmation re-verifies the payment with the gateway, then persists
//! the payment and the order with duplicate-insert-as-success semantics so it
//! can be called any number of times, concurrently or sequentially, for the
//! same transaction.

use crate::entities::PaymentState;
use crate::entities::order_records::{
    GetOrderByTransactionId, InsertOrderRecord, MarkOrderCollected, OrderItem, OrderRecord,
};
use crate::entities::payment_records::InsertPaymentRecord;
use crate::framework::DatabaseProcessor;
use crate::gateway::{GatewayClient, GatewayError, InitiateRequest, StatusOutcome};
use kanau::processor::Processor;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use url::Url;
use uuid::Uuid;

/// Errors from the checkout flow, mapped one-to-one onto caller outcomes.
/// Nothing in here is retried server-side.
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    /// Malformed input, rejected before any gateway call.
    #[error("invalid request: {0}")]
    Validation(String),
    /// The gateway call itself failed; no record was written.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// The status check answered, but the payment is not (yet) successful.
    /// Surfaced to the user as "try again".
    #[error("payment not completed (gateway code {code})")]
    PaymentNotCompleted { code: String },
    /// Payment confirmed but the order payload failed recomputation. Money
    /// was received and no order was created; logged as an operator anomaly.
    #[error("order payload rejected after successful payment: {reason}")]
    OrderPayloadMismatch { reason: String },
    /// The referenced order does not exist.
    #[error("order not found")]
    UnknownOrder,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Who is paying. Forwarded to the gateway as the merchant user id.
#[derive(Debug, Clone, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub mobile_number: Option<String>,
}

/// A started payment attempt: the fresh transaction id and where to send the
/// user's browser.
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedCheckout {
    pub merchant_transaction_id: String,
    pub redirect_url: String,
}

/// The order payload the client submits at confirmation time.
///
/// Totals are recomputed server-side before anything is persisted; the cart
/// container guarantees the items are single-shop, but the totals are never
/// trusted as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub cart_total: i64,
    pub total_items: i64,
    pub original_quantity: i64,
    pub total_savings: i64,
}

impl OrderDraft {
    /// Recompute the cart total and check the payload against it.
    fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("order has no items".into());
        }
        if self.user_id.trim().is_empty() {
            return Err("order has no user id".into());
        }
        let recomputed: i64 = self
            .items
            .iter()
            .map(|item| item.final_price * item.quantity)
            .sum();
        if recomputed != self.cart_total {
            return Err(format!(
                "cart total {} does not match recomputed item sum {}",
                self.cart_total, recomputed
            ));
        }
        Ok(())
    }
}

/// Convert a major-unit amount (rupees) to minor units (paise).
///
/// This is the single point where amounts cross from decimal to integer;
/// everything past it, including the signed payload, is integer arithmetic.
pub fn to_minor_units(amount_major: Decimal) -> Result<i64, CheckoutError> {
    if amount_major <= Decimal::ZERO {
        return Err(CheckoutError::Validation(
            "amount must be positive".into(),
        ));
    }
    let minor = amount_major * Decimal::from(100);
    if minor.fract() != Decimal::ZERO {
        return Err(CheckoutError::Validation(
            "amount has sub-paise precision".into(),
        ));
    }
    minor
        .to_i64()
        .ok_or_else(|| CheckoutError::Validation("amount out of range".into()))
}

/// Drives the payment gateway and the two ledgers.
pub struct Coordinator {
    gateway: GatewayClient,
    db: DatabaseProcessor,
    /// Our own public base URL, used to build the post-payment redirect
    /// target (`{base}/payment/validate/{merchant_transaction_id}`).
    app_base_url: Url,
}

impl Coordinator {
    pub fn new(gateway: GatewayClient, pool: SqlitePool, app_base_url: Url) -> Self {
        Self {
            gateway,
            db: DatabaseProcessor { pool },
            app_base_url,
        }
    }

    /// Start a payment attempt.
    ///
    /// Generates a fresh merchant transaction id and asks the gateway for a
    /// payment page. Writes nothing: an abandoned flow leaves no rows behind,
    /// and a retried initiation is simply a new attempt under a new id.
    #[tracing::instrument(skip_all, err)]
    pub async fn initiate(
        &self,
        amount_major: Decimal,
        user: UserContext,
    ) -> Result<InitiatedCheckout, CheckoutError> {
        if user.user_id.trim().is_empty() {
            return Err(CheckoutError::Validation("missing user id".into()));
        }
        let amount_minor_units = to_minor_units(amount_major)?;

        let merchant_transaction_id = Uuid::new_v4().simple().to_string();
        let redirect_target = self.build_redirect_target(&merchant_transaction_id)?;

        let initiated = self
            .gateway
            .initiate(InitiateRequest {
                merchant_transaction_id: merchant_transaction_id.clone(),
                merchant_user_id: user.user_id,
                amount_minor_units,
                redirect_target,
                mobile_number: user.mobile_number,
            })
            .await?;

        Ok(InitiatedCheckout {
            merchant_transaction_id,
            redirect_url: initiated.redirect_url,
        })
    }

    /// Confirm a payment attempt and produce its order.
    ///
    /// The client hint that triggered this call is irrelevant: success is
    /// established exclusively by our own status check against the gateway.
    /// Both persistence steps tolerate duplicates, so reloads, double-clicks
    /// and concurrent confirmations all converge on the same single payment
    /// row and single order row.
    #[tracing::instrument(skip_all, err, fields(merchant_transaction_id = %merchant_transaction_id))]
    pub async fn confirm(
        &self,
        merchant_transaction_id: &str,
        draft: OrderDraft,
    ) -> Result<OrderRecord, CheckoutError> {
        if merchant_transaction_id.trim().is_empty() {
            return Err(CheckoutError::Validation(
                "missing merchant transaction id".into(),
            ));
        }

        let confirmation = match self.gateway.check_status(merchant_transaction_id).await? {
            StatusOutcome::Success(confirmation) => confirmation,
            StatusOutcome::NotYetSuccessful { code } => {
                return Err(CheckoutError::PaymentNotCompleted { code });
            }
        };

        // Duplicate confirmations find the existing row and move on.
        self.db
            .process(InsertPaymentRecord {
                merchant_transaction_id: merchant_transaction_id.to_owned(),
                gateway_transaction_id: confirmation.gateway_transaction_id,
                amount_minor_units: confirmation.amount_minor_units,
                state: PaymentState::Success,
                instrument_details: confirmation.instrument_details,
            })
            .await?;

        if let Some(existing) = self
            .db
            .process(GetOrderByTransactionId {
                transaction_id: merchant_transaction_id.to_owned(),
            })
            .await?
        {
            return Ok(existing);
        }

        if let Err(reason) = draft.validate() {
            // Money received, order not created. This must reach an operator.
            tracing::error!(
                merchant_transaction_id,
                %reason,
                "payment captured but order payload failed validation"
            );
            return Err(CheckoutError::OrderPayloadMismatch { reason });
        }

        let order = self
            .db
            .process(InsertOrderRecord {
                order_id: Uuid::new_v4(),
                transaction_id: merchant_transaction_id.to_owned(),
                user_id: draft.user_id,
                items: draft.items,
                cart_total: draft.cart_total,
                total_items: draft.total_items,
                original_quantity: draft.original_quantity,
                total_savings: draft.total_savings,
            })
            .await?;

        Ok(order)
    }

    /// Shop-owner action: mark an order as collected.
    ///
    /// One-way and idempotent; collecting an already collected order simply
    /// returns it.
    #[tracing::instrument(skip_all, err, fields(order_id = %order_id))]
    pub async fn update_pickup_status(&self, order_id: Uuid) -> Result<OrderRecord, CheckoutError> {
        self.db
            .process(MarkOrderCollected { order_id })
            .await?
            .ok_or(CheckoutError::UnknownOrder)
    }

    fn build_redirect_target(&self, merchant_transaction_id: &str) -> Result<Url, CheckoutError> {
        let target = format!(
            "{}/payment/validate/{}",
            self.app_base_url.as_str().trim_end_matches('/'),
            merchant_transaction_id
        );
        Url::parse(&target)
            .map_err(|e| CheckoutError::Validation(format!("invalid redirect target: {e}")))
    }
}

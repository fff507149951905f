use crate::entities::PaymentState;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use sqlx::types::Json;

/// One row in the transaction ledger.
///
/// Keyed by the caller-generated merchant transaction id; the gateway's own
/// transaction id is stored alongside it. At most one row exists per merchant
/// transaction id, enforced by a UNIQUE index.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: i64,
    pub merchant_transaction_id: String,
    pub gateway_transaction_id: String,
    pub amount_minor_units: i64,
    pub state: PaymentState,
    /// Opaque instrument payload echoed by the gateway (UPI/card/netbanking
    /// details). Stored verbatim, never interpreted.
    pub instrument_details: Json<serde_json::Value>,
    pub created_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
/// Insert a payment record, treating a duplicate insert as success.
///
/// Uses `ON CONFLICT DO NOTHING` on the merchant transaction id and then
/// refetches, so the returned row is either the one just written or the one a
/// concurrent confirmation won with. A page reload racing a slow network must
/// not produce a second row or an error.
pub struct InsertPaymentRecord {
    pub merchant_transaction_id: String,
    pub gateway_transaction_id: String,
    pub amount_minor_units: i64,
    pub state: PaymentState,
    pub instrument_details: serde_json::Value,
}

impl Processor<InsertPaymentRecord> for DatabaseProcessor {
    type Output = PaymentRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertPaymentRecord")]
    async fn process(&self, insert: InsertPaymentRecord) -> Result<PaymentRecord, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO payment_records
                (merchant_transaction_id, gateway_transaction_id,
                 amount_minor_units, state, instrument_details, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (merchant_transaction_id) DO NOTHING
            "#,
        )
        .bind(&insert.merchant_transaction_id)
        .bind(&insert.gateway_transaction_id)
        .bind(insert.amount_minor_units)
        .bind(insert.state)
        .bind(Json(&insert.instrument_details))
        .bind(time::OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payment_records WHERE merchant_transaction_id = ?",
        )
        .bind(&insert.merchant_transaction_id)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Look up a payment record by its merchant transaction id.
pub struct GetPaymentByMerchantTransactionId {
    pub merchant_transaction_id: String,
}

impl Processor<GetPaymentByMerchantTransactionId> for DatabaseProcessor {
    type Output = Option<PaymentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPaymentByMerchantTransactionId")]
    async fn process(
        &self,
        query: GetPaymentByMerchantTransactionId,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payment_records WHERE merchant_transaction_id = ?",
        )
        .bind(&query.merchant_transaction_id)
        .fetch_optional(&self.pool)
        .await
    }
}

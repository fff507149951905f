use crate::entities::OrderStatus;
use crate::framework::DatabaseProcessor;
use kanau::processor::Processor;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

/// A single cart line as it is frozen into an order.
///
/// Prices are in the currency's minor unit (paise). `final_price` is the
/// per-unit price after any offer; `base_price` is the menu price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub item_id: String,
    pub shop_id: String,
    pub name: String,
    pub quantity: i64,
    pub base_price: i64,
    pub final_price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_offer: Option<String>,
}

/// One row in the order ledger, keyed by the payment's merchant transaction
/// id. At most one order exists per transaction, enforced by a UNIQUE index.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct OrderRecord {
    pub order_id: Uuid,
    pub transaction_id: String,
    pub user_id: String,
    pub items: Json<Vec<OrderItem>>,
    pub cart_total: i64,
    pub total_items: i64,
    pub original_quantity: i64,
    pub total_savings: i64,
    pub status: OrderStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: time::OffsetDateTime,
}

#[derive(Debug, Clone)]
/// Insert an order, treating a duplicate insert as success.
///
/// `ON CONFLICT DO NOTHING` on the transaction id plus a refetch means that
/// of any number of concurrent confirmations exactly one row is created and
/// every caller gets that same row back.
pub struct InsertOrderRecord {
    pub order_id: Uuid,
    pub transaction_id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub cart_total: i64,
    pub total_items: i64,
    pub original_quantity: i64,
    pub total_savings: i64,
}

impl Processor<InsertOrderRecord> for DatabaseProcessor {
    type Output = OrderRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:InsertOrderRecord")]
    async fn process(&self, insert: InsertOrderRecord) -> Result<OrderRecord, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO order_records
                (order_id, transaction_id, user_id, items, cart_total,
                 total_items, original_quantity, total_savings, status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (transaction_id) DO NOTHING
            "#,
        )
        .bind(insert.order_id)
        .bind(&insert.transaction_id)
        .bind(&insert.user_id)
        .bind(Json(&insert.items))
        .bind(insert.cart_total)
        .bind(insert.total_items)
        .bind(insert.original_quantity)
        .bind(insert.total_savings)
        .bind(OrderStatus::Pending)
        .bind(time::OffsetDateTime::now_utc())
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, OrderRecord>(
            "SELECT * FROM order_records WHERE transaction_id = ?",
        )
        .bind(&insert.transaction_id)
        .fetch_one(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Look up an order by the merchant transaction id that paid for it.
pub struct GetOrderByTransactionId {
    pub transaction_id: String,
}

impl Processor<GetOrderByTransactionId> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderByTransactionId")]
    async fn process(
        &self,
        query: GetOrderByTransactionId,
    ) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            "SELECT * FROM order_records WHERE transaction_id = ?",
        )
        .bind(&query.transaction_id)
        .fetch_optional(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Look up an order by its id.
pub struct GetOrderById {
    pub order_id: Uuid,
}

impl Processor<GetOrderById> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetOrderById")]
    async fn process(&self, query: GetOrderById) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>("SELECT * FROM order_records WHERE order_id = ?")
            .bind(query.order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// List a user's orders, newest first.
pub struct ListOrdersForUser {
    pub user_id: String,
}

impl Processor<ListOrdersForUser> for DatabaseProcessor {
    type Output = Vec<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrdersForUser")]
    async fn process(&self, query: ListOrdersForUser) -> Result<Vec<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            "SELECT * FROM order_records WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(&query.user_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// List orders that contain at least one item from the given shop.
///
/// Orders are single-vendor (the cart enforces it), but the shop id lives on
/// the items, so the JSON column is scanned with `json_each`.
pub struct ListOrdersForShop {
    pub shop_id: String,
}

impl Processor<ListOrdersForShop> for DatabaseProcessor {
    type Output = Vec<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListOrdersForShop")]
    async fn process(&self, query: ListOrdersForShop) -> Result<Vec<OrderRecord>, sqlx::Error> {
        sqlx::query_as::<_, OrderRecord>(
            r#"
            SELECT * FROM order_records
            WHERE EXISTS (
                SELECT 1 FROM json_each(order_records.items)
                WHERE json_extract(json_each.value, '$.shop_id') = ?
            )
            ORDER BY created_at DESC
            "#,
        )
        .bind(&query.shop_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[derive(Debug, Clone)]
/// Move an order to `Collected`.
///
/// The update is a no-op on an already collected order, so the command is
/// idempotent; the refetched row is returned either way. `None` means the
/// order does not exist.
pub struct MarkOrderCollected {
    pub order_id: Uuid,
}

impl Processor<MarkOrderCollected> for DatabaseProcessor {
    type Output = Option<OrderRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:MarkOrderCollected")]
    async fn process(&self, cmd: MarkOrderCollected) -> Result<Option<OrderRecord>, sqlx::Error> {
        sqlx::query("UPDATE order_records SET status = ? WHERE order_id = ?")
            .bind(OrderStatus::Collected)
            .bind(cmd.order_id)
            .execute(&self.pool)
            .await?;

        sqlx::query_as::<_, OrderRecord>("SELECT * FROM order_records WHERE order_id = ?")
            .bind(cmd.order_id)
            .fetch_optional(&self.pool)
            .await
    }
}

#[derive(Debug, Clone)]
/// Hard-delete an order. Returns the number of rows removed (0 or 1).
pub struct DeleteOrder {
    pub order_id: Uuid,
}

impl Processor<DeleteOrder> for DatabaseProcessor {
    type Output = u64;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:DeleteOrder")]
    async fn process(&self, cmd: DeleteOrder) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM order_records WHERE order_id = ?")
            .bind(cmd.order_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

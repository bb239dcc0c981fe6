use crate::error::DbError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Order, OrderStatus};
use std::collections::HashSet;
use uuid::Uuid;

/// The data-store operations the order lifecycle and the analytics need.
///
/// This trait is the contract between the engine and persistence, allowing the
/// PostgreSQL repository and the in-memory store to be swapped freely.
/// All ranges are half-open: `start <= timestamp < end`.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Orders in `[start, end)` with their lines and menu-item references loaded,
    /// sorted by timestamp, then by order id.
    async fn fetch_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, DbError>;

    /// Number of orders in `[start, end)`.
    async fn fetch_order_count(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<u64, DbError>;

    /// The subset of `customer_ids` that placed at least one order strictly before `before`.
    async fn fetch_customers_with_prior_orders(
        &self,
        customer_ids: &[Uuid],
        before: DateTime<Utc>,
    ) -> Result<HashSet<Uuid>, DbError>;

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, DbError>;

    /// Atomically sets the status to `new_status` only if it is still `expected_current`.
    ///
    /// Returns the updated order, or `None` when the order does not exist or its
    /// status no longer matches `expected_current`.
    async fn set_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        expected_current: OrderStatus,
    ) -> Result<Option<Order>, DbError>;
}

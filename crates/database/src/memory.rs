use crate::error::DbError;
use crate::store::OrderStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{Order, OrderStatus};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use uuid::Uuid;

/// An `OrderStore` held entirely in memory.
///
/// The compare-and-set in `set_order_status` runs under a single write lock,
/// so concurrent transitions of the same order are serialized.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_orders(orders: impl IntoIterator<Item = Order>) -> Self {
        Self {
            orders: RwLock::new(orders.into_iter().map(|o| (o.order_id, o)).collect()),
        }
    }

    /// Inserts or replaces an order. Stands in for the external order-creation flow.
    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.order_id, order);
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn fetch_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, DbError> {
        let orders = self.orders.read().await;
        let mut in_range: Vec<Order> = orders
            .values()
            .filter(|o| o.timestamp >= start && o.timestamp < end)
            .cloned()
            .collect();
        in_range.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        Ok(in_range)
    }

    async fn fetch_order_count(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.timestamp >= start && o.timestamp < end)
            .count() as u64)
    }

    async fn fetch_customers_with_prior_orders(
        &self,
        customer_ids: &[Uuid],
        before: DateTime<Utc>,
    ) -> Result<HashSet<Uuid>, DbError> {
        let wanted: HashSet<&Uuid> = customer_ids.iter().collect();
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .filter(|o| o.timestamp < before)
            .filter_map(|o| o.customer_id)
            .filter(|c| wanted.contains(c))
            .collect())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, DbError> {
        Ok(self.orders.read().await.get(&order_id).cloned())
    }

    async fn set_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        expected_current: OrderStatus,
    ) -> Result<Option<Order>, DbError> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order_id) {
            Some(order) if order.status == expected_current => {
                order.status = new_status;
                Ok(Some(order.clone()))
            }
            _ => Ok(None),
        }
    }
}

use crate::error::DbError;
use crate::store::OrderStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{MenuItemRef, Order, OrderLine, OrderStatus};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::Row;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// The `DbRepository` provides the PostgreSQL implementation of `OrderStore`.
/// It encapsulates all SQL queries and row mapping.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

const ORDER_COLUMNS: &str = "order_id, status, total_amount, ordered_at, customer_id";

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the lines of the given orders, grouped by order id, in line order.
    async fn fetch_lines(&self, order_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<OrderLine>>, DbError> {
        let mut lines: HashMap<Uuid, Vec<OrderLine>> = HashMap::new();
        if order_ids.is_empty() {
            return Ok(lines);
        }

        let rows = sqlx::query(
            r#"
            SELECT ol.order_id, ol.quantity, ol.unit_price,
                   mi.menu_item_id, mi.name AS menu_item_name, c.name AS category_name
            FROM order_lines AS ol
            LEFT JOIN menu_items AS mi ON mi.menu_item_id = ol.menu_item_id
            LEFT JOIN categories AS c ON c.category_id = mi.category_id
            WHERE ol.order_id = ANY($1)
            ORDER BY ol.order_id, ol.line_no
            "#,
        )
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await?;

        for row in rows {
            let order_id: Uuid = row.try_get("order_id")?;
            lines.entry(order_id).or_default().push(map_line(&row)?);
        }
        Ok(lines)
    }
}

#[async_trait]
impl OrderStore for DbRepository {
    async fn fetch_orders(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Order>, DbError> {
        let rows = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ordered_at >= $1 AND ordered_at < $2 \
             ORDER BY ordered_at ASC, order_id ASC"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut orders = rows.iter().map(map_order).collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<Uuid> = orders.iter().map(|o| o.order_id).collect();
        let mut lines = self.fetch_lines(&ids).await?;
        for order in &mut orders {
            order.lines = lines.remove(&order.order_id).unwrap_or_default();
        }

        tracing::debug!(count = orders.len(), %start, %end, "Fetched orders.");
        Ok(orders)
    }

    async fn fetch_order_count(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, DbError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE ordered_at >= $1 AND ordered_at < $2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;
        u64::try_from(count).map_err(|_| DbError::InvalidRow(format!("negative count {}", count)))
    }

    async fn fetch_customers_with_prior_orders(
        &self,
        customer_ids: &[Uuid],
        before: DateTime<Utc>,
    ) -> Result<HashSet<Uuid>, DbError> {
        if customer_ids.is_empty() {
            return Ok(HashSet::new());
        }
        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT DISTINCT customer_id FROM orders WHERE customer_id = ANY($1) AND ordered_at < $2",
        )
        .bind(customer_ids)
        .bind(before)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn get_order(&self, order_id: Uuid) -> Result<Option<Order>, DbError> {
        let row = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1"))
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut order = map_order(&row)?;
        order.lines = self
            .fetch_lines(&[order_id])
            .await?
            .remove(&order_id)
            .unwrap_or_default();
        Ok(Some(order))
    }

    async fn set_order_status(
        &self,
        order_id: Uuid,
        new_status: OrderStatus,
        expected_current: OrderStatus,
    ) -> Result<Option<Order>, DbError> {
        // The WHERE clause carries the precondition, so the read-modify-write is a single statement.
        let result = sqlx::query("UPDATE orders SET status = $1 WHERE order_id = $2 AND status = $3")
            .bind(new_status.as_str())
            .bind(order_id)
            .bind(expected_current.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() != 1 {
            return Ok(None);
        }
        self.get_order(order_id).await
    }
}

fn map_order(row: &PgRow) -> Result<Order, DbError> {
    let status: String = row.try_get("status")?;
    let status = status
        .parse::<OrderStatus>()
        .map_err(|e| DbError::InvalidRow(e.to_string()))?;

    Ok(Order {
        order_id: row.try_get("order_id")?,
        status,
        total_amount: row.try_get("total_amount")?,
        timestamp: row.try_get("ordered_at")?,
        customer_id: row.try_get("customer_id")?,
        lines: Vec::new(),
    })
}

fn map_line(row: &PgRow) -> Result<OrderLine, DbError> {
    let quantity: i32 = row.try_get("quantity")?;
    let quantity = u32::try_from(quantity)
        .map_err(|_| DbError::InvalidRow(format!("negative quantity {}", quantity)))?;
    let unit_price: Decimal = row.try_get("unit_price")?;

    let menu_item_id: Option<Uuid> = row.try_get("menu_item_id")?;
    let menu_item = match menu_item_id {
        Some(id) => Some(MenuItemRef {
            id,
            name: row.try_get("menu_item_name")?,
            category: row.try_get("category_name")?,
        }),
        None => None,
    };

    Ok(OrderLine {
        menu_item,
        quantity,
        unit_price,
    })
}

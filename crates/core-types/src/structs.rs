use crate::enums::OrderStatus;
use crate::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The menu item a line was ordered from, as it was eagerly loaded with the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemRef {
    pub id: Uuid,
    pub name: String,
    /// `None` when the item was never categorised or its category was removed.
    pub category: Option<String>,
}

/// A single line of an order.
///
/// `unit_price` is the price at the moment the order was placed and is kept
/// even when the menu item is later repriced or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    /// `None` once the menu item has been deleted (a severed reference).
    pub menu_item: Option<MenuItemRef>,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl OrderLine {
    pub fn new(
        menu_item: Option<MenuItemRef>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<Self, CoreError> {
        if quantity == 0 {
            return Err(CoreError::validation("quantity", "must be a positive integer"));
        }
        if unit_price.is_sign_negative() {
            return Err(CoreError::validation("unit_price", "must not be negative"));
        }
        Ok(Self {
            menu_item,
            quantity,
            unit_price,
        })
    }

    /// Revenue contributed by this line, from its historical price snapshot.
    pub fn line_total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_price
    }
}

/// An order placed by a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub status: OrderStatus,
    /// Snapshot taken at creation: the sum of all line totals.
    pub total_amount: Decimal,
    pub timestamp: DateTime<Utc>,
    /// Cleared when the customer account is removed; the order itself stays.
    pub customer_id: Option<Uuid>,
    pub lines: Vec<OrderLine>,
}

impl Order {
    /// Creates a new `Pending` order and takes the total snapshot from its lines.
    pub fn new(customer_id: Option<Uuid>, timestamp: DateTime<Utc>, lines: Vec<OrderLine>) -> Self {
        let total_amount = lines.iter().map(OrderLine::line_total).sum();
        Self {
            order_id: Uuid::new_v4(),
            status: OrderStatus::Pending,
            total_amount,
            timestamp,
            customer_id,
            lines,
        }
    }

    /// Total number of units across all lines.
    pub fn items_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }
}

/// A half-open reporting window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, CoreError> {
        if end <= start {
            return Err(CoreError::validation(
                "period",
                format!("end ({}) must be after start ({})", end, start),
            ));
        }
        Ok(Self { start, end })
    }

    /// The whole calendar day `[date 00:00, date+1 00:00)` in UTC.
    ///
    /// Fails for the last day chrono can represent, which has no following midnight.
    pub fn day(date: NaiveDate) -> Result<Self, CoreError> {
        let next = date
            .succ_opt()
            .ok_or_else(|| CoreError::validation("date", format!("{} has no following day", date)))?;
        Ok(Self {
            start: date.and_time(chrono::NaiveTime::MIN).and_utc(),
            end: next.and_time(chrono::NaiveTime::MIN).and_utc(),
        })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }

    /// The immediately preceding window of equal length, ending at `start`.
    pub fn previous(&self) -> Result<Self, CoreError> {
        let start = self.start.checked_sub_signed(self.duration()).ok_or_else(|| {
            CoreError::validation("period", format!("no earlier window of equal length before {}", self.start))
        })?;
        Ok(Self {
            start,
            end: self.start,
        })
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use core_types::{Granularity, OrderStatus, Period};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The complete analytics read-model for one period.
///
/// Built fresh per request from an already-fetched working set and discarded
/// after use. Nothing in it is ever written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub period: Period,
    pub granularity: Granularity,
    pub time_series: Vec<TimeBucket>,
    pub summary: Summary,
    pub performance: Performance,
    pub items: ItemInsights,
    pub revenue: RevenueInsights,
    pub customers: CustomerInsights,
}

/// One half-open interval `[start, end)` of the time series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeBucket {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub order_count: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    /// 0 when there are no orders.
    pub avg_order_value: Decimal,
    pub total_items_sold: u64,
    pub previous_period_orders: u64,
    /// Percentage change in order count. `None` when the previous period had no orders.
    pub change_vs_previous: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Performance {
    /// Hour of day (0-23) with the most orders.
    pub peak_hour: Option<u32>,
    pub peak_hour_orders: u64,
    pub best_day_of_week: Option<String>,
    /// Raw order count of `best_day_of_week` over the queried period. Despite the
    /// name this is not divided by the number of weeks observed.
    pub best_day_avg_orders: u64,
    pub completed_orders: u64,
    pub cancelled_orders: u64,
    /// `completed / (completed + cancelled) * 100`; 100 when neither occurred.
    pub completion_rate: Decimal,
    /// 0 when there are no orders.
    pub avg_items_per_order: Decimal,
    pub status_breakdown: Vec<StatusCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: u64,
}

/// Quantity and revenue sold of a single menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemStat {
    pub menu_item_id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub quantity: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ItemInsights {
    pub most_sold: Option<ItemStat>,
    pub least_sold: Option<ItemStat>,
    /// Best seller among orders placed between 06:00 and 12:00.
    pub morning_bestseller: Option<ItemStat>,
    /// Best seller among orders placed between 17:00 and 22:00.
    pub evening_bestseller: Option<ItemStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRevenue {
    pub hour: u32,
    pub order_count: u64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: Decimal,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueInsights {
    /// Always 24 entries, one per hour of day, aggregated across all dates.
    pub revenue_by_hour: Vec<HourlyRevenue>,
    pub top_items_by_revenue: Vec<ItemStat>,
    /// Sorted by revenue, highest first. Empty when there is no revenue.
    pub category_breakdown: Vec<CategoryRevenue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerInsights {
    pub unique_customers: u64,
    pub returning_customers: u64,
    pub new_customers: u64,
    pub new_customer_percentage: Decimal,
    pub orders_per_customer: Decimal,
}

/// Today's figures for the admin dashboard.
///
/// Unlike the analytics report, cancelled orders never count here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub orders_today: u64,
    pub revenue_today: Decimal,
    pub pending_orders: u64,
    pub in_preparation_orders: u64,
    pub ready_orders: u64,
}

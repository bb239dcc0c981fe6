//! # Canteen Analytics Engine
//!
//! This crate turns a window of historical orders into the kitchen/admin
//! analytics report: a zero-filled time series, summary figures, kitchen
//! performance, item and revenue insights, and the new/returning customer split.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of the
//!   database or HTTP. It depends only on `core-types` and `configuration`.
//! - **Stateless Calculation:** `AnalyticsEngine::build_report` is a pure function
//!   of `(working set, previous period count, prior-order customers)`. Each call
//!   builds its own report, so any number of requests may run in parallel.
//! - **Defined Defaults:** No metric fails on empty input. Every division has a
//!   documented fallback (0, 100 or `None`) chosen per field.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the aggregator producing an `AnalyticsReport`.
//! - `TimeBucketer`, `PeriodComparator`, `CustomerCohortClassifier`: its building blocks.
//! - `AnalyticsReport` and friends: the serializable read-model.
//! - `AnalyticsError`: the specific error types that can be returned from this crate.

pub mod bucketer;
pub mod cohort;
pub mod comparator;
pub mod engine;
pub mod error;
pub mod report;

pub use bucketer::TimeBucketer;
pub use cohort::CustomerCohortClassifier;
pub use comparator::PeriodComparator;
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::{
    AnalyticsReport, CategoryRevenue, CustomerInsights, DailyStats, HourlyRevenue, ItemInsights,
    ItemStat, Performance, RevenueInsights, StatusCount, Summary, TimeBucket,
};

use rust_decimal::Decimal;

/// `numerator / denominator` rounded to 2 dp, or 0 when the denominator is 0.
pub(crate) fn ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    (numerator / denominator).round_dp(2)
}

/// `numerator / denominator * 100` rounded to 2 dp, or 0 when the denominator is 0.
pub(crate) fn share(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    (numerator / denominator * Decimal::ONE_HUNDRED).round_dp(2)
}

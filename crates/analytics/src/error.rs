use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsError {
    #[error("Order {0} lies outside the reporting period.")]
    OrderOutsidePeriod(Uuid),

    #[error("Reporting period cannot be partitioned: {0}")]
    PeriodOutOfRange(String),
}

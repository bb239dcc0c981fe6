use analytics::{
    AnalyticsEngine, AnalyticsReport, CustomerCohortClassifier, DailyStats, PeriodComparator,
};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use configuration::AnalyticsConfig;
use core_types::{CoreError, Granularity, Period};
use database::OrderStore;
use serde::Deserialize;
use std::collections::HashSet;

pub mod error;

pub use error::AnalyzerError;

/// The report request as received from a caller, before validation.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// One of "hour", "day", "month". Defaults to "day".
    #[serde(default, alias = "group_by")]
    pub granularity: Option<String>,
}

impl ReportRequest {
    /// Checks the period and granularity against the configured limits.
    pub fn validate(&self, config: &AnalyticsConfig) -> Result<(Period, Granularity), CoreError> {
        let granularity = match &self.granularity {
            Some(raw) => raw.parse::<Granularity>()?,
            None => Granularity::default(),
        };
        let period = Period::new(self.start, self.end)?;
        // A limit too large for a `Duration` cannot be exceeded by any real period.
        let too_long = Duration::try_days(config.max_period_days)
            .is_some_and(|limit| period.duration() > limit);
        if too_long {
            return Err(CoreError::validation(
                "period",
                format!("may span at most {} days", config.max_period_days),
            ));
        }
        Ok((period, granularity))
    }
}

/// Gathers everything a report needs from the store and hands it to the engine.
#[derive(Debug, Clone, Default)]
pub struct ReportAnalyzer {
    engine: AnalyticsEngine,
}

impl ReportAnalyzer {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            engine: AnalyticsEngine::new(config),
        }
    }

    /// Validates, fetches and builds the full analytics report.
    pub async fn run(
        &self,
        store: &dyn OrderStore,
        request: &ReportRequest,
    ) -> Result<AnalyticsReport, AnalyzerError> {
        // 1. Validate
        let (period, granularity) = request.validate(self.engine.config())?;

        // 2. Fetch the working set
        let orders = store.fetch_orders(period.start, period.end).await?;

        // 3. Fetch the comparison baseline and the cohort answer
        let previous = PeriodComparator::previous_period(&period)?;
        let customers = CustomerCohortClassifier::distinct_customers(&orders);
        let (previous_count, with_prior_orders) = tokio::try_join!(
            store.fetch_order_count(previous.start, previous.end),
            async {
                if customers.is_empty() {
                    Ok(HashSet::new())
                } else {
                    store
                        .fetch_customers_with_prior_orders(&customers, period.start)
                        .await
                }
            },
        )?;

        // 4. Aggregate
        let report = self.engine.build_report(
            period,
            granularity,
            &orders,
            previous_count,
            &with_prior_orders,
        )?;

        tracing::info!(
            start = %period.start,
            end = %period.end,
            %granularity,
            orders = report.summary.total_orders,
            "Analytics report generated."
        );
        Ok(report)
    }

    /// Today's admin dashboard figures for `date` (UTC).
    pub async fn daily_stats(
        &self,
        store: &dyn OrderStore,
        date: NaiveDate,
    ) -> Result<DailyStats, AnalyzerError> {
        let day = Period::day(date)?;
        let orders = store.fetch_orders(day.start, day.end).await?;
        Ok(self.engine.daily_stats(date, &orders))
    }
}

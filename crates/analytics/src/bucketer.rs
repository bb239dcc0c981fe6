use crate::error::AnalyticsError;
use crate::report::TimeBucket;
use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, TimeZone, Utc};
use core_types::{Granularity, Order, Period};
use rust_decimal::Decimal;

/// Partitions a period into contiguous, non-overlapping buckets and fills them.
///
/// - `Hour` buckets step one hour from `start` itself.
/// - `Day` buckets are aligned to midnight of `start`'s date.
/// - `Month` buckets are aligned to the first day of `start`'s month.
///
/// The first bucket is clamped to begin at `start` and the last to end at
/// `end`, so the union of all buckets is exactly the period. Empty buckets are
/// kept with zero counts.
#[derive(Debug, Clone, Copy)]
pub struct TimeBucketer {
    granularity: Granularity,
}

impl TimeBucketer {
    pub fn new(granularity: Granularity) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Builds the zero-filled skeleton of the time series.
    pub fn buckets(&self, period: &Period) -> Result<Vec<TimeBucket>, AnalyticsError> {
        let mut buckets = Vec::new();
        let mut cursor = self.anchor(period.start);

        while cursor < period.end {
            let next = self.step(cursor)?;
            let start = cursor.max(period.start);
            let end = next.min(period.end);
            buckets.push(TimeBucket {
                label: self.label(cursor),
                start,
                end,
                order_count: 0,
                revenue: Decimal::ZERO,
            });
            cursor = next;
        }

        Ok(buckets)
    }

    /// Builds the skeleton and assigns every order to exactly one bucket.
    ///
    /// An order whose timestamp lies outside the period is an error rather than
    /// being silently dropped, so the bucket counts always add up to the input.
    pub fn bucketize<'a, I>(&self, period: &Period, orders: I) -> Result<Vec<TimeBucket>, AnalyticsError>
    where
        I: IntoIterator<Item = &'a Order>,
    {
        let mut buckets = self.buckets(period)?;

        for order in orders {
            // Buckets are sorted and contiguous: the first one ending after the
            // timestamp is the one that contains it.
            let idx = buckets.partition_point(|b| b.end <= order.timestamp);
            match buckets.get_mut(idx) {
                Some(bucket) if bucket.start <= order.timestamp => {
                    bucket.order_count += 1;
                    bucket.revenue += order.total_amount;
                }
                _ => return Err(AnalyticsError::OrderOutsidePeriod(order.order_id)),
            }
        }

        Ok(buckets)
    }

    fn anchor(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self.granularity {
            Granularity::Hour => start,
            Granularity::Day => start.date_naive().and_time(NaiveTime::MIN).and_utc(),
            Granularity::Month => Utc
                .with_ymd_and_hms(start.year(), start.month(), 1, 0, 0, 0)
                .single()
                .unwrap_or(start),
        }
    }

    fn step(&self, cursor: DateTime<Utc>) -> Result<DateTime<Utc>, AnalyticsError> {
        let next = match self.granularity {
            Granularity::Hour => cursor.checked_add_signed(Duration::hours(1)),
            Granularity::Day => cursor.checked_add_signed(Duration::days(1)),
            Granularity::Month => cursor.checked_add_months(Months::new(1)),
        };
        next.ok_or_else(|| {
            AnalyticsError::PeriodOutOfRange(format!("cannot step {} past {}", self.granularity, cursor))
        })
    }

    fn label(&self, bucket_start: DateTime<Utc>) -> String {
        let format = match self.granularity {
            Granularity::Hour => "%Y-%m-%d %H:%M",
            Granularity::Day => "%Y-%m-%d",
            Granularity::Month => "%Y-%m",
        };
        bucket_start.format(format).to_string()
    }
}

use core_types::{CoreError, Period};
use rust_decimal::Decimal;

/// Compares a period with the equal-length window immediately before it.
#[derive(Debug, Default, Clone, Copy)]
pub struct PeriodComparator;

impl PeriodComparator {
    /// `[start - (end - start), start)`. Fails when that window starts before
    /// the earliest representable timestamp.
    pub fn previous_period(period: &Period) -> Result<Period, CoreError> {
        period.previous()
    }

    /// Percentage change from `previous` to `current`, rounded to 2 dp.
    ///
    /// Returns `None` when there is no baseline (`previous == 0`), which is
    /// different from "no change" (`Some(0)`).
    pub fn change_vs_previous(current: u64, previous: u64) -> Option<Decimal> {
        if previous == 0 {
            return None;
        }
        let current = Decimal::from(current);
        let previous = Decimal::from(previous);
        Some(((current - previous) / previous * Decimal::ONE_HUNDRED).round_dp(2))
    }
}

use crate::bucketer::TimeBucketer;
use crate::cohort::CustomerCohortClassifier;
use crate::comparator::PeriodComparator;
use crate::error::AnalyticsError;
use crate::report::{
    AnalyticsReport, CategoryRevenue, DailyStats, HourlyRevenue, ItemInsights, ItemStat,
    Performance, RevenueInsights, StatusCount, Summary,
};
use crate::{ratio, share};
use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use configuration::{AnalyticsConfig, CancelledOrderPolicy};
use core_types::{Granularity, Order, OrderLine, OrderStatus, Period};
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::ops::Range;
use uuid::Uuid;

const MORNING_HOURS: Range<u32> = 6..12;
const EVENING_HOURS: Range<u32> = 17..22;

/// A stateless calculator turning a working set of orders into an `AnalyticsReport`.
///
/// ## Tie-breaking
///
/// Groups (hours, weekdays, menu items, categories) are kept in the order in
/// which they are first met while walking the working set. A later group only
/// beats the current best when it is strictly better, and lists are sorted
/// with a stable sort. Given the same input order the output is identical.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// The main entry point for building a report.
    ///
    /// # Arguments
    ///
    /// * `period` - The half-open window `[start, end)` being reported on.
    /// * `granularity` - Width of the time-series buckets.
    /// * `orders` - The working set: every order with a timestamp inside `period`.
    /// * `previous_period_orders` - Order count of `PeriodComparator::previous_period(period)`.
    /// * `customers_with_prior_orders` - Customers of the working set with an order before `period.start`.
    pub fn build_report(
        &self,
        period: Period,
        granularity: Granularity,
        orders: &[Order],
        previous_period_orders: u64,
        customers_with_prior_orders: &HashSet<Uuid>,
    ) -> Result<AnalyticsReport, AnalyticsError> {
        // Revenue-bearing subset, subject to the cancelled-order policy.
        let counted: Vec<&Order> = orders
            .iter()
            .filter(|o| self.counts_toward_revenue(o))
            .collect();

        let time_series = TimeBucketer::new(granularity).bucketize(&period, counted.iter().copied())?;

        let mut summary = self.summary(&counted);
        summary.previous_period_orders = previous_period_orders;
        summary.change_vs_previous =
            PeriodComparator::change_vs_previous(orders.len() as u64, previous_period_orders);

        let performance = self.performance(orders, &summary);
        let items = self.item_insights(&counted);
        let revenue = self.revenue_insights(&counted, summary.total_revenue);
        let customers = CustomerCohortClassifier::classify(orders, customers_with_prior_orders);

        tracing::debug!(
            orders = orders.len(),
            counted = counted.len(),
            buckets = time_series.len(),
            %granularity,
            "Built analytics report."
        );

        Ok(AnalyticsReport {
            period,
            granularity,
            time_series,
            summary,
            performance,
            items,
            revenue,
            customers,
        })
    }

    /// Admin dashboard figures for one day. Cancelled orders are always excluded
    /// here, whatever the analytics policy says.
    pub fn daily_stats(&self, date: NaiveDate, orders: &[Order]) -> DailyStats {
        let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count() as u64;
        let active = orders.iter().filter(|o| o.status != OrderStatus::Cancelled);

        DailyStats {
            date,
            orders_today: active.clone().count() as u64,
            revenue_today: active.map(|o| o.total_amount).sum(),
            pending_orders: count(OrderStatus::Pending),
            in_preparation_orders: count(OrderStatus::InPreparation),
            ready_orders: count(OrderStatus::Ready),
        }
    }

    fn counts_toward_revenue(&self, order: &Order) -> bool {
        match self.config.cancelled_orders {
            CancelledOrderPolicy::Include => true,
            CancelledOrderPolicy::Exclude => order.status != OrderStatus::Cancelled,
        }
    }

    fn summary(&self, orders: &[&Order]) -> Summary {
        let total_orders = orders.len() as u64;
        let total_revenue: Decimal = orders.iter().map(|o| o.total_amount).sum();
        let total_items_sold: u64 = orders.iter().map(|o| o.items_count()).sum();

        Summary {
            total_orders,
            total_revenue,
            avg_order_value: ratio(total_revenue, total_orders.into()),
            total_items_sold,
            previous_period_orders: 0,
            change_vs_previous: None,
        }
    }

    /// Status figures use the full working set; the per-order averages reuse the summary.
    fn performance(&self, orders: &[Order], summary: &Summary) -> Performance {
        let by_hour = tally(orders.iter().map(|o| (o.timestamp.hour(), 1u64)));
        let by_weekday = tally(orders.iter().map(|o| (o.timestamp.weekday(), 1u64)));
        let peak_hour = first_max_by_key(&by_hour, |(_, n)| *n);
        let best_day = first_max_by_key(&by_weekday, |(_, n)| *n);

        let status_breakdown: Vec<StatusCount> = OrderStatus::ALL
            .iter()
            .map(|&status| StatusCount {
                status,
                count: orders.iter().filter(|o| o.status == status).count() as u64,
            })
            .collect();
        let count_of = |status: OrderStatus| {
            status_breakdown
                .iter()
                .find(|s| s.status == status)
                .map_or(0, |s| s.count)
        };
        let completed = count_of(OrderStatus::Completed);
        let cancelled = count_of(OrderStatus::Cancelled);

        let completion_rate = if completed + cancelled == 0 {
            Decimal::ONE_HUNDRED
        } else {
            share(completed.into(), (completed + cancelled).into())
        };

        Performance {
            peak_hour: peak_hour.map(|(h, _)| *h),
            peak_hour_orders: peak_hour.map_or(0, |(_, n)| *n),
            best_day_of_week: best_day.map(|(d, _)| weekday_name(*d).to_string()),
            best_day_avg_orders: best_day.map_or(0, |(_, n)| *n),
            completed_orders: completed,
            cancelled_orders: cancelled,
            completion_rate,
            avg_items_per_order: ratio(summary.total_items_sold.into(), summary.total_orders.into()),
            status_breakdown,
        }
    }

    fn item_insights(&self, orders: &[&Order]) -> ItemInsights {
        let all = item_stats(orders.iter().copied());
        let morning = item_stats(
            orders
                .iter()
                .copied()
                .filter(|o| MORNING_HOURS.contains(&o.timestamp.hour())),
        );
        let evening = item_stats(
            orders
                .iter()
                .copied()
                .filter(|o| EVENING_HOURS.contains(&o.timestamp.hour())),
        );

        ItemInsights {
            most_sold: first_max_by_key(&all, |s| s.quantity).cloned(),
            least_sold: first_min_by_key(&all, |s| s.quantity).cloned(),
            morning_bestseller: first_max_by_key(&morning, |s| s.quantity).cloned(),
            evening_bestseller: first_max_by_key(&evening, |s| s.quantity).cloned(),
        }
    }

    fn revenue_insights(&self, orders: &[&Order], total_revenue: Decimal) -> RevenueInsights {
        let mut revenue_by_hour: Vec<HourlyRevenue> = (0..24)
            .map(|hour| HourlyRevenue {
                hour,
                order_count: 0,
                revenue: Decimal::ZERO,
            })
            .collect();
        for order in orders {
            let slot = &mut revenue_by_hour[order.timestamp.hour() as usize];
            slot.order_count += 1;
            slot.revenue += order.total_amount;
        }

        let mut top_items_by_revenue = item_stats(orders.iter().copied());
        top_items_by_revenue.sort_by(|a, b| b.revenue.cmp(&a.revenue));
        top_items_by_revenue.truncate(self.config.top_items_limit);

        RevenueInsights {
            revenue_by_hour,
            top_items_by_revenue,
            category_breakdown: self.category_breakdown(orders, total_revenue),
        }
    }

    fn category_breakdown(&self, orders: &[&Order], total_revenue: Decimal) -> Vec<CategoryRevenue> {
        if total_revenue.is_zero() {
            return Vec::new();
        }

        let by_category = tally(
            orders
                .iter()
                .flat_map(|o| o.lines.iter())
                .map(|line| (self.category_of(line).to_string(), line.line_total())),
        );

        let mut breakdown: Vec<CategoryRevenue> = by_category
            .into_iter()
            .map(|(category, revenue)| CategoryRevenue {
                category,
                revenue,
                percentage: share(revenue, total_revenue),
            })
            .collect();
        breakdown.sort_by(|a, b| b.revenue.cmp(&a.revenue));
        breakdown
    }

    fn category_of<'a>(&'a self, line: &'a OrderLine) -> &'a str {
        line.menu_item
            .as_ref()
            .and_then(|item| item.category.as_deref())
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(self.config.fallback_category.as_str())
    }
}

/// Sums values per key, keeping keys in first-seen order.
fn tally<K, V, I>(entries: I) -> Vec<(K, V)>
where
    K: Eq + Hash + Clone,
    V: std::ops::AddAssign + Copy,
    I: IntoIterator<Item = (K, V)>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, V)> = Vec::new();
    for (key, value) in entries {
        match index.get(&key) {
            Some(&i) => groups[i].1 += value,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, value));
            }
        }
    }
    groups
}

/// Per-menu-item quantity and revenue, in first-seen order.
/// Lines whose menu item was deleted cannot be attributed to an item and are skipped.
fn item_stats<'a, I>(orders: I) -> Vec<ItemStat>
where
    I: IntoIterator<Item = &'a Order>,
{
    let mut index: HashMap<Uuid, usize> = HashMap::new();
    let mut stats: Vec<ItemStat> = Vec::new();

    for line in orders.into_iter().flat_map(|o| o.lines.iter()) {
        let Some(item) = &line.menu_item else {
            continue;
        };
        let i = *index.entry(item.id).or_insert_with(|| {
            stats.push(ItemStat {
                menu_item_id: item.id,
                name: item.name.clone(),
                category: item.category.clone(),
                quantity: 0,
                revenue: Decimal::ZERO,
            });
            stats.len() - 1
        });
        stats[i].quantity += u64::from(line.quantity);
        stats[i].revenue += line.line_total();
    }
    stats
}

/// Like `Iterator::max_by_key`, but the first of several equal maxima wins.
fn first_max_by_key<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> Option<&T> {
    let mut best: Option<&T> = None;
    for item in items {
        if best.is_none_or(|b| key(item) > key(b)) {
            best = Some(item);
        }
    }
    best
}

fn first_min_by_key<T, K: Ord>(items: &[T], key: impl Fn(&T) -> K) -> Option<&T> {
    let mut best: Option<&T> = None;
    for item in items {
        if best.is_none_or(|b| key(item) < key(b)) {
            best = Some(item);
        }
    }
    best
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use core_types::MenuItemRef;
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn menu_item(name: &str, category: Option<&str>) -> MenuItemRef {
        MenuItemRef {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: category.map(str::to_string),
        }
    }

    fn line(item: &MenuItemRef, quantity: u32, unit_price: Decimal) -> OrderLine {
        OrderLine::new(Some(item.clone()), quantity, unit_price).unwrap()
    }

    fn order(timestamp: DateTime<Utc>, status: OrderStatus, lines: Vec<OrderLine>) -> Order {
        let mut order = Order::new(Some(Uuid::new_v4()), timestamp, lines);
        order.status = status;
        order
    }

    fn priced(timestamp: DateTime<Utc>, status: OrderStatus, amount: Decimal) -> Order {
        order(timestamp, status, vec![OrderLine::new(None, 1, amount).unwrap()])
    }

    fn week_of(day: NaiveDate) -> Period {
        let end = Period::day(day).unwrap().end;
        Period::new(end - Duration::days(8), end).unwrap()
    }

    fn build(engine: &AnalyticsEngine, period: Period, orders: &[Order]) -> AnalyticsReport {
        engine
            .build_report(period, Granularity::Day, orders, 0, &HashSet::new())
            .unwrap()
    }

    #[test]
    fn test_summary_and_completion_for_mixed_statuses() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 12).unwrap();
        let orders = vec![
            priced(at(2024, 6, 12, 10, 0), OrderStatus::Completed, dec!(25.50)),
            priced(at(2024, 6, 12, 11, 0), OrderStatus::Completed, dec!(14.50)),
            priced(at(2024, 6, 12, 12, 0), OrderStatus::Pending, dec!(100)),
        ];
        let report = build(&AnalyticsEngine::default(), week_of(today), &orders);

        assert_eq!(report.summary.total_orders, 3);
        assert_eq!(report.summary.total_revenue, dec!(140.00));
        assert_eq!(report.performance.completed_orders, 2);
        assert_eq!(report.performance.cancelled_orders, 0);
        assert_eq!(report.performance.completion_rate, dec!(100));

        assert_eq!(report.time_series.len(), 8);
        let last = report.time_series.last().unwrap();
        assert_eq!(last.label, "2024-06-12");
        assert_eq!(last.order_count, 3);
        assert_eq!(last.revenue, dec!(140.00));
    }

    #[test]
    fn test_empty_working_set_yields_defaults() {
        let period = Period::day(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()).unwrap();
        let report = AnalyticsEngine::default()
            .build_report(period, Granularity::Hour, &[], 0, &HashSet::new())
            .unwrap();

        assert_eq!(report.time_series.len(), 24);
        assert!(report.time_series.iter().all(|b| b.order_count == 0));
        assert_eq!(report.summary.total_orders, 0);
        assert_eq!(report.summary.avg_order_value, Decimal::ZERO);
        assert_eq!(report.summary.change_vs_previous, None);
        assert_eq!(report.performance.completion_rate, dec!(100));
        assert_eq!(report.performance.avg_items_per_order, Decimal::ZERO);
        assert_eq!(report.performance.peak_hour, None);
        assert_eq!(report.performance.best_day_of_week, None);
        assert_eq!(report.items, ItemInsights::default());
        assert_eq!(report.revenue.revenue_by_hour.len(), 24);
        assert!(report.revenue.top_items_by_revenue.is_empty());
        assert!(report.revenue.category_breakdown.is_empty());
        assert_eq!(report.customers.unique_customers, 0);
        assert_eq!(report.customers.new_customer_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_completion_rate_counts_only_terminal_orders() {
        let day = at(2024, 6, 12, 9, 0);
        let orders = vec![
            priced(day, OrderStatus::Completed, dec!(1)),
            priced(day, OrderStatus::Completed, dec!(1)),
            priced(day, OrderStatus::Completed, dec!(1)),
            priced(day, OrderStatus::Cancelled, dec!(1)),
            priced(day, OrderStatus::Ready, dec!(1)),
        ];
        let report = build(&AnalyticsEngine::default(), week_of(day.date_naive()), &orders);
        assert_eq!(report.performance.completion_rate, dec!(75));

        let counts: Vec<u64> = report.performance.status_breakdown.iter().map(|s| s.count).collect();
        assert_eq!(counts, vec![0, 0, 1, 3, 1]);
    }

    #[test]
    fn test_change_vs_previous_uses_full_working_set() {
        let day = at(2024, 6, 12, 9, 0);
        let orders = vec![
            priced(day, OrderStatus::Completed, dec!(1)),
            priced(day, OrderStatus::Cancelled, dec!(1)),
            priced(day, OrderStatus::Pending, dec!(1)),
        ];
        let report = AnalyticsEngine::default()
            .build_report(week_of(day.date_naive()), Granularity::Day, &orders, 2, &HashSet::new())
            .unwrap();
        assert_eq!(report.summary.previous_period_orders, 2);
        assert_eq!(report.summary.change_vs_previous, Some(dec!(50)));
    }

    #[test]
    fn test_average_order_value_within_rounding() {
        let day = at(2024, 6, 12, 9, 0);
        let orders = vec![
            priced(day, OrderStatus::Completed, dec!(10)),
            priced(day, OrderStatus::Completed, dec!(10)),
            priced(day, OrderStatus::Completed, dec!(10.01)),
        ];
        let report = build(&AnalyticsEngine::default(), week_of(day.date_naive()), &orders);
        let total = Decimal::from(report.summary.total_orders);
        let drift = (report.summary.avg_order_value * total - report.summary.total_revenue).abs();
        assert!(drift <= dec!(0.005) * total, "drift {} too large", drift);
    }

    #[test]
    fn test_peak_hour_and_best_day_ties_go_to_first_seen() {
        // 2024-03-04 is a Monday.
        let orders = vec![
            priced(at(2024, 3, 4, 9, 10), OrderStatus::Completed, dec!(1)),
            priced(at(2024, 3, 4, 14, 0), OrderStatus::Completed, dec!(1)),
            priced(at(2024, 3, 5, 9, 30), OrderStatus::Completed, dec!(1)),
            priced(at(2024, 3, 5, 14, 30), OrderStatus::Completed, dec!(1)),
        ];
        let report = build(
            &AnalyticsEngine::default(),
            week_of(NaiveDate::from_ymd_opt(2024, 3, 6).unwrap()),
            &orders,
        );

        assert_eq!(report.performance.peak_hour, Some(9));
        assert_eq!(report.performance.peak_hour_orders, 2);
        assert_eq!(report.performance.best_day_of_week.as_deref(), Some("Monday"));
        assert_eq!(report.performance.best_day_avg_orders, 2);
    }

    #[test]
    fn test_item_revenue_and_category_insights() {
        let coffee = menu_item("Coffee", Some("Drinks"));
        let cake = menu_item("Cake", None);
        let burger = menu_item("Burger", Some("Mains"));
        let salad = menu_item("Salad", Some("Healthy"));

        let orders = vec![
            order(
                at(2024, 6, 12, 7, 30),
                OrderStatus::Completed,
                vec![line(&coffee, 2, dec!(2.50)), line(&cake, 1, dec!(4.00))],
            ),
            order(
                at(2024, 6, 12, 12, 30),
                OrderStatus::Completed,
                vec![line(&burger, 1, dec!(8.00)), line(&salad, 1, dec!(6.50))],
            ),
            order(
                at(2024, 6, 12, 18, 0),
                OrderStatus::Completed,
                vec![
                    line(&burger, 2, dec!(8.00)),
                    OrderLine::new(None, 1, dec!(3.00)).unwrap(),
                ],
            ),
            order(
                at(2024, 6, 12, 19, 15),
                OrderStatus::Ready,
                vec![line(&salad, 3, dec!(6.50))],
            ),
        ];
        let engine = AnalyticsEngine::new(AnalyticsConfig {
            top_items_limit: 2,
            ..AnalyticsConfig::default()
        });
        let report = build(&engine, week_of(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()), &orders);

        assert_eq!(report.summary.total_revenue, dec!(62.00));
        assert_eq!(report.summary.total_items_sold, 11);
        assert_eq!(report.summary.avg_order_value, dec!(15.50));
        assert_eq!(report.performance.avg_items_per_order, dec!(2.75));

        let items = &report.items;
        assert_eq!(items.most_sold.as_ref().unwrap().name, "Salad");
        assert_eq!(items.most_sold.as_ref().unwrap().quantity, 4);
        assert_eq!(items.least_sold.as_ref().unwrap().name, "Cake");
        assert_eq!(items.morning_bestseller.as_ref().unwrap().name, "Coffee");
        assert_eq!(items.evening_bestseller.as_ref().unwrap().name, "Salad");

        let top: Vec<(&str, Decimal)> = report
            .revenue
            .top_items_by_revenue
            .iter()
            .map(|s| (s.name.as_str(), s.revenue))
            .collect();
        assert_eq!(top, vec![("Salad", dec!(26.00)), ("Burger", dec!(24.00))]);

        let categories: Vec<(&str, Decimal, Decimal)> = report
            .revenue
            .category_breakdown
            .iter()
            .map(|c| (c.category.as_str(), c.revenue, c.percentage))
            .collect();
        assert_eq!(
            categories,
            vec![
                ("Healthy", dec!(26.00), dec!(41.94)),
                ("Mains", dec!(24.00), dec!(38.71)),
                ("Other", dec!(7.00), dec!(11.29)),
                ("Drinks", dec!(5.00), dec!(8.06)),
            ]
        );
        let pct_sum: Decimal = report.revenue.category_breakdown.iter().map(|c| c.percentage).sum();
        assert!((pct_sum - dec!(100)).abs() <= dec!(0.05));

        let by_hour = &report.revenue.revenue_by_hour;
        assert_eq!(by_hour.len(), 24);
        assert_eq!(by_hour[7].revenue, dec!(9.00));
        assert_eq!(by_hour[19].revenue, dec!(19.50));
        assert_eq!(by_hour[19].order_count, 1);
        assert_eq!(by_hour[3].revenue, Decimal::ZERO);
    }

    #[test]
    fn test_item_ties_go_to_first_seen() {
        let coffee = menu_item("Coffee", Some("Drinks"));
        let tea = menu_item("Tea", Some("Drinks"));
        let orders = vec![order(
            at(2024, 6, 12, 20, 0),
            OrderStatus::Completed,
            vec![line(&coffee, 1, dec!(2)), line(&tea, 1, dec!(2))],
        )];
        let report = build(
            &AnalyticsEngine::default(),
            week_of(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()),
            &orders,
        );

        assert_eq!(report.items.most_sold.as_ref().unwrap().name, "Coffee");
        assert_eq!(report.items.least_sold.as_ref().unwrap().name, "Coffee");
        assert_eq!(report.items.morning_bestseller, None);
        assert_eq!(report.items.evening_bestseller.as_ref().unwrap().name, "Coffee");
        let top: Vec<&str> = report.revenue.top_items_by_revenue.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(top, vec!["Coffee", "Tea"]);
    }

    #[test]
    fn test_only_severed_lines_have_no_item_insights() {
        let orders = vec![priced(at(2024, 6, 12, 8, 0), OrderStatus::Completed, dec!(5))];
        let report = build(
            &AnalyticsEngine::default(),
            week_of(NaiveDate::from_ymd_opt(2024, 6, 12).unwrap()),
            &orders,
        );
        assert_eq!(report.items, ItemInsights::default());
        assert_eq!(report.revenue.category_breakdown.len(), 1);
        assert_eq!(report.revenue.category_breakdown[0].category, "Other");
        assert_eq!(report.revenue.category_breakdown[0].percentage, dec!(100));
    }

    #[test]
    fn test_cancelled_policy_controls_revenue_figures() {
        let day = at(2024, 6, 12, 9, 0);
        let toast = menu_item("Toast", Some("Breakfast"));
        let soup = menu_item("Soup", Some("Mains"));
        let orders = vec![
            order(
                day,
                OrderStatus::Completed,
                vec![line(&toast, 2, dec!(5))],
            ),
            order(
                at(2024, 6, 12, 18, 0),
                OrderStatus::Cancelled,
                vec![line(&soup, 1, dec!(5))],
            ),
        ];
        let period = week_of(day.date_naive());

        let included = build(&AnalyticsEngine::default(), period, &orders);
        assert_eq!(included.summary.total_orders, 2);
        assert_eq!(included.summary.total_revenue, dec!(15));
        assert_eq!(included.items.evening_bestseller.as_ref().unwrap().menu_item_id, soup.id);
        assert_eq!(included.revenue.revenue_by_hour[18].revenue, dec!(5));
        assert_eq!(included.revenue.top_items_by_revenue.len(), 2);
        assert_eq!(included.revenue.category_breakdown.len(), 2);

        let excluded = build(
            &AnalyticsEngine::new(AnalyticsConfig {
                cancelled_orders: CancelledOrderPolicy::Exclude,
                ..AnalyticsConfig::default()
            }),
            period,
            &orders,
        );
        assert_eq!(excluded.summary.total_orders, 1);
        assert_eq!(excluded.summary.total_revenue, dec!(10));
        assert_eq!(excluded.time_series.iter().map(|b| b.order_count).sum::<u64>(), 1);

        assert_eq!(excluded.items.most_sold.as_ref().unwrap().menu_item_id, toast.id);
        assert_eq!(excluded.items.least_sold.as_ref().unwrap().menu_item_id, toast.id);
        assert!(excluded.items.evening_bestseller.is_none());
        assert_eq!(excluded.revenue.revenue_by_hour[18].order_count, 0);
        assert_eq!(excluded.revenue.revenue_by_hour[18].revenue, Decimal::ZERO);
        assert_eq!(excluded.revenue.revenue_by_hour[9].revenue, dec!(10));
        let top: Vec<Uuid> = excluded
            .revenue
            .top_items_by_revenue
            .iter()
            .map(|s| s.menu_item_id)
            .collect();
        assert_eq!(top, vec![toast.id]);
        let categories: Vec<(&str, Decimal)> = excluded
            .revenue
            .category_breakdown
            .iter()
            .map(|c| (c.category.as_str(), c.percentage))
            .collect();
        assert_eq!(categories, vec![("Breakfast", dec!(100))]);

        // Status figures still see every order.
        assert_eq!(excluded.performance.cancelled_orders, 1);
        assert_eq!(excluded.performance.completion_rate, dec!(50));
    }

    #[test]
    fn test_time_series_counts_match_working_set() {
        let orders: Vec<Order> = (0..30)
            .map(|i| priced(at(2024, 1, 1, 0, 0) + Duration::hours(i * 7), OrderStatus::Completed, dec!(2)))
            .collect();
        let period = Period::new(at(2024, 1, 1, 0, 0), at(2024, 3, 1, 0, 0)).unwrap();

        for granularity in [Granularity::Hour, Granularity::Day, Granularity::Month] {
            let report = AnalyticsEngine::default()
                .build_report(period, granularity, &orders, 0, &HashSet::new())
                .unwrap();
            let total: u64 = report.time_series.iter().map(|b| b.order_count).sum();
            assert_eq!(total, orders.len() as u64, "granularity {}", granularity);
        }
    }

    #[test]
    fn test_daily_stats_exclude_cancelled_orders() {
        let day = at(2024, 6, 12, 9, 0);
        let orders = vec![
            priced(day, OrderStatus::Pending, dec!(5)),
            priced(day, OrderStatus::InPreparation, dec!(7)),
            priced(day, OrderStatus::Ready, dec!(3)),
            priced(day, OrderStatus::Completed, dec!(10)),
            priced(day, OrderStatus::Cancelled, dec!(20)),
        ];
        let stats = AnalyticsEngine::default().daily_stats(day.date_naive(), &orders);

        assert_eq!(stats.orders_today, 4);
        assert_eq!(stats.revenue_today, dec!(25));
        assert_eq!(stats.pending_orders, 1);
        assert_eq!(stats.in_preparation_orders, 1);
        assert_eq!(stats.ready_orders, 1);
    }

    #[test]
    fn test_report_serializes_to_json() {
        let day = at(2024, 6, 12, 9, 0);
        let report = build(
            &AnalyticsEngine::default(),
            week_of(day.date_naive()),
            &[priced(day, OrderStatus::Completed, dec!(4.20))],
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["granularity"], "day");
        assert_eq!(json["summary"]["total_orders"], 1);
        assert!(json["summary"]["change_vs_previous"].is_null());
    }
}

use crate::report::CustomerInsights;
use crate::{ratio, share};
use core_types::Order;
use std::collections::HashSet;
use uuid::Uuid;

/// Splits the customers of a working set into new and returning cohorts.
///
/// A customer is *returning* when they placed at least one order strictly before
/// the period start. That check needs the full order history, so it is answered
/// by the store; this type only combines the answer with the working set.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomerCohortClassifier;

impl CustomerCohortClassifier {
    /// Distinct customer ids in first-seen order. Orders without a customer are skipped.
    pub fn distinct_customers(orders: &[Order]) -> Vec<Uuid> {
        let mut seen = HashSet::new();
        orders
            .iter()
            .filter_map(|o| o.customer_id)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// `with_prior_orders` is the store's answer for `distinct_customers(orders)`.
    /// Ids in it that are not in the working set are ignored.
    pub fn classify(orders: &[Order], with_prior_orders: &HashSet<Uuid>) -> CustomerInsights {
        let customers = Self::distinct_customers(orders);
        let unique = customers.len() as u64;
        let returning = customers
            .iter()
            .filter(|id| with_prior_orders.contains(id))
            .count() as u64;
        let new = unique - returning;

        CustomerInsights {
            unique_customers: unique,
            returning_customers: returning,
            new_customers: new,
            new_customer_percentage: share(new.into(), unique.into()),
            orders_per_customer: ratio((orders.len() as u64).into(), unique.into()),
        }
    }
}

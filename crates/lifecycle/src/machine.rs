use crate::error::LifecycleError;
use chrono::Utc;
use core_types::{Order, OrderStatus};
use database::OrderStore;
use events::OrderStatusChanged;
use std::sync::Arc;
use uuid::Uuid;

/// The result of a successful transition.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    /// The order as persisted after the transition, lines included.
    pub order: Order,
    pub previous_status: OrderStatus,
    /// Ready to be published on the notification channel by the caller.
    pub event: OrderStatusChanged,
}

/// Applies status transitions through an `OrderStore`.
#[derive(Clone)]
pub struct OrderStateMachine {
    store: Arc<dyn OrderStore>,
}

impl OrderStateMachine {
    pub fn new(store: Arc<dyn OrderStore>) -> Self {
        Self { store }
    }

    /// Moves `order_id` to `requested`.
    ///
    /// Fails with `NotFound` when the order does not exist, `InvalidTransition`
    /// when the table does not allow the move, and `Conflict` when another
    /// request changed the status between our read and our write.
    pub async fn attempt_transition(
        &self,
        order_id: Uuid,
        requested: OrderStatus,
    ) -> Result<TransitionOutcome, LifecycleError> {
        let current = self
            .store
            .get_order(order_id)
            .await?
            .ok_or(LifecycleError::NotFound(order_id))?
            .status;

        if !current.can_transition_to(requested) {
            tracing::warn!(%order_id, from = %current, to = %requested, "Rejected order status transition.");
            return Err(LifecycleError::InvalidTransition {
                order_id,
                from: current,
                to: requested,
            });
        }

        let order = self
            .store
            .set_order_status(order_id, requested, current)
            .await?
            .ok_or_else(|| {
                tracing::warn!(%order_id, expected = %current, to = %requested, "Order status changed concurrently.");
                LifecycleError::Conflict {
                    order_id,
                    expected: current,
                    to: requested,
                }
            })?;

        tracing::info!(%order_id, from = %current, to = %requested, "Order status updated.");

        let event = OrderStatusChanged::from_order(&order, current, Utc::now());
        Ok(TransitionOutcome {
            order,
            previous_status: current,
            event,
        })
    }

    /// Kitchen accepted the order: `Pending -> InPreparation`.
    pub async fn prepare(&self, order_id: Uuid) -> Result<TransitionOutcome, LifecycleError> {
        self.attempt_transition(order_id, OrderStatus::InPreparation).await
    }

    /// Food is waiting at the counter: `InPreparation -> Ready`.
    pub async fn mark_ready(&self, order_id: Uuid) -> Result<TransitionOutcome, LifecycleError> {
        self.attempt_transition(order_id, OrderStatus::Ready).await
    }

    /// Customer collected the order: `Ready -> Completed`.
    pub async fn complete(&self, order_id: Uuid) -> Result<TransitionOutcome, LifecycleError> {
        self.attempt_transition(order_id, OrderStatus::Completed).await
    }

    /// Only pending orders can be cancelled.
    pub async fn cancel(&self, order_id: Uuid) -> Result<TransitionOutcome, LifecycleError> {
        self.attempt_transition(order_id, OrderStatus::Cancelled).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::InMemoryOrderStore;
    use core_types::OrderLine;
    use rust_decimal_macros::dec;

    fn order_with_status(status: OrderStatus) -> Order {
        let mut order = Order::new(
            Some(Uuid::new_v4()),
            Utc::now(),
            vec![OrderLine::new(None, 2, dec!(4.50)).unwrap()],
        );
        order.status = status;
        order
    }

    async fn machine_with(order: &Order) -> (OrderStateMachine, Arc<InMemoryOrderStore>) {
        let store = Arc::new(InMemoryOrderStore::new());
        store.insert(order.clone()).await;
        (OrderStateMachine::new(store.clone()), store)
    }

    #[tokio::test]
    async fn test_every_pair_follows_the_table() {
        for current in OrderStatus::ALL {
            for next in OrderStatus::ALL {
                let order = order_with_status(current);
                let (machine, store) = machine_with(&order).await;

                let result = machine.attempt_transition(order.order_id, next).await;
                let stored = store.get_order(order.order_id).await.unwrap().unwrap();

                if current.can_transition_to(next) {
                    let outcome = result.unwrap();
                    assert_eq!(outcome.order.status, next);
                    assert_eq!(outcome.previous_status, current);
                    assert_eq!(stored.status, next);

                    // Repeating the same request from the new status is never allowed.
                    let again = machine.attempt_transition(order.order_id, next).await;
                    assert!(again.unwrap_err().is_invalid_operation());

                    let back = machine.attempt_transition(order.order_id, current).await;
                    if next.can_transition_to(current) {
                        assert!(back.is_ok());
                    } else {
                        assert!(back.unwrap_err().is_invalid_operation());
                    }
                } else {
                    let err = result.unwrap_err();
                    assert!(
                        matches!(err, LifecycleError::InvalidTransition { from, to, .. } if from == current && to == next),
                        "{} -> {} should be rejected",
                        current,
                        next
                    );
                    assert_eq!(stored.status, current);
                }
            }
        }
    }

    #[tokio::test]
    async fn test_ready_to_pending_is_rejected_and_status_kept() {
        let order = order_with_status(OrderStatus::Ready);
        let (machine, store) = machine_with(&order).await;

        let err = machine
            .attempt_transition(order.order_id, OrderStatus::Pending)
            .await
            .unwrap_err();
        assert!(err.is_invalid_operation());
        assert_eq!(
            store.get_order(order.order_id).await.unwrap().unwrap().status,
            OrderStatus::Ready
        );
    }

    #[tokio::test]
    async fn test_unknown_order_is_not_found() {
        let machine = OrderStateMachine::new(Arc::new(InMemoryOrderStore::new()));
        let id = Uuid::new_v4();
        let err = machine.prepare(id).await.unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(missing) if missing == id));
        assert!(!err.is_invalid_operation());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_transitions_only_one_wins() {
        for _ in 0..50 {
            let order = order_with_status(OrderStatus::Pending);
            let (machine, store) = machine_with(&order).await;
            let id = order.order_id;

            let first = {
                let machine = machine.clone();
                tokio::spawn(async move { machine.prepare(id).await })
            };
            let second = {
                let machine = machine.clone();
                tokio::spawn(async move { machine.prepare(id).await })
            };
            let results = [first.await.unwrap(), second.await.unwrap()];

            let successes = results.iter().filter(|r| r.is_ok()).count();
            assert_eq!(successes, 1);
            let failure = results.iter().find_map(|r| r.as_ref().err()).unwrap();
            assert!(failure.is_invalid_operation());
            assert_eq!(
                store.get_order(id).await.unwrap().unwrap().status,
                OrderStatus::InPreparation
            );
        }
    }

    #[tokio::test]
    async fn test_happy_path_and_event_payload() {
        let order = order_with_status(OrderStatus::Pending);
        let (machine, _store) = machine_with(&order).await;

        machine.prepare(order.order_id).await.unwrap();
        machine.mark_ready(order.order_id).await.unwrap();
        let outcome = machine.complete(order.order_id).await.unwrap();

        assert_eq!(outcome.order.lines.len(), 1);
        assert_eq!(outcome.event.order_id, order.order_id);
        assert_eq!(outcome.event.previous_status, OrderStatus::Ready);
        assert_eq!(outcome.event.new_status, OrderStatus::Completed);
        assert_eq!(outcome.event.total_amount, dec!(9.00));
        assert_eq!(outcome.event.customer_id, order.customer_id);

        assert!(machine.cancel(order.order_id).await.unwrap_err().is_invalid_operation());
    }

    #[tokio::test]
    async fn test_only_pending_orders_can_be_cancelled() {
        let pending = order_with_status(OrderStatus::Pending);
        let (machine, _) = machine_with(&pending).await;
        assert_eq!(
            machine.cancel(pending.order_id).await.unwrap().order.status,
            OrderStatus::Cancelled
        );

        let preparing = order_with_status(OrderStatus::InPreparation);
        let (machine, _) = machine_with(&preparing).await;
        assert!(machine.cancel(preparing.order_id).await.unwrap_err().is_invalid_operation());
    }
}

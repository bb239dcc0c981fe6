use core_types::OrderStatus;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Order {0} was not found.")]
    NotFound(Uuid),

    #[error("Order {order_id} cannot move from {from} to {to}.")]
    InvalidTransition {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },

    /// The status changed between the read and the conditional write.
    #[error("Order {order_id} is no longer {expected}; the transition to {to} was not applied.")]
    Conflict {
        order_id: Uuid,
        expected: OrderStatus,
        to: OrderStatus,
    },

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),
}

impl LifecycleError {
    /// Both illegal transitions and lost races are "invalid operation" failures for callers.
    pub fn is_invalid_operation(&self) -> bool {
        matches!(
            self,
            LifecycleError::InvalidTransition { .. } | LifecycleError::Conflict { .. }
        )
    }
}

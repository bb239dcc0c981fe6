//! # Canteen Order Lifecycle
//!
//! Validates and applies order status transitions.
//!
//! ```text
//! Pending ──▶ InPreparation ──▶ Ready ──▶ Completed
//!    │
//!    └──▶ Cancelled
//! ```
//!
//! Every entry point (`prepare`, `mark_ready`, `complete`, `cancel` and the
//! generic `attempt_transition`) consults the single transition table on
//! `OrderStatus` and persists through one conditional write, so two concurrent
//! requests on the same order can never both succeed.

pub mod error;
pub mod machine;

pub use error::LifecycleError;
pub use machine::{OrderStateMachine, TransitionOutcome};

//! # Canteen Events
//!
//! This crate defines the real-time event structures pushed to kitchen and
//! customer screens over WebSocket when an order changes status.
//!
//! As a Layer 0 crate, it depends only on `core-types`. Producing an event is
//! the state machine's job; delivering it is left to whoever holds the channel.

// Declare the modules that make up this crate.
pub mod error;
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::{OrderStatusChanged, WsMessage};

//! # Canteen Core Types
//!
//! The foundational (Layer 0) vocabulary shared by every other crate in the
//! workspace: orders and their line items, the order status enumeration, the
//! reporting granularity and the half-open reporting `Period`.
//!
//! This crate has no knowledge of storage, HTTP or analytics. It only encodes
//! the data model and the validation rules that belong to the data itself.

pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Granularity, OrderStatus};
pub use error::CoreError;
pub use structs::{MenuItemRef, Order, OrderLine, Period};

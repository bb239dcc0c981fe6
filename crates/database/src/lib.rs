//! # Canteen Database Crate
//!
//! This crate is the boundary between the order engine and persistence.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** The rest of the workspace only sees the `OrderStore`
//!   trait. SQL and row mapping stay inside `DbRepository`.
//! - **Atomic Transitions:** `set_order_status` is a conditional update; a
//!   status change only lands if the status read beforehand is still current.
//! - **Asynchronous & Pooled:** All operations are asynchronous, and the
//!   PostgreSQL implementation uses a connection pool (`PgPool`).
//!
//! ## Public API
//!
//! - `OrderStore`: the data-store contract.
//! - `DbRepository`: the PostgreSQL implementation.
//! - `InMemoryOrderStore`: a lock-protected in-memory implementation for tests and demos.
//! - `connect` / `run_migrations`: pool setup and schema migrations.
//! - `DbError`: the specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryOrderStore;
pub use repository::DbRepository;
pub use store::OrderStore;

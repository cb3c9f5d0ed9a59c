//! Database module
//!
//! PostgreSQL integration using sqlx with:
//! - Connection pool management and migrations
//! - Row types for binding normalized records
//! - One repository per relation
//! - The `CatalogStore` trait the workflows write through

#[cfg(test)]
pub mod memory;
pub mod models;
pub mod pool;
pub mod repository;
pub mod store;

// Re-export commonly used items
pub use pool::{create_pool, health_check, run_migrations};
pub use store::{CatalogStore, PgCatalogStore, RecordBatch};

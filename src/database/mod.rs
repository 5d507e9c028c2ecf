//! Database Module
//!
//! Database connection management for the account service.

pub mod connection;

// Re-export commonly used types
pub use connection::{create_pool, run_migrations, DatabasePool};

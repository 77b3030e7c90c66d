//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the levy portal using SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL for the `residents` and `monthly_bills` tables.
//! [`PostgresLevyStore`] implements the levy domain ports on top of them and
//! commits a payment (bill upserts plus the conditional credit update) in a
//! single transaction.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresLevyStore};
//!
//! let pool = create_pool(&DatabaseConfig::new("postgres://localhost/levy")).await?;
//! run_migrations(&pool).await?;
//! let store = PostgresLevyStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PostgresLevyStore;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};

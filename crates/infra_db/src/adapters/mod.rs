//! Domain Adapters
//!
//! Implementations of the levy domain ports backed by PostgreSQL.
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLevyStore;
//! use domain_levy::LevyAccountPort;
//!
//! let store = PostgresLevyStore::new(pool);
//! let account = store.get_account(resident_id, None).await?;
//! ```

pub mod levy;

pub use levy::PostgresLevyStore;

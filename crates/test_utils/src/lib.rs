//! Test Utilities Crate
//!
//! Shared test infrastructure for the levy workspace.
//!
//! # Modules
//!
//! - `fixtures`: Literal payment scenarios and fixed test data
//! - `builders`: Builders for accounts, allocation requests and payment commands
//! - `database`: PostgreSQL test container management
//! - `assertions`: Allocation invariant checks with readable failures
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

//! Repository implementations
//!
//! Repositories own the SQL and map rows to plain row structs; the adapter
//! turns rows into domain types.
//!
//! - Runtime-checked queries (`sqlx::query_as`) with `FromRow` rows
//! - Functions taking `&mut PgConnection` so callers can compose them in a
//!   transaction
//! - Optimistic concurrency on the credit balance

pub mod bills;
pub mod residents;

pub use bills::{BillRepository, BillRow};
pub use residents::{NewResident, ResidentRepository, ResidentRow};

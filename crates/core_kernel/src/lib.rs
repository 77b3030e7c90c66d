//! Core Kernel - Foundational types for the estate levy system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Billing periods (`YYYY-MM`) and calendar-month arithmetic
//! - Currency-aware amount formatting and validation helpers
//! - Strongly-typed identifiers
//! - Port contracts (error type, health checks) for persistence adapters

pub mod money;
pub mod period;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use money::{
    Currency, MoneyError, format_amount, ensure_amount, ensure_non_negative, AMOUNT_DECIMAL_PLACES,
    MAX_AMOUNT,
};
pub use period::{BillingPeriod, PeriodError, Timezone};
pub use identifiers::{ReceiptId, ResidentId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
pub use error::CoreError;

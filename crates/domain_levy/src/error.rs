//! Levy domain errors

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::{MoneyError, PeriodError, PortError, ResidentId};

/// Errors that can occur in the levy domain
#[derive(Debug, Error)]
pub enum LevyError {
    /// The caller's request was rejected before allocation ran
    #[error("Validation error: {0}")]
    Validation(String),

    /// An amount failed validation
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// A period failed to parse or was out of range
    #[error(transparent)]
    Period(#[from] PeriodError),

    /// No levy account exists for the resident
    #[error("Resident not found: {0}")]
    ResidentNotFound(ResidentId),

    /// The caller's credit snapshot no longer matches the stored balance
    #[error("Credit balance for {resident_id} has changed: stored {stored}, request used {supplied}")]
    StaleCreditBalance {
        resident_id: ResidentId,
        stored: Decimal,
        supplied: Decimal,
    },

    /// Another writer changed the account between read and commit
    #[error("Concurrent update for {resident_id}: {message}")]
    ConcurrentUpdate {
        resident_id: ResidentId,
        message: String,
    },

    /// The engine produced output that must never be persisted
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    /// The persistence step failed and was not retried further
    #[error("Payment not recorded: {reason}")]
    PaymentNotRecorded {
        reason: String,
    },

    /// Storage error outside of the payment commit
    #[error("Storage error: {0}")]
    Port(#[from] PortError),
}

impl LevyError {
    pub fn validation(message: impl Into<String>) -> Self {
        LevyError::Validation(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        LevyError::InvariantViolation(message.into())
    }

    /// True for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            LevyError::Validation(_) | LevyError::Money(_) | LevyError::Period(_)
        )
    }
}

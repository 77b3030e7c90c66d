//! Rolling credit balance
//!
//! Credit is unconsumed money carried forward from an earlier overpayment.
//! It is fungible with new cash: an allocation spends both from one pool.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{ensure_amount, MoneyError};

use crate::allocation::spendable_pool;
use crate::error::LevyError;

/// A resident's carried-forward credit; never negative
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct CreditBalance(Decimal);

impl CreditBalance {
    /// Creates a credit balance
    ///
    /// # Errors
    ///
    /// Returns `MoneyError` for amounts that are negative or cannot be stored
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        ensure_amount("credit_balance", amount).map(Self)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Credit left over from an allocation pool: `max(0, pool)`
    pub fn from_remaining_pool(pool: Decimal) -> Self {
        Self(pool.max(Decimal::ZERO))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Total spendable funds when `amount_received` is added to this credit
    ///
    /// # Errors
    ///
    /// `LevyError::Money` if the sum cannot be stored as credit
    pub fn pool_with(&self, amount_received: Decimal) -> Result<Decimal, LevyError> {
        spendable_pool(amount_received, self.0)
    }
}

impl TryFrom<Decimal> for CreditBalance {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CreditBalance> for Decimal {
    fn from(value: CreditBalance) -> Self {
        value.0
    }
}

impl fmt::Display for CreditBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

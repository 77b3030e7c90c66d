//! Levy accounts
//!
//! One account per resident, holding what they owe per period and their
//! rolling credit.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ensure_amount, MoneyError, ResidentId};

use crate::credit::CreditBalance;

/// A resident's levy account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevyAccount {
    /// Resident the account belongs to
    pub resident_id: ResidentId,
    /// Display name, printed on receipts
    pub full_name: String,
    /// Apartment or unit label
    pub apartment_unit: Option<String>,
    /// Amount billed each period
    pub amount_due_per_period: Decimal,
    /// Carried-forward credit
    pub credit_balance: CreditBalance,
}

impl LevyAccount {
    /// Creates an account with zero credit
    ///
    /// # Arguments
    ///
    /// * `resident_id` - Resident identifier
    /// * `full_name` - Display name
    /// * `amount_due_per_period` - Periodic levy, must not be negative
    pub fn new(
        resident_id: ResidentId,
        full_name: impl Into<String>,
        amount_due_per_period: Decimal,
    ) -> Result<Self, MoneyError> {
        Ok(Self {
            resident_id,
            full_name: full_name.into(),
            apartment_unit: None,
            amount_due_per_period: ensure_amount("amount_due_per_period", amount_due_per_period)?,
            credit_balance: CreditBalance::zero(),
        })
    }

    /// Sets the credit balance
    pub fn with_credit(mut self, credit: CreditBalance) -> Self {
        self.credit_balance = credit;
        self
    }

    /// Sets the apartment unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.apartment_unit = Some(unit.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_new_account_has_no_credit() {
        let account = LevyAccount::new(ResidentId::new(), "Ada Obi", dec!(5000)).unwrap();
        assert!(account.credit_balance.is_zero());
        assert_eq!(account.amount_due_per_period, dec!(5000));
    }

    #[test]
    fn test_negative_levy_rejected() {
        assert!(LevyAccount::new(ResidentId::new(), "Ada Obi", dec!(-1)).is_err());
    }
}

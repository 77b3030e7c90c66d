//! Bill postings
//!
//! A posting records what one resident was charged and paid for one billing
//! period. Postings are keyed by `(resident_id, period)`; writing a posting
//! for a key that already exists replaces it.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{BillingPeriod, ResidentId};

use crate::error::LevyError;

/// Settlement status of a posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    /// Nothing applied
    Unpaid,
    /// Some but not all of the amount due applied
    Partial,
    /// The full amount due applied
    Paid,
}

impl BillStatus {
    /// Classifies an applied amount against the amount due
    ///
    /// Uses direct comparison only, so a zero amount due is `Paid`.
    pub fn classify(applied: Decimal, amount_due: Decimal) -> Self {
        if applied >= amount_due {
            BillStatus::Paid
        } else if applied > Decimal::ZERO {
            BillStatus::Partial
        } else {
            BillStatus::Unpaid
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Unpaid => "unpaid",
            BillStatus::Partial => "partial",
            BillStatus::Paid => "paid",
        }
    }
}

impl fmt::Display for BillStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillStatus {
    type Err = LevyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(BillStatus::Unpaid),
            "partial" => Ok(BillStatus::Partial),
            "paid" => Ok(BillStatus::Paid),
            other => Err(LevyError::validation(format!("unknown bill status '{}'", other))),
        }
    }
}

/// How the resident paid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Bank transfer
    #[default]
    Transfer,
    /// Cash
    Cash,
    /// Card terminal
    #[serde(rename = "POS")]
    Pos,
    /// Cheque
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Transfer => "Transfer",
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Pos => "POS",
            PaymentMethod::Cheque => "Cheque",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = LevyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Transfer" => Ok(PaymentMethod::Transfer),
            "Cash" => Ok(PaymentMethod::Cash),
            "POS" => Ok(PaymentMethod::Pos),
            "Cheque" => Ok(PaymentMethod::Cheque),
            other => Err(LevyError::validation(format!("unknown payment method '{}'", other))),
        }
    }
}

/// One resident's bill for one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillPosting {
    /// Resident being billed
    pub resident_id: ResidentId,
    /// Billing period (`YYYY-MM`)
    pub period: BillingPeriod,
    /// Nominal amount due for the period
    pub amount_due: Decimal,
    /// Total applied to the period, credit included
    pub amount_paid: Decimal,
    /// Portion of `amount_paid` attributed to pre-existing credit
    pub credit_applied: Decimal,
    /// Number of months this row settles; always 1 for engine output
    pub months_covered: u32,
    /// Settlement status
    pub status: BillStatus,
    /// How the payment was made
    pub payment_method: PaymentMethod,
    /// Free-form notes from the recording admin
    pub notes: String,
    /// Who recorded the payment
    pub recorded_by: String,
    /// When the payment was recorded; `None` iff unpaid
    pub paid_at: Option<DateTime<Utc>>,
}

impl BillPosting {
    /// Upsert key of the posting
    pub fn conflict_key(&self) -> (ResidentId, BillingPeriod) {
        (self.resident_id, self.period)
    }

    /// Portion of `amount_paid` that came from new cash
    pub fn cash_portion(&self) -> Decimal {
        self.amount_paid - self.credit_applied
    }

    pub fn is_paid(&self) -> bool {
        self.status == BillStatus::Paid
    }

    /// Checks the posting invariants
    ///
    /// # Errors
    ///
    /// Returns `LevyError::InvariantViolation` when any of these fail:
    /// - amounts are non-negative
    /// - `amount_paid <= amount_due` and `credit_applied <= amount_due`
    /// - `credit_applied <= amount_paid`
    /// - `paid_at` is set exactly when the status is not unpaid
    pub fn check_invariants(&self) -> Result<(), LevyError> {
        let key = format!("{} {}", self.resident_id, self.period);

        if self.amount_due < Decimal::ZERO
            || self.amount_paid < Decimal::ZERO
            || self.credit_applied < Decimal::ZERO
        {
            return Err(LevyError::invariant(format!("{}: negative amount in posting", key)));
        }
        if self.amount_paid > self.amount_due {
            return Err(LevyError::invariant(format!(
                "{}: amount paid {} exceeds amount due {}",
                key, self.amount_paid, self.amount_due
            )));
        }
        if self.credit_applied > self.amount_due || self.credit_applied > self.amount_paid {
            return Err(LevyError::invariant(format!(
                "{}: credit applied {} exceeds amount paid {}",
                key, self.credit_applied, self.amount_paid
            )));
        }
        if (self.status != BillStatus::Unpaid) != self.paid_at.is_some() {
            return Err(LevyError::invariant(format!(
                "{}: paid_at does not match status {}",
                key, self.status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_classify() {
        assert_eq!(BillStatus::classify(dec!(5000), dec!(5000)), BillStatus::Paid);
        assert_eq!(BillStatus::classify(dec!(2000), dec!(5000)), BillStatus::Partial);
        assert_eq!(BillStatus::classify(dec!(0), dec!(5000)), BillStatus::Unpaid);
        assert_eq!(BillStatus::classify(dec!(0), dec!(0)), BillStatus::Paid);
    }

    #[test]
    fn test_payment_method_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Pos).unwrap(), "\"POS\"");
        assert_eq!("Cheque".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cheque);
        assert!("Bitcoin".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_status_wire_names() {
        assert_eq!(serde_json::to_string(&BillStatus::Partial).unwrap(), "\"partial\"");
        assert_eq!("paid".parse::<BillStatus>().unwrap(), BillStatus::Paid);
    }
}

//! Next-due resolution
//!
//! Finds the period a resident should pay for next. The anchor is the latest
//! fully paid period, not the earliest gap: a resident who prepaid a future
//! month is pointed past it even if an earlier month is still open.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::BillingPeriod;

use crate::bill::BillStatus;
use crate::credit::CreditBalance;

/// What a resident owes next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextDue {
    pub target_period: BillingPeriod,
    pub amount_due: Decimal,
    pub credit_balance: CreditBalance,
    /// `max(0, amount_due - credit_balance)`
    pub amount_owed: Decimal,
    /// True when credit alone settles the target period
    pub covered_by_credit: bool,
    /// Latest period with status `paid`, if any
    pub latest_paid: Option<BillingPeriod>,
}

/// Resolves the next period to pay
///
/// `history` may arrive in any order; only `paid` entries move the anchor.
pub fn resolve_next_due<I>(
    history: I,
    current: BillingPeriod,
    amount_due: Decimal,
    credit: CreditBalance,
) -> NextDue
where
    I: IntoIterator<Item = (BillingPeriod, BillStatus)>,
{
    let latest_paid = history
        .into_iter()
        .filter(|(_, status)| *status == BillStatus::Paid)
        .map(|(period, _)| period)
        .max();

    let target_period = match latest_paid {
        Some(latest) if latest >= current => latest.succ(),
        _ => current,
    };

    let amount_owed = (amount_due - credit.amount()).max(Decimal::ZERO);

    NextDue {
        target_period,
        amount_due,
        credit_balance: credit,
        amount_owed,
        covered_by_credit: amount_owed.is_zero(),
        latest_paid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn p(s: &str) -> BillingPeriod {
        s.parse().unwrap()
    }

    #[test]
    fn test_partial_does_not_move_anchor() {
        let history = vec![(p("2026-06"), BillStatus::Partial)];
        let next = resolve_next_due(history, p("2026-02"), dec!(5000), CreditBalance::zero());
        assert_eq!(next.target_period, p("2026-02"));
        assert_eq!(next.latest_paid, None);
    }

    #[test]
    fn test_stale_paid_history_points_at_current() {
        let history = vec![(p("2025-11"), BillStatus::Paid), (p("2025-12"), BillStatus::Paid)];
        let next = resolve_next_due(history, p("2026-02"), dec!(5000), CreditBalance::zero());
        assert_eq!(next.target_period, p("2026-02"));
        assert_eq!(next.latest_paid, Some(p("2025-12")));
    }

    #[test]
    fn test_current_paid_moves_to_next_month() {
        let history = vec![(p("2026-12"), BillStatus::Paid)];
        let next = resolve_next_due(history, p("2026-12"), dec!(5000), CreditBalance::zero());
        assert_eq!(next.target_period, p("2027-01"));
    }

    #[test]
    fn test_partial_credit_reduces_owed() {
        let credit = CreditBalance::new(dec!(1500)).unwrap();
        let next = resolve_next_due(Vec::new(), p("2026-02"), dec!(5000), credit);
        assert_eq!(next.amount_owed, dec!(3500));
        assert!(!next.covered_by_credit);
    }
}

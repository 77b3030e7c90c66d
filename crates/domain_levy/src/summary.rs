//! Collection summary for one billing period

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillingPeriod, ResidentId};

use crate::account::LevyAccount;
use crate::bill::{BillPosting, BillStatus};

/// Dashboard figures for a period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSummary {
    pub period: BillingPeriod,
    pub total_residents: usize,
    pub paid: usize,
    pub partial: usize,
    /// Residents with no posting for the period or an unpaid one
    pub unpaid: usize,
    /// Sum of `amount_paid` over the period's postings
    pub total_collected: Decimal,
    /// Sum of all residents' credit balances
    pub outstanding_credit: Decimal,
}

/// Summarizes collection for `period`
///
/// Postings for residents without an account still count toward
/// `total_collected` but not toward the status counts.
pub fn summarize_collection(
    period: BillingPeriod,
    accounts: &[LevyAccount],
    postings: &[BillPosting],
) -> CollectionSummary {
    let by_resident: HashMap<ResidentId, BillStatus> = postings
        .iter()
        .filter(|p| p.period == period)
        .map(|p| (p.resident_id, p.status))
        .collect();

    let (mut paid, mut partial, mut unpaid) = (0, 0, 0);
    for account in accounts {
        match by_resident.get(&account.resident_id) {
            Some(BillStatus::Paid) => paid += 1,
            Some(BillStatus::Partial) => partial += 1,
            Some(BillStatus::Unpaid) | None => unpaid += 1,
        }
    }

    CollectionSummary {
        period,
        total_residents: accounts.len(),
        paid,
        partial,
        unpaid,
        total_collected: postings
            .iter()
            .filter(|p| p.period == period)
            .map(|p| p.amount_paid)
            .sum(),
        outstanding_credit: accounts.iter().map(|a| a.credit_balance.amount()).sum(),
    }
}

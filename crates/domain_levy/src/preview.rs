//! Payment preview
//!
//! Projects what each month in a contiguous range would receive before the
//! payment is recorded. Unlike [`crate::allocate`], months beyond the funds
//! are still listed, as unpaid, so the admin sees the whole range.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ensure_amount, BillingPeriod};

use crate::allocation::spendable_pool;
use crate::bill::BillStatus;
use crate::error::LevyError;

/// Longest range a single payment may cover
pub const MAX_PREVIEW_MONTHS: u32 = 12;

/// Input to [`preview_allocation`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub amount_received: Decimal,
    pub current_credit: Decimal,
    pub amount_due_per_month: Decimal,
    pub start_month: BillingPeriod,
    pub months_count: u32,
}

impl PreviewRequest {
    pub fn validate(&self) -> Result<(), LevyError> {
        ensure_amount("amount_received", self.amount_received)?;
        ensure_amount("current_credit", self.current_credit)?;
        ensure_amount("amount_due_per_month", self.amount_due_per_month)?;
        self.pool()?;

        if self.months_count == 0 || self.months_count > MAX_PREVIEW_MONTHS {
            return Err(LevyError::validation(format!(
                "months_count must be between 1 and {}, got {}",
                MAX_PREVIEW_MONTHS, self.months_count
            )));
        }
        Ok(())
    }

    /// `amount_received + current_credit`, bounded like any stored amount
    pub fn pool(&self) -> Result<Decimal, LevyError> {
        spendable_pool(self.amount_received, self.current_credit)
    }

    /// The months the payment would be marked against
    pub fn months(&self) -> Vec<BillingPeriod> {
        BillingPeriod::range(self.start_month, self.months_count as usize)
    }
}

/// One projected month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewLine {
    pub period: BillingPeriod,
    /// Human label, e.g. "February 2026"
    pub label: String,
    /// Projected amount applied, floored at zero
    pub projected_amount: Decimal,
    pub amount_due: Decimal,
    pub status: BillStatus,
}

/// Projected outcome of a payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationPreview {
    pub pool: Decimal,
    pub lines: Vec<PreviewLine>,
    /// Credit carried to the month after the range, if any
    pub projected_surplus: Option<Decimal>,
}

/// Builds the preview for a request
///
/// # Errors
///
/// Returns a validation error for negative, oversized or over-precise
/// amounts, or an out-of-range month count.
pub fn preview_allocation(request: &PreviewRequest) -> Result<AllocationPreview, LevyError> {
    request.validate()?;

    let due = request.amount_due_per_month;
    let pool = request.pool()?;
    let mut available = pool;

    let lines = request
        .months()
        .into_iter()
        .map(|period| {
            let projected = available.min(due);
            available = available.saturating_sub(due);
            PreviewLine {
                label: period.label(),
                period,
                projected_amount: projected.max(Decimal::ZERO),
                amount_due: due,
                status: BillStatus::classify(projected, due),
            }
        })
        .collect();

    let surplus = available;

    Ok(AllocationPreview {
        pool,
        lines,
        projected_surplus: (surplus > Decimal::ZERO).then_some(surplus),
    })
}

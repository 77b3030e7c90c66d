//! Payment allocation engine
//!
//! Spreads one payment event over an ordered list of billing periods.
//!
//! New cash and the resident's existing credit are pooled, then each period
//! in turn takes up to its nominal amount due from the pool. The pool is
//! always reduced by the *full* amount due, even when a period could only be
//! partly funded, so an underfunded period consumes a whole period's worth of
//! pool and iteration stops once the pool is no longer positive. Periods after
//! that point get no posting at all. Whatever is left after the last period
//! becomes the new credit balance.
//!
//! The engine reads no clock and touches no storage: identical requests
//! produce identical results.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{ensure_amount, BillingPeriod, MoneyError, ResidentId, MAX_AMOUNT};

use crate::bill::{BillPosting, BillStatus, PaymentMethod};
use crate::credit::CreditBalance;
use crate::error::LevyError;

/// Details copied onto every posting produced by one allocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingContext {
    pub resident_id: ResidentId,
    pub payment_method: PaymentMethod,
    pub notes: String,
    pub recorded_by: String,
    /// Stamped as `paid_at` on funded postings
    pub recorded_at: DateTime<Utc>,
}

impl PostingContext {
    /// Creates a context stamped with the current time
    pub fn new(resident_id: ResidentId, recorded_by: impl Into<String>) -> Self {
        Self {
            resident_id,
            payment_method: PaymentMethod::default(),
            notes: String::new(),
            recorded_by: recorded_by.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn with_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = method;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Pins the recording time
    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = at;
        self
    }
}

/// Input to [`allocate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    /// New cash received
    pub amount_received: Decimal,
    /// Credit balance before this payment
    pub current_credit: Decimal,
    /// Amount due for each period
    pub amount_due_per_period: Decimal,
    /// Periods to settle, earliest first
    pub target_periods: Vec<BillingPeriod>,
    pub context: PostingContext,
}

impl AllocationRequest {
    pub fn new(
        amount_received: Decimal,
        current_credit: Decimal,
        amount_due_per_period: Decimal,
        target_periods: Vec<BillingPeriod>,
        context: PostingContext,
    ) -> Self {
        Self {
            amount_received,
            current_credit,
            amount_due_per_period,
            target_periods,
            context,
        }
    }

    /// Total spendable funds for this allocation
    ///
    /// The pool can end up as carried credit, so it is held to the same
    /// bound as any stored amount.
    ///
    /// # Errors
    ///
    /// `LevyError::Money` if the sum overflows or exceeds `MAX_AMOUNT`
    pub fn pool(&self) -> Result<Decimal, LevyError> {
        spendable_pool(self.amount_received, self.current_credit)
    }

    /// Checks the engine's input domain
    ///
    /// # Errors
    ///
    /// - `LevyError::Money` if any amount is negative, too large or has
    ///   more than two decimal places
    /// - `LevyError::Validation` if periods are not strictly ascending
    pub fn validate(&self) -> Result<(), LevyError> {
        ensure_amount("amount_received", self.amount_received)?;
        ensure_amount("current_credit", self.current_credit)?;
        ensure_amount("amount_due_per_period", self.amount_due_per_period)?;
        self.pool()?;

        if let Some(pair) = self.target_periods.windows(2).find(|w| w[0] >= w[1]) {
            return Err(LevyError::validation(format!(
                "target periods must be ascending without duplicates ({} then {})",
                pair[0], pair[1]
            )));
        }
        Ok(())
    }
}

/// Output of [`allocate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResult {
    /// One posting per period touched, in request order
    pub postings: Vec<BillPosting>,
    /// Credit carried forward after this payment
    pub new_credit_balance: CreditBalance,
}

impl AllocationResult {
    pub fn bills_created(&self) -> usize {
        self.postings.len()
    }

    /// Sum of `amount_paid` over all postings
    pub fn total_applied(&self) -> Decimal {
        self.postings.iter().map(|p| p.amount_paid).sum()
    }

    pub fn paid_count(&self) -> usize {
        self.postings.iter().filter(|p| p.is_paid()).count()
    }

    pub fn periods(&self) -> Vec<BillingPeriod> {
        self.postings.iter().map(|p| p.period).collect()
    }

    /// Verifies the result against the request it came from
    ///
    /// Every posting must satisfy its own invariants, and no money may be
    /// created or destroyed: `total_applied + new_credit == pool`.
    ///
    /// # Errors
    ///
    /// Returns `LevyError::InvariantViolation` describing the first failure
    pub fn verify(&self, request: &AllocationRequest) -> Result<(), LevyError> {
        for posting in &self.postings {
            posting.check_invariants()?;
        }

        let pool = request.pool()?;
        let accounted = self
            .total_applied()
            .checked_add(self.new_credit_balance.amount());
        if accounted != Some(pool) {
            return Err(LevyError::invariant(format!(
                "allocation does not conserve funds: applied {} + credit {} != pool {}",
                self.total_applied(),
                self.new_credit_balance,
                pool
            )));
        }
        Ok(())
    }
}

/// `received + credit`, rejected when it overflows or cannot be stored
pub(crate) fn spendable_pool(received: Decimal, credit: Decimal) -> Result<Decimal, LevyError> {
    let pool = received.checked_add(credit).ok_or_else(|| MoneyError::OutOfRange {
        field: "pool".to_string(),
        amount: received,
        max: MAX_AMOUNT,
    })?;
    Ok(ensure_amount("pool", pool)?)
}

/// Allocates a payment across the requested periods
///
/// Total on its input domain (non-negative amounts, well-formed periods);
/// callers validate with [`AllocationRequest::validate`] first. Arithmetic
/// saturates instead of panicking on unvalidated input, and
/// [`AllocationResult::verify`] rejects whatever that produces.
pub fn allocate(request: &AllocationRequest) -> AllocationResult {
    let due = request.amount_due_per_period;
    let ctx = &request.context;
    let mut pool = request.amount_received.saturating_add(request.current_credit);
    let mut postings = Vec::with_capacity(request.target_periods.len());

    for period in &request.target_periods {
        if pool <= Decimal::ZERO {
            break;
        }

        let applied = pool.min(due);
        let status = BillStatus::classify(applied, due);
        // Audit attribution only; credit is consumed through the pool
        let credit_applied = request.current_credit.min(applied).max(Decimal::ZERO);

        postings.push(BillPosting {
            resident_id: ctx.resident_id,
            period: *period,
            amount_due: due,
            amount_paid: applied,
            credit_applied,
            months_covered: 1,
            status,
            payment_method: ctx.payment_method,
            notes: ctx.notes.clone(),
            recorded_by: ctx.recorded_by.clone(),
            paid_at: (status != BillStatus::Unpaid).then_some(ctx.recorded_at),
        });

        pool = pool.saturating_sub(due);
    }

    AllocationResult {
        postings,
        new_credit_balance: CreditBalance::from_remaining_pool(pool),
    }
}

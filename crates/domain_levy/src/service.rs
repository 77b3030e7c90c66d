//! Payment recording service
//!
//! Orchestrates one "record payment" operation: validate the request, take
//! the resident's critical section, check the credit snapshot, allocate,
//! verify, then commit postings and the new balance as one unit. Only the
//! commit step is retried.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use core_kernel::{
    ensure_amount, BillingPeriod, HealthCheckResult, OperationMetadata, PortError,
    ReceiptId, ResidentId, Timezone,
};

use crate::account::LevyAccount;
use crate::allocation::{allocate, AllocationRequest, PostingContext};
use crate::bill::{BillPosting, PaymentMethod};
use crate::credit::CreditBalance;
use crate::error::LevyError;
use crate::locks::ResidentLocks;
use crate::next_due::{resolve_next_due, NextDue};
use crate::ports::{AllocationCommit, LevyStore};
use crate::preview::{preview_allocation, AllocationPreview, PreviewRequest};
use crate::summary::{summarize_collection, CollectionSummary};

/// Retry settings for the commit step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total commit attempts, at least 1
    pub max_attempts: u32,
    /// Delay before the second attempt; grows linearly after that
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// No retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(200))
    }
}

/// A request to record one payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentCommand {
    pub resident_id: ResidentId,
    pub amount_received: Decimal,
    /// Months to settle, earliest first
    pub months_to_mark: Vec<BillingPeriod>,
    pub amount_due_per_month: Decimal,
    /// Credit balance the caller saw; `None` uses the stored balance
    pub current_credit: Option<Decimal>,
    pub notes: String,
    pub recorded_by: String,
    pub payment_method: PaymentMethod,
}

impl RecordPaymentCommand {
    /// Checks the request shape before any storage is touched
    pub fn validate(&self) -> Result<(), LevyError> {
        if self.resident_id.is_nil() {
            return Err(LevyError::validation("resident_id is required"));
        }
        ensure_amount("amount_received", self.amount_received)?;
        ensure_amount("amount_due_per_month", self.amount_due_per_month)?;
        if let Some(credit) = self.current_credit {
            ensure_amount("current_credit", credit)?;
        }
        if self.months_to_mark.is_empty() {
            return Err(LevyError::validation("months_to_mark must not be empty"));
        }
        if let Some(pair) = self.months_to_mark.windows(2).find(|w| w[0] >= w[1]) {
            let reason = if pair[0] == pair[1] { "duplicate month" } else { "months out of order" };
            return Err(LevyError::validation(format!(
                "months_to_mark: {} ({} then {})",
                reason, pair[0], pair[1]
            )));
        }
        if self.recorded_by.trim().is_empty() {
            return Err(LevyError::validation("recorded_by is required"));
        }
        Ok(())
    }
}

/// Post-payment receipt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
    pub receipt_number: ReceiptId,
    pub resident_id: ResidentId,
    pub resident_name: String,
    pub apartment_unit: Option<String>,
    pub amount_received: Decimal,
    /// Pre-existing credit consumed by this payment
    pub credit_applied: Decimal,
    pub months_covered: Vec<BillingPeriod>,
    pub new_credit_balance: CreditBalance,
    pub payment_method: PaymentMethod,
    pub recorded_by: String,
    pub recorded_at: DateTime<Utc>,
}

/// Result of a recorded payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentOutcome {
    pub new_credit_balance: CreditBalance,
    pub bills_created: usize,
    pub postings: Vec<BillPosting>,
    pub receipt: PaymentReceipt,
}

/// Application service for levy payments
pub struct PaymentService {
    store: Arc<dyn LevyStore>,
    locks: ResidentLocks,
    retry: RetryPolicy,
    timezone: Timezone,
}

impl PaymentService {
    pub fn new(store: Arc<dyn LevyStore>) -> Self {
        Self {
            store,
            locks: ResidentLocks::new(),
            retry: RetryPolicy::default(),
            timezone: Timezone::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the zone used to decide the current period
    pub fn with_timezone(mut self, timezone: Timezone) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn store(&self) -> &Arc<dyn LevyStore> {
        &self.store
    }

    pub fn timezone(&self) -> &Timezone {
        &self.timezone
    }

    pub fn current_period(&self) -> BillingPeriod {
        BillingPeriod::current_in(&self.timezone)
    }

    /// Records a payment stamped with the current time
    pub async fn record_payment(
        &self,
        command: RecordPaymentCommand,
    ) -> Result<PaymentOutcome, LevyError> {
        self.record_payment_at(command, Utc::now()).await
    }

    /// Records a payment stamped with `recorded_at`
    ///
    /// # Errors
    ///
    /// - `Validation` / `Money` for a malformed request
    /// - `ResidentNotFound` if there is no account
    /// - `StaleCreditBalance` if the caller's credit snapshot is out of date
    /// - `InvariantViolation` if the allocation fails verification
    /// - `ConcurrentUpdate` if the balance changed before commit
    /// - `PaymentNotRecorded` if the commit could not be persisted
    #[instrument(skip(self, command), fields(resident_id = %command.resident_id))]
    pub async fn record_payment_at(
        &self,
        command: RecordPaymentCommand,
        recorded_at: DateTime<Utc>,
    ) -> Result<PaymentOutcome, LevyError> {
        command.validate()?;

        let _section = self.locks.acquire(command.resident_id).await;

        let account = self.load_account(command.resident_id).await?;
        let stored = account.credit_balance;
        if let Some(supplied) = command.current_credit {
            if supplied != stored.amount() {
                return Err(LevyError::StaleCreditBalance {
                    resident_id: command.resident_id,
                    stored: stored.amount(),
                    supplied,
                });
            }
        }

        let context = PostingContext::new(command.resident_id, command.recorded_by.clone())
            .with_method(command.payment_method)
            .with_notes(command.notes.clone())
            .recorded_at(recorded_at);
        let request = AllocationRequest::new(
            command.amount_received,
            stored.amount(),
            command.amount_due_per_month,
            command.months_to_mark.clone(),
            context,
        );
        request.validate()?;

        let result = allocate(&request);
        result.verify(&request)?;

        let commit = AllocationCommit {
            resident_id: command.resident_id,
            previous_credit: stored,
            new_credit: result.new_credit_balance,
            postings: result.postings.clone(),
        };
        let metadata = OperationMetadata::default()
            .initiated_by(command.recorded_by.clone())
            .with_context("operation", "record_payment");
        self.commit_with_retry(&commit, metadata).await?;

        info!(
            bills_created = result.bills_created(),
            amount_received = %command.amount_received,
            new_credit = %result.new_credit_balance,
            "Payment recorded"
        );

        let receipt = PaymentReceipt {
            receipt_number: ReceiptId::new_v7(),
            resident_id: account.resident_id,
            resident_name: account.full_name,
            apartment_unit: account.apartment_unit,
            amount_received: command.amount_received,
            credit_applied: stored.amount().min(result.total_applied()),
            months_covered: result.periods(),
            new_credit_balance: result.new_credit_balance,
            payment_method: command.payment_method,
            recorded_by: command.recorded_by,
            recorded_at,
        };

        Ok(PaymentOutcome {
            new_credit_balance: result.new_credit_balance,
            bills_created: result.bills_created(),
            postings: result.postings,
            receipt,
        })
    }

    async fn commit_with_retry(
        &self,
        commit: &AllocationCommit,
        metadata: OperationMetadata,
    ) -> Result<(), LevyError> {
        let mut attempt = 0;
        let mut interrupted = false;

        loop {
            attempt += 1;
            let err = match self.store.commit_allocation(commit, Some(metadata.clone())).await {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            if err.is_transient() && attempt < self.retry.max_attempts {
                warn!(attempt, error = %err, "Commit failed, retrying");
                interrupted = true;
                tokio::time::sleep(self.retry.delay_after(attempt)).await;
                continue;
            }

            if err.is_conflict() {
                // An interrupted attempt may have been applied before the error surfaced
                if interrupted && self.commit_landed(commit).await {
                    return Ok(());
                }
                return Err(LevyError::ConcurrentUpdate {
                    resident_id: commit.resident_id,
                    message: err.to_string(),
                });
            }

            warn!(attempt, error = %err, "Payment not recorded");
            return Err(LevyError::PaymentNotRecorded {
                reason: describe_commit_failure(&err, attempt),
            });
        }
    }

    async fn commit_landed(&self, commit: &AllocationCommit) -> bool {
        matches!(
            self.store.get_account(commit.resident_id, None).await,
            Ok(account) if account.credit_balance == commit.new_credit
        )
    }

    async fn load_account(&self, resident_id: ResidentId) -> Result<LevyAccount, LevyError> {
        self.store
            .get_account(resident_id, None)
            .await
            .map_err(|err| {
                if err.is_not_found() {
                    LevyError::ResidentNotFound(resident_id)
                } else {
                    LevyError::Port(err)
                }
            })
    }

    /// What the resident owes next, as of `period` (default: current)
    pub async fn next_due(
        &self,
        resident_id: ResidentId,
        period: Option<BillingPeriod>,
    ) -> Result<NextDue, LevyError> {
        let account = self.load_account(resident_id).await?;
        let history = self.store.postings_for_resident(resident_id, None).await?;
        let current = period.unwrap_or_else(|| self.current_period());

        Ok(resolve_next_due(
            history.iter().map(|p| (p.period, p.status)),
            current,
            account.amount_due_per_period,
            account.credit_balance,
        ))
    }

    /// Bill history, latest period first
    pub async fn history(&self, resident_id: ResidentId) -> Result<Vec<BillPosting>, LevyError> {
        self.load_account(resident_id).await?;
        Ok(self.store.postings_for_resident(resident_id, None).await?)
    }

    pub async fn account(&self, resident_id: ResidentId) -> Result<LevyAccount, LevyError> {
        self.load_account(resident_id).await
    }

    pub fn preview(&self, request: &PreviewRequest) -> Result<AllocationPreview, LevyError> {
        preview_allocation(request)
    }

    /// Collection figures for `period` (default: current)
    pub async fn collection_summary(
        &self,
        period: Option<BillingPeriod>,
    ) -> Result<CollectionSummary, LevyError> {
        let period = period.unwrap_or_else(|| self.current_period());
        let accounts = self.store.list_accounts(None).await?;
        let postings = self.store.postings_for_period(period, None).await?;
        Ok(summarize_collection(period, &accounts, &postings))
    }

    pub async fn health(&self) -> HealthCheckResult {
        self.store.health_check().await
    }
}

fn describe_commit_failure(err: &PortError, attempts: u32) -> String {
    if err.is_transient() {
        format!("storage unavailable after {} attempt(s): {}", attempts, err)
    } else {
        err.to_string()
    }
}

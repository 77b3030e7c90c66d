//! Levy Domain Ports
//!
//! Storage interfaces for bills and levy accounts. The payment service only
//! talks to these traits; adapters decide where the data lives.
//!
//! - **PostgreSQL**: `infra_db::PostgresLevyStore`
//! - **In-memory**: [`memory::InMemoryLevyStore`], for tests and local runs
//!
//! # Conflict key
//!
//! Bills are keyed by `(resident_id, period)`. Writing a posting whose key
//! already exists **replaces** the stored row wholesale; amounts are never
//! summed across writes. Recording a second payment for an already-posted
//! month therefore overwrites the earlier posting.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_levy::{LevyStore, PaymentService};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn LevyStore> = Arc::new(PostgresLevyStore::new(pool));
//! let service = PaymentService::new(store);
//! ```

use async_trait::async_trait;
use rust_decimal::Decimal;

use core_kernel::{
    BillingPeriod, DomainPort, HealthCheckable, OperationMetadata, PortError, ResidentId,
};

use crate::account::LevyAccount;
use crate::bill::BillPosting;
use crate::credit::CreditBalance;

/// Storage for bill postings
#[async_trait]
pub trait BillLedgerPort: DomainPort {
    /// Upserts a batch of postings
    ///
    /// Replace-on-conflict by `(resident_id, period)`. The batch is applied
    /// atomically. Returns the number of rows written.
    async fn upsert_postings(
        &self,
        postings: &[BillPosting],
        metadata: Option<OperationMetadata>,
    ) -> Result<usize, PortError>;

    /// All postings for a resident, latest period first
    async fn postings_for_resident(
        &self,
        resident_id: ResidentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<BillPosting>, PortError>;

    /// All postings for one period
    async fn postings_for_period(
        &self,
        period: BillingPeriod,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<BillPosting>, PortError>;
}

/// Storage for levy accounts
#[async_trait]
pub trait LevyAccountPort: DomainPort {
    /// Fetches an account, `PortError::NotFound` if absent
    async fn get_account(
        &self,
        resident_id: ResidentId,
        metadata: Option<OperationMetadata>,
    ) -> Result<LevyAccount, PortError>;

    async fn list_accounts(
        &self,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<LevyAccount>, PortError>;

    /// Overwrites the stored credit balance
    ///
    /// Negative values are rejected with `PortError::Validation`.
    async fn set_credit_balance(
        &self,
        resident_id: ResidentId,
        value: Decimal,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;
}

/// Everything one payment writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocationCommit {
    pub resident_id: ResidentId,
    /// Balance the allocation was computed from
    pub previous_credit: CreditBalance,
    pub new_credit: CreditBalance,
    pub postings: Vec<BillPosting>,
}

/// Combined store used by the payment service
#[async_trait]
pub trait LevyStore: BillLedgerPort + LevyAccountPort + HealthCheckable {
    /// Writes postings and the new balance as one unit
    ///
    /// Succeeds only if the stored balance still equals
    /// `commit.previous_credit`; otherwise nothing is written and
    /// `PortError::Conflict` is returned.
    async fn commit_allocation(
        &self,
        commit: &AllocationCommit,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;
}

/// In-memory store
pub mod memory {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
    use std::sync::Arc;

    use chrono::Utc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    #[derive(Debug, Default)]
    struct State {
        accounts: HashMap<ResidentId, LevyAccount>,
        bills: BTreeMap<(ResidentId, BillingPeriod), BillPosting>,
    }

    /// In-memory implementation of [`LevyStore`]
    ///
    /// Commits take a single write lock, so a commit is all-or-nothing.
    /// `fail_next_commits` injects transient failures for retry tests.
    #[derive(Debug, Clone, Default)]
    pub struct InMemoryLevyStore {
        state: Arc<RwLock<State>>,
        injected_failures: Arc<AtomicU32>,
        commits: Arc<AtomicU64>,
    }

    impl InMemoryLevyStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with accounts
        pub async fn with_accounts(accounts: Vec<LevyAccount>) -> Self {
            let store = Self::new();
            for account in accounts {
                store.insert_account(account).await;
            }
            store
        }

        pub async fn insert_account(&self, account: LevyAccount) {
            self.state
                .write()
                .await
                .accounts
                .insert(account.resident_id, account);
        }

        /// Makes the next `count` commits fail with a connection error
        pub fn fail_next_commits(&self, count: u32) {
            self.injected_failures.store(count, Ordering::SeqCst);
        }

        /// Number of commits applied
        pub fn commit_count(&self) -> u64 {
            self.commits.load(Ordering::SeqCst)
        }

        fn take_injected_failure(&self) -> bool {
            self.injected_failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    impl DomainPort for InMemoryLevyStore {}

    #[async_trait]
    impl HealthCheckable for InMemoryLevyStore {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "memory-levy-store".to_string(),
                status: AdapterHealth::Healthy,
                latency_ms: 0,
                message: Some("In-memory store".to_string()),
                checked_at: Utc::now(),
            }
        }
    }

    #[async_trait]
    impl BillLedgerPort for InMemoryLevyStore {
        async fn upsert_postings(
            &self,
            postings: &[BillPosting],
            _metadata: Option<OperationMetadata>,
        ) -> Result<usize, PortError> {
            let mut state = self.state.write().await;
            for posting in postings {
                state.bills.insert(posting.conflict_key(), posting.clone());
            }
            Ok(postings.len())
        }

        async fn postings_for_resident(
            &self,
            resident_id: ResidentId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<BillPosting>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .bills
                .values()
                .rev()
                .filter(|p| p.resident_id == resident_id)
                .cloned()
                .collect())
        }

        async fn postings_for_period(
            &self,
            period: BillingPeriod,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<BillPosting>, PortError> {
            let state = self.state.read().await;
            Ok(state
                .bills
                .values()
                .filter(|p| p.period == period)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl LevyAccountPort for InMemoryLevyStore {
        async fn get_account(
            &self,
            resident_id: ResidentId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<LevyAccount, PortError> {
            self.state
                .read()
                .await
                .accounts
                .get(&resident_id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Resident", resident_id))
        }

        async fn list_accounts(
            &self,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<LevyAccount>, PortError> {
            let state = self.state.read().await;
            let mut accounts: Vec<_> = state.accounts.values().cloned().collect();
            accounts.sort_by(|a, b| a.full_name.cmp(&b.full_name));
            Ok(accounts)
        }

        async fn set_credit_balance(
            &self,
            resident_id: ResidentId,
            value: Decimal,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            let credit = CreditBalance::new(value)
                .map_err(|e| PortError::validation_field(e.to_string(), "credit_balance"))?;
            let mut state = self.state.write().await;
            let account = state
                .accounts
                .get_mut(&resident_id)
                .ok_or_else(|| PortError::not_found("Resident", resident_id))?;
            account.credit_balance = credit;
            Ok(())
        }
    }

    #[async_trait]
    impl LevyStore for InMemoryLevyStore {
        async fn commit_allocation(
            &self,
            commit: &AllocationCommit,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            if self.take_injected_failure() {
                return Err(PortError::connection("injected commit failure"));
            }

            let mut state = self.state.write().await;
            let account = state
                .accounts
                .get_mut(&commit.resident_id)
                .ok_or_else(|| PortError::not_found("Resident", commit.resident_id))?;

            if account.credit_balance != commit.previous_credit {
                return Err(PortError::conflict(format!(
                    "credit balance for {} is {}, expected {}",
                    commit.resident_id, account.credit_balance, commit.previous_credit
                )));
            }
            account.credit_balance = commit.new_credit;

            for posting in &commit.postings {
                state.bills.insert(posting.conflict_key(), posting.clone());
            }
            self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::InMemoryLevyStore;
    use super::*;
    use crate::allocation::{allocate, AllocationRequest, PostingContext};
    use rust_decimal_macros::dec;

    fn account() -> LevyAccount {
        LevyAccount::new(ResidentId::new(), "Ada Obi", dec!(5000)).unwrap()
    }

    fn postings_for(account: &LevyAccount, amount: Decimal, months: &[&str]) -> Vec<BillPosting> {
        let periods = months.iter().map(|m| m.parse().unwrap()).collect();
        let req = AllocationRequest::new(
            amount,
            dec!(0),
            dec!(5000),
            periods,
            PostingContext::new(account.resident_id, "admin"),
        );
        allocate(&req).postings
    }

    #[tokio::test]
    async fn test_upsert_replaces_on_conflict() {
        let account = account();
        let store = InMemoryLevyStore::with_accounts(vec![account.clone()]).await;

        store
            .upsert_postings(&postings_for(&account, dec!(2000), &["2026-02"]), None)
            .await
            .unwrap();
        store
            .upsert_postings(&postings_for(&account, dec!(5000), &["2026-02"]), None)
            .await
            .unwrap();

        let history = store.postings_for_resident(account.resident_id, None).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount_paid, dec!(5000));
    }

    #[tokio::test]
    async fn test_history_is_latest_first() {
        let account = account();
        let store = InMemoryLevyStore::with_accounts(vec![account.clone()]).await;
        store
            .upsert_postings(&postings_for(&account, dec!(15000), &["2026-01", "2026-02", "2026-03"]), None)
            .await
            .unwrap();

        let history = store.postings_for_resident(account.resident_id, None).await.unwrap();
        let periods: Vec<String> = history.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(periods, vec!["2026-03", "2026-02", "2026-01"]);
    }

    #[tokio::test]
    async fn test_commit_requires_previous_balance() {
        let account = account();
        let store = InMemoryLevyStore::with_accounts(vec![account.clone()]).await;

        let commit = AllocationCommit {
            resident_id: account.resident_id,
            previous_credit: CreditBalance::new(dec!(100)).unwrap(),
            new_credit: CreditBalance::zero(),
            postings: postings_for(&account, dec!(5000), &["2026-02"]),
        };
        let err = store.commit_allocation(&commit, None).await.unwrap_err();
        assert!(err.is_conflict());
        assert!(store
            .postings_for_resident(account.resident_id, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures_are_transient() {
        let account = account();
        let store = InMemoryLevyStore::with_accounts(vec![account.clone()]).await;
        store.fail_next_commits(1);

        let commit = AllocationCommit {
            resident_id: account.resident_id,
            previous_credit: CreditBalance::zero(),
            new_credit: CreditBalance::zero(),
            postings: Vec::new(),
        };
        assert!(store.commit_allocation(&commit, None).await.unwrap_err().is_transient());
        assert!(store.commit_allocation(&commit, None).await.is_ok());
        assert_eq!(store.commit_count(), 1);
    }

    #[tokio::test]
    async fn test_negative_credit_rejected() {
        let account = account();
        let store = InMemoryLevyStore::with_accounts(vec![account.clone()]).await;
        let err = store
            .set_credit_balance(account.resident_id, dec!(-1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::Validation { .. }));
    }
}

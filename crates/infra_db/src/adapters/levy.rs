//! PostgreSQL Levy Store
//!
//! Implements the levy domain ports on top of [`ResidentRepository`] and
//! [`BillRepository`].
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::PostgresLevyStore;
//! use domain_levy::{LevyStore, PaymentService};
//! use std::sync::Arc;
//!
//! let store: Arc<dyn LevyStore> = Arc::new(PostgresLevyStore::new(pool));
//! let service = PaymentService::new(store);
//! ```

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, BillingPeriod, DomainPort, HealthCheckResult, HealthCheckable,
    OperationMetadata, PortError, ResidentId,
};
use domain_levy::{
    AllocationCommit, BillLedgerPort, BillPosting, CreditBalance, LevyAccount, LevyAccountPort,
    LevyStore,
};

use crate::error::DatabaseError;
use crate::repositories::{BillRepository, BillRow, NewResident, ResidentRepository, ResidentRow};

/// PostgreSQL-backed [`LevyStore`]
///
/// # Error Handling
///
/// Database errors are translated to `PortError` variants:
/// - `NotFound` -> `PortError::NotFound`
/// - `StaleValue`, `DuplicateEntry` -> `PortError::Conflict`
/// - connection and pool failures -> `PortError::Connection` (retryable)
/// - check constraint violations -> `PortError::Validation`
/// - anything else -> `PortError::Internal`
#[derive(Debug, Clone)]
pub struct PostgresLevyStore {
    residents: ResidentRepository,
    bills: BillRepository,
    pool: PgPool,
}

impl PostgresLevyStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            residents: ResidentRepository::new(pool.clone()),
            bills: BillRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn residents(&self) -> &ResidentRepository {
        &self.residents
    }

    pub fn bills(&self) -> &BillRepository {
        &self.bills
    }

    /// Creates a resident from a domain account
    pub async fn insert_account(&self, account: &LevyAccount) -> Result<(), PortError> {
        self.residents
            .insert(NewResident {
                id: account.resident_id.into(),
                full_name: account.full_name.clone(),
                apartment_unit: account.apartment_unit.clone(),
                monthly_amount: account.amount_due_per_period,
                credit_balance: account.credit_balance.amount(),
            })
            .await
            .map_err(db_to_port_error)?;
        Ok(())
    }
}

impl DomainPort for PostgresLevyStore {}

#[async_trait]
impl HealthCheckable for PostgresLevyStore {
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        let (status, message) = match result {
            Ok(_) => (AdapterHealth::Healthy, None),
            Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
        };

        HealthCheckResult {
            adapter_id: "postgres-levy-store".to_string(),
            status,
            latency_ms,
            message,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl BillLedgerPort for PostgresLevyStore {
    #[instrument(skip(self, postings, _metadata), fields(count = postings.len()))]
    async fn upsert_postings(
        &self,
        postings: &[BillPosting],
        _metadata: Option<OperationMetadata>,
    ) -> Result<usize, PortError> {
        debug!("Upserting bill postings");
        let rows: Vec<BillRow> = postings.iter().map(posting_to_row).collect();
        self.bills.upsert(&rows).await.map_err(db_to_port_error)
    }

    #[instrument(skip(self, _metadata), fields(resident_id = %resident_id))]
    async fn postings_for_resident(
        &self,
        resident_id: ResidentId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<BillPosting>, PortError> {
        debug!("Fetching bill history");
        self.bills
            .for_resident(resident_id.into())
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_posting)
            .collect()
    }

    #[instrument(skip(self, _metadata), fields(period = %period))]
    async fn postings_for_period(
        &self,
        period: BillingPeriod,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<BillPosting>, PortError> {
        debug!("Fetching bills for period");
        self.bills
            .for_month(&period.to_string())
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_posting)
            .collect()
    }
}

#[async_trait]
impl LevyAccountPort for PostgresLevyStore {
    #[instrument(skip(self, _metadata), fields(resident_id = %resident_id))]
    async fn get_account(
        &self,
        resident_id: ResidentId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<LevyAccount, PortError> {
        debug!("Fetching levy account");
        let row = self
            .residents
            .get_by_id(resident_id.into())
            .await
            .map_err(db_to_port_error)?;
        row_to_account(row)
    }

    #[instrument(skip(self, _metadata))]
    async fn list_accounts(
        &self,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<LevyAccount>, PortError> {
        self.residents
            .list()
            .await
            .map_err(db_to_port_error)?
            .into_iter()
            .map(row_to_account)
            .collect()
    }

    #[instrument(skip(self, _metadata), fields(resident_id = %resident_id, value = %value))]
    async fn set_credit_balance(
        &self,
        resident_id: ResidentId,
        value: Decimal,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        if value < Decimal::ZERO {
            return Err(PortError::validation_field(
                format!("credit balance cannot be negative: {}", value),
                "credit_balance",
            ));
        }
        self.residents
            .set_credit_balance(resident_id.into(), value)
            .await
            .map_err(db_to_port_error)
    }
}

#[async_trait]
impl LevyStore for PostgresLevyStore {
    #[instrument(
        skip(self, commit, _metadata),
        fields(resident_id = %commit.resident_id, postings = commit.postings.len())
    )]
    async fn commit_allocation(
        &self,
        commit: &AllocationCommit,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let rows: Vec<BillRow> = commit.postings.iter().map(posting_to_row).collect();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_to_port_error(e.into()))?;

        ResidentRepository::swap_credit_balance(
            &mut *tx,
            commit.resident_id.into(),
            commit.previous_credit.amount(),
            commit.new_credit.amount(),
        )
        .await
        .map_err(db_to_port_error)?;

        BillRepository::upsert_on(&mut *tx, &rows)
            .await
            .map_err(db_to_port_error)?;

        tx.commit().await.map_err(|e| db_to_port_error(e.into()))?;
        debug!("Allocation committed");
        Ok(())
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

/// Converts a database error to a port error
fn db_to_port_error(e: DatabaseError) -> PortError {
    match e {
        DatabaseError::NotFound { entity, id } => PortError::NotFound {
            entity_type: entity,
            id,
        },
        DatabaseError::StaleValue(message) | DatabaseError::DuplicateEntry(message) => {
            PortError::Conflict { message }
        }
        DatabaseError::ConstraintViolation(message) => PortError::Validation {
            message,
            field: None,
        },
        e @ (DatabaseError::ConnectionFailed(_) | DatabaseError::PoolExhausted) => {
            PortError::Connection {
                message: e.to_string(),
                source: Some(Box::new(e)),
            }
        }
        e => PortError::Internal {
            message: e.to_string(),
            source: Some(Box::new(e)),
        },
    }
}

fn posting_to_row(posting: &BillPosting) -> BillRow {
    BillRow {
        resident_id: posting.resident_id.into(),
        month_year: posting.period.to_string(),
        amount_due: posting.amount_due,
        amount_paid: posting.amount_paid,
        credit_applied: posting.credit_applied,
        months_covered: posting.months_covered as i32,
        status: posting.status.as_str().to_string(),
        notes: posting.notes.clone(),
        recorded_by: posting.recorded_by.clone(),
        payment_method: posting.payment_method.as_str().to_string(),
        paid_at: posting.paid_at,
    }
}

fn row_to_posting(row: BillRow) -> Result<BillPosting, PortError> {
    let invalid = |what: &str, detail: String| {
        db_to_port_error(DatabaseError::invalid_row(format!(
            "monthly_bills {} {}: {}",
            row.resident_id, what, detail
        )))
    };

    Ok(BillPosting {
        resident_id: ResidentId::from(row.resident_id),
        period: row
            .month_year
            .parse()
            .map_err(|e: core_kernel::PeriodError| invalid("month_year", e.to_string()))?,
        amount_due: row.amount_due,
        amount_paid: row.amount_paid,
        credit_applied: row.credit_applied,
        months_covered: u32::try_from(row.months_covered)
            .map_err(|e| invalid("months_covered", e.to_string()))?,
        status: row
            .status
            .parse()
            .map_err(|e: domain_levy::LevyError| invalid("status", e.to_string()))?,
        payment_method: row
            .payment_method
            .parse()
            .map_err(|e: domain_levy::LevyError| invalid("payment_method", e.to_string()))?,
        notes: row.notes.clone(),
        recorded_by: row.recorded_by.clone(),
        paid_at: row.paid_at,
    })
}

fn row_to_account(row: ResidentRow) -> Result<LevyAccount, PortError> {
    let credit = CreditBalance::new(row.credit_balance).map_err(|e| {
        db_to_port_error(DatabaseError::invalid_row(format!(
            "residents {}: {}",
            row.id, e
        )))
    })?;

    Ok(LevyAccount {
        resident_id: ResidentId::from(row.id),
        full_name: row.full_name,
        apartment_unit: row.apartment_unit,
        amount_due_per_period: row.monthly_amount,
        credit_balance: credit,
    })
}

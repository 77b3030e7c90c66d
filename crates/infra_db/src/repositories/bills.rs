//! Monthly bill repository
//!
//! One row per `(resident_id, month_year)`. Writes are upserts that replace
//! every column of an existing row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// A row of the `monthly_bills` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct BillRow {
    pub resident_id: Uuid,
    /// `YYYY-MM`
    pub month_year: String,
    pub amount_due: Decimal,
    pub amount_paid: Decimal,
    pub credit_applied: Decimal,
    pub months_covered: i32,
    pub status: String,
    pub notes: String,
    pub recorded_by: String,
    pub payment_method: String,
    pub paid_at: Option<DateTime<Utc>>,
}

const SELECT_BILLS: &str = r#"
    SELECT resident_id, month_year, amount_due, amount_paid, credit_applied,
           months_covered, status, notes, recorded_by, payment_method, paid_at
    FROM monthly_bills
"#;

/// Repository for the `monthly_bills` table
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: PgPool,
}

impl BillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Bills for a resident, latest month first
    pub async fn for_resident(&self, resident_id: Uuid) -> Result<Vec<BillRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "{} WHERE resident_id = $1 ORDER BY month_year DESC",
            SELECT_BILLS
        ))
        .bind(resident_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bills for one month across all residents
    pub async fn for_month(&self, month_year: &str) -> Result<Vec<BillRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, BillRow>(&format!(
            "{} WHERE month_year = $1 ORDER BY resident_id",
            SELECT_BILLS
        ))
        .bind(month_year)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Upserts a batch in its own transaction
    pub async fn upsert(&self, rows: &[BillRow]) -> Result<usize, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let written = Self::upsert_on(&mut *tx, rows).await?;
        tx.commit().await?;
        Ok(written)
    }

    /// Upserts a batch on the caller's connection
    ///
    /// Conflicts on `(resident_id, month_year)` replace the stored row.
    pub async fn upsert_on(conn: &mut PgConnection, rows: &[BillRow]) -> Result<usize, DatabaseError> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO monthly_bills (
                    resident_id, month_year, amount_due, amount_paid, credit_applied,
                    months_covered, status, notes, recorded_by, payment_method, paid_at
                ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                ON CONFLICT (resident_id, month_year) DO UPDATE SET
                    amount_due = EXCLUDED.amount_due,
                    amount_paid = EXCLUDED.amount_paid,
                    credit_applied = EXCLUDED.credit_applied,
                    months_covered = EXCLUDED.months_covered,
                    status = EXCLUDED.status,
                    notes = EXCLUDED.notes,
                    recorded_by = EXCLUDED.recorded_by,
                    payment_method = EXCLUDED.payment_method,
                    paid_at = EXCLUDED.paid_at,
                    updated_at = NOW()
                "#,
            )
            .bind(row.resident_id)
            .bind(&row.month_year)
            .bind(row.amount_due)
            .bind(row.amount_paid)
            .bind(row.credit_applied)
            .bind(row.months_covered)
            .bind(&row.status)
            .bind(&row.notes)
            .bind(&row.recorded_by)
            .bind(&row.payment_method)
            .bind(row.paid_at)
            .execute(&mut *conn)
            .await?;
        }
        Ok(rows.len())
    }
}

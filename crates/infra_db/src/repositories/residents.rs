//! Resident repository
//!
//! Residents carry the monthly levy and the rolling credit balance. The
//! balance column has a `CHECK (credit_balance >= 0)` constraint, so a
//! negative write is rejected by the database as well as by the domain.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::error::DatabaseError;

/// A row of the `residents` table
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ResidentRow {
    pub id: Uuid,
    pub full_name: String,
    pub apartment_unit: Option<String>,
    pub monthly_amount: Decimal,
    pub credit_balance: Decimal,
}

/// Data for inserting a resident
#[derive(Debug, Clone)]
pub struct NewResident {
    pub id: Uuid,
    pub full_name: String,
    pub apartment_unit: Option<String>,
    pub monthly_amount: Decimal,
    pub credit_balance: Decimal,
}

/// Repository for the `residents` table
#[derive(Debug, Clone)]
pub struct ResidentRepository {
    pool: PgPool,
}

impl ResidentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a resident by identifier
    ///
    /// # Errors
    ///
    /// `DatabaseError::NotFound` if no row exists
    pub async fn get_by_id(&self, id: Uuid) -> Result<ResidentRow, DatabaseError> {
        sqlx::query_as::<_, ResidentRow>(
            r#"
            SELECT id, full_name, apartment_unit, monthly_amount, credit_balance
            FROM residents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Resident", id))
    }

    /// Lists all residents ordered by name
    pub async fn list(&self) -> Result<Vec<ResidentRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ResidentRow>(
            r#"
            SELECT id, full_name, apartment_unit, monthly_amount, credit_balance
            FROM residents
            ORDER BY full_name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Inserts a resident
    pub async fn insert(&self, resident: NewResident) -> Result<Uuid, DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO residents (id, full_name, apartment_unit, monthly_amount, credit_balance)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(resident.id)
        .bind(&resident.full_name)
        .bind(&resident.apartment_unit)
        .bind(resident.monthly_amount)
        .bind(resident.credit_balance)
        .execute(&self.pool)
        .await?;
        Ok(resident.id)
    }

    /// Overwrites the credit balance unconditionally
    pub async fn set_credit_balance(&self, id: Uuid, value: Decimal) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE residents
            SET credit_balance = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(value)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Resident", id));
        }
        Ok(())
    }

    /// Replaces the credit balance only if it still equals `previous`
    ///
    /// Runs on the caller's connection so it can join a transaction.
    ///
    /// # Errors
    ///
    /// - `DatabaseError::NotFound` if the resident does not exist
    /// - `DatabaseError::StaleValue` if the stored balance moved
    pub async fn swap_credit_balance(
        conn: &mut PgConnection,
        id: Uuid,
        previous: Decimal,
        next: Decimal,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE residents
            SET credit_balance = $3, updated_at = NOW()
            WHERE id = $1 AND credit_balance = $2
            "#,
        )
        .bind(id)
        .bind(previous)
        .bind(next)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        let stored: Option<Decimal> =
            sqlx::query_scalar("SELECT credit_balance FROM residents WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *conn)
                .await?;

        match stored {
            None => Err(DatabaseError::not_found("Resident", id)),
            Some(stored) => Err(DatabaseError::StaleValue(format!(
                "credit balance for resident {} is {}, expected {}",
                id, stored, previous
            ))),
        }
    }
}

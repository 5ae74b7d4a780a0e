//! # Payment & Split Repositories
//!
//! Database operations for settlement records and the append-only
//! commission split ledger.
//!
//! ## Ledger Discipline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  payments          — one row per appointment in steady state; status   │
//! │                      advances in place (pending → completed/failed,    │
//! │                      completed → refunded)                             │
//! │                                                                         │
//! │  commission_splits — APPEND ONLY. One 'original' per settled           │
//! │                      appointment, at most one 'reversal' after a       │
//! │                      refund. try_insert() races on the unique          │
//! │                      (appointment_id, entry) index: the first caller   │
//! │                      inserts, everyone else observes false and reads   │
//! │                      the winner's row. Rows are never UPDATEd.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use sheba_core::{
    CommissionSplit, Money, Payment, PaymentMethod, PaymentStatus, SplitEntry,
};

// =============================================================================
// Payment Repository
// =============================================================================

/// Repository for payment database operations.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

fn payment_from_row(row: &SqliteRow) -> DbResult<Payment> {
    Ok(Payment {
        id: row.try_get("id")?,
        appointment_id: row.try_get("appointment_id")?,
        amount: Money::from_cents(row.try_get("amount_cents")?),
        method: row
            .try_get::<String, _>("method")?
            .parse::<PaymentMethod>()
            .map_err(DbError::corrupt)?,
        status: row
            .try_get::<String, _>("status")?
            .parse::<PaymentStatus>()
            .map_err(DbError::corrupt)?,
        transaction_id: row.try_get("transaction_id")?,
        paid_at: row.try_get("paid_at")?,
        created_at: row.try_get("created_at")?,
    })
}

impl PaymentRepository {
    /// Creates a new PaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Gets a payment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let row = sqlx::query("SELECT * FROM payments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    /// The payment for an appointment. Steady state is one row; the
    /// earliest wins if storage ever holds more.
    pub async fn by_appointment(&self, appointment_id: &str) -> DbResult<Option<Payment>> {
        let row = sqlx::query(
            "SELECT * FROM payments WHERE appointment_id = ?1 ORDER BY created_at LIMIT 1",
        )
        .bind(appointment_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(payment_from_row).transpose()
    }

    /// Inserts a payment.
    pub async fn insert(&self, payment: &Payment) -> DbResult<()> {
        debug!(
            id = %payment.id,
            appointment_id = %payment.appointment_id,
            amount = %payment.amount,
            "Inserting payment"
        );

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, appointment_id, amount_cents, method, status,
                transaction_id, paid_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.appointment_id)
        .bind(payment.amount.cents())
        .bind(payment.method.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.paid_at)
        .bind(payment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates a payment's settlement status. `paid_at` is only written
    /// when the callback carried one.
    pub async fn update_status(
        &self,
        id: &str,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE payments SET status = ?2, paid_at = COALESCE(?3, paid_at) WHERE id = ?1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(paid_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Payment", id));
        }

        Ok(())
    }
}

// =============================================================================
// Split Repository
// =============================================================================

/// Repository for the commission split ledger.
#[derive(Debug, Clone)]
pub struct SplitRepository {
    pool: SqlitePool,
}

fn split_from_row(row: &SqliteRow) -> DbResult<CommissionSplit> {
    Ok(CommissionSplit {
        id: row.try_get("id")?,
        appointment_id: row.try_get("appointment_id")?,
        staff_id: row.try_get("staff_id")?,
        salon_id: row.try_get("salon_id")?,
        staff_share: Money::from_cents(row.try_get("staff_share_cents")?),
        salon_share: Money::from_cents(row.try_get("salon_share_cents")?),
        platform_share: Money::from_cents(row.try_get("platform_share_cents")?),
        entry: row
            .try_get::<String, _>("entry")?
            .parse::<SplitEntry>()
            .map_err(DbError::corrupt)?,
        created_at: row.try_get("created_at")?,
    })
}

impl SplitRepository {
    /// Creates a new SplitRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SplitRepository { pool }
    }

    /// Inserts a split unless one with the same (appointment, entry kind)
    /// already exists. Returns whether the insert happened.
    ///
    /// The unique (appointment_id, entry) index makes this the
    /// finalize-once compare-and-set: SQLite resolves the race, not
    /// application code.
    pub async fn try_insert(&self, split: &CommissionSplit) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO commission_splits (
                id, appointment_id, staff_id, salon_id,
                staff_share_cents, salon_share_cents, platform_share_cents,
                entry, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(appointment_id, entry) DO NOTHING
            "#,
        )
        .bind(&split.id)
        .bind(&split.appointment_id)
        .bind(&split.staff_id)
        .bind(&split.salon_id)
        .bind(split.staff_share.cents())
        .bind(split.salon_share.cents())
        .bind(split.platform_share.cents())
        .bind(split.entry.as_str())
        .bind(split.created_at)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        if inserted {
            debug!(
                appointment_id = %split.appointment_id,
                entry = %split.entry,
                "Split entry appended"
            );
        }
        Ok(inserted)
    }

    /// All split entries for an appointment, original first.
    pub async fn by_appointment(&self, appointment_id: &str) -> DbResult<Vec<CommissionSplit>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM commission_splits
            WHERE appointment_id = ?1
            ORDER BY CASE entry WHEN 'original' THEN 0 ELSE 1 END
            "#,
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(split_from_row).collect()
    }
}

//! # Appointment Repository
//!
//! Database operations for the central transactional table.
//!
//! ## Appointment Lifecycle (storage view)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Appointment Lifecycle                                 │
//! │                                                                         │
//! │  1. INSERT                                                             │
//! │     └── insert() → row with status 'pending', price snapshot taken     │
//! │                                                                         │
//! │  2. PROGRESS                                                           │
//! │     └── update_status() → guarded single-row UPDATE                    │
//! │                                                                         │
//! │  3. (OPTIONAL) MOVE                                                    │
//! │     └── update_schedule() → new (staff, date, start, end) placement    │
//! │                                                                         │
//! │  The state-machine legality of a status change is the engine's job;    │
//! │  this layer guarantees only per-row atomicity and "row must exist".    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use sheba_core::{Appointment, AppointmentStatus, Money};

/// Repository for appointment database operations.
#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: SqlitePool,
}

fn appointment_from_row(row: &SqliteRow) -> DbResult<Appointment> {
    Ok(Appointment {
        id: row.try_get("id")?,
        salon_id: row.try_get("salon_id")?,
        branch_id: row.try_get("branch_id")?,
        client_id: row.try_get("client_id")?,
        staff_id: row.try_get("staff_id")?,
        service_id: row.try_get("service_id")?,
        status: row
            .try_get::<String, _>("status")?
            .parse::<AppointmentStatus>()
            .map_err(DbError::corrupt)?,
        appointment_date: row.try_get("appointment_date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        total_price: Money::from_cents(row.try_get("total_price_cents")?),
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl AppointmentRepository {
    /// Creates a new AppointmentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AppointmentRepository { pool }
    }

    /// Gets an appointment by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Appointment>> {
        let row = sqlx::query("SELECT * FROM appointments WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(appointment_from_row).transpose()
    }

    /// Appointments for one staff member with dates in `[from, to]`,
    /// ordered by (date, start). Hydrates the availability index.
    pub async fn by_staff_in_range(
        &self,
        staff_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM appointments
            WHERE staff_id = ?1 AND appointment_date BETWEEN ?2 AND ?3
            ORDER BY appointment_date, start_time
            "#,
        )
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(appointment_from_row).collect()
    }

    /// Appointments for one salon with dates in `[from, to]`, ordered by
    /// (date, start). Feeds the analytics windows.
    pub async fn by_salon_in_range(
        &self,
        salon_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<Appointment>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM appointments
            WHERE salon_id = ?1 AND appointment_date BETWEEN ?2 AND ?3
            ORDER BY appointment_date, start_time
            "#,
        )
        .bind(salon_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(appointment_from_row).collect()
    }

    /// Inserts an appointment.
    pub async fn insert(&self, appointment: &Appointment) -> DbResult<()> {
        debug!(
            id = %appointment.id,
            staff_id = %appointment.staff_id,
            date = %appointment.appointment_date,
            "Inserting appointment"
        );

        sqlx::query(
            r#"
            INSERT INTO appointments (
                id, salon_id, branch_id, client_id, staff_id, service_id,
                status, appointment_date, start_time, end_time,
                total_price_cents, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&appointment.id)
        .bind(&appointment.salon_id)
        .bind(&appointment.branch_id)
        .bind(&appointment.client_id)
        .bind(&appointment.staff_id)
        .bind(&appointment.service_id)
        .bind(appointment.status.as_str())
        .bind(appointment.appointment_date)
        .bind(appointment.start_time)
        .bind(appointment.end_time)
        .bind(appointment.total_price.cents())
        .bind(&appointment.notes)
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an appointment's status.
    pub async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE appointments SET status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }

        Ok(())
    }

    /// Commits a reschedule: new placement, possibly a new staff member.
    #[allow(clippy::too_many_arguments)]
    pub async fn update_schedule(
        &self,
        id: &str,
        staff_id: &str,
        branch_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE appointments SET
                staff_id = ?2,
                branch_id = ?3,
                appointment_date = ?4,
                start_time = ?5,
                end_time = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(staff_id)
        .bind(branch_id)
        .bind(date)
        .bind(start)
        .bind(end)
        .bind(updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }

        Ok(())
    }
}

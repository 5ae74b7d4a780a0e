//! # Repository Module
//!
//! Database repository implementations for Sheba Salon, plus the
//! `SalonStore` trait implementation that plugs SQLite into the engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  sheba-engine (BookingEngine / PaymentReconciler / ReportingService)   │
//! │       │                                                                 │
//! │       │  store.appointment(id)            (SalonStore trait)           │
//! │       ▼                                                                 │
//! │  impl SalonStore for Database  ← this module                           │
//! │       │                                                                 │
//! │       │  db.appointments().get_by_id(id)                               │
//! │       ▼                                                                 │
//! │  AppointmentRepository                                                 │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  DbError is mapped to StoreError at the trait boundary, so the         │
//! │  engine never sees a backend-specific type.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`catalog::CatalogRepository`] - Users, salons, branches, staff, services
//! - [`appointment::AppointmentRepository`] - The transactional ledger
//! - [`payment::PaymentRepository`] / [`payment::SplitRepository`] -
//!   Settlement records and the append-only split ledger

pub mod appointment;
pub mod catalog;
pub mod payment;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use sheba_core::{
    Appointment, AppointmentStatus, Branch, CommissionSplit, Payment, PaymentStatus, Salon,
    Service, Staff, User,
};
use sheba_engine::{SalonStore, StoreError, StoreResult};

use crate::error::DbError;
use crate::pool::Database;

/// Catch-all mapping for failures with no store-level category.
fn backend(err: DbError) -> StoreError {
    StoreError::Backend(err.to_string())
}

// =============================================================================
// SalonStore Implementation
// =============================================================================

#[async_trait]
impl SalonStore for Database {
    async fn salon(&self, id: &str) -> StoreResult<Option<Salon>> {
        self.catalog().salon(id).await.map_err(backend)
    }

    async fn branch(&self, id: &str) -> StoreResult<Option<Branch>> {
        self.catalog().branch(id).await.map_err(backend)
    }

    async fn staff_member(&self, id: &str) -> StoreResult<Option<Staff>> {
        self.catalog().staff_member(id).await.map_err(backend)
    }

    async fn service(&self, id: &str) -> StoreResult<Option<Service>> {
        self.catalog().service(id).await.map_err(backend)
    }

    async fn user(&self, id: &str) -> StoreResult<Option<User>> {
        self.catalog().user(id).await.map_err(backend)
    }

    async fn staff_by_salon(&self, salon_id: &str) -> StoreResult<Vec<Staff>> {
        self.catalog().staff_by_salon(salon_id).await.map_err(backend)
    }

    async fn services_by_salon(&self, salon_id: &str) -> StoreResult<Vec<Service>> {
        self.catalog()
            .services_by_salon(salon_id)
            .await
            .map_err(backend)
    }

    async fn appointment(&self, id: &str) -> StoreResult<Option<Appointment>> {
        self.appointments().get_by_id(id).await.map_err(backend)
    }

    async fn appointments_by_staff_in_range(
        &self,
        staff_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        self.appointments()
            .by_staff_in_range(staff_id, from, to)
            .await
            .map_err(backend)
    }

    async fn appointments_in_range(
        &self,
        salon_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        self.appointments()
            .by_salon_in_range(salon_id, from, to)
            .await
            .map_err(backend)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        match self.appointments().insert(appointment).await {
            Err(DbError::UniqueViolation { .. }) => Err(StoreError::Duplicate {
                entity: "Appointment",
                id: appointment.id.clone(),
            }),
            other => other.map_err(backend),
        }
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        match self.appointments().update_status(id, status, updated_at).await {
            Err(DbError::NotFound { .. }) => Err(StoreError::NotFound {
                entity: "Appointment",
                id: id.to_string(),
            }),
            other => other.map_err(backend),
        }
    }

    async fn update_appointment_schedule(
        &self,
        id: &str,
        staff_id: &str,
        branch_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        match self
            .appointments()
            .update_schedule(id, staff_id, branch_id, date, start, end, updated_at)
            .await
        {
            Err(DbError::NotFound { .. }) => Err(StoreError::NotFound {
                entity: "Appointment",
                id: id.to_string(),
            }),
            other => other.map_err(backend),
        }
    }

    async fn payment(&self, id: &str) -> StoreResult<Option<Payment>> {
        self.payments().get_by_id(id).await.map_err(backend)
    }

    async fn payment_by_appointment(&self, appointment_id: &str) -> StoreResult<Option<Payment>> {
        self.payments()
            .by_appointment(appointment_id)
            .await
            .map_err(backend)
    }

    async fn insert_payment(&self, payment: &Payment) -> StoreResult<()> {
        match self.payments().insert(payment).await {
            Err(DbError::UniqueViolation { .. }) => Err(StoreError::Duplicate {
                entity: "Payment",
                id: payment.id.clone(),
            }),
            other => other.map_err(backend),
        }
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        match self.payments().update_status(id, status, paid_at).await {
            Err(DbError::NotFound { .. }) => Err(StoreError::NotFound {
                entity: "Payment",
                id: id.to_string(),
            }),
            other => other.map_err(backend),
        }
    }

    async fn try_insert_split(&self, split: &CommissionSplit) -> StoreResult<bool> {
        self.splits().try_insert(split).await.map_err(backend)
    }

    async fn splits_by_appointment(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Vec<CommissionSplit>> {
        self.splits()
            .by_appointment(appointment_id)
            .await
            .map_err(backend)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

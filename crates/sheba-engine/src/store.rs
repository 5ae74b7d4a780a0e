//! # Persistence Boundary
//!
//! The `SalonStore` trait is the engine's only view of storage. Concrete
//! backends (SQLite in `sheba-db`, the in-memory store below) implement it;
//! the engine is constructed over `Arc<dyn SalonStore>` and stays pure of
//! storage technology.
//!
//! ## Contract
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         SalonStore                                      │
//! │                                                                         │
//! │  • Each write is atomic per single entity (no torn records).            │
//! │  • Reads may be slightly stale relative to concurrent writers;          │
//! │    read atomicity is per entity, never across the whole ledger.         │
//! │  • try_insert_split is the finalize-once compare-and-set: the first     │
//! │    caller inserts and wins; later callers observe `false` and read      │
//! │    the persisted row instead of recomputing.                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::collections::HashMap;

use tokio::sync::RwLock;

use sheba_core::{
    Appointment, AppointmentStatus, Branch, CommissionSplit, Payment, PaymentStatus, Salon,
    Service, SplitEntry, Staff, User,
};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Store Trait
// =============================================================================

/// CRUD surface the engine requires, keyed by opaque string ids.
#[async_trait]
pub trait SalonStore: Send + Sync {
    // ---- catalog reads ------------------------------------------------------

    async fn salon(&self, id: &str) -> StoreResult<Option<Salon>>;
    async fn branch(&self, id: &str) -> StoreResult<Option<Branch>>;
    async fn staff_member(&self, id: &str) -> StoreResult<Option<Staff>>;
    async fn service(&self, id: &str) -> StoreResult<Option<Service>>;
    async fn user(&self, id: &str) -> StoreResult<Option<User>>;

    /// All staff of a salon (for reporting name resolution).
    async fn staff_by_salon(&self, salon_id: &str) -> StoreResult<Vec<Staff>>;

    /// All services of a salon (for reporting name resolution).
    async fn services_by_salon(&self, salon_id: &str) -> StoreResult<Vec<Service>>;

    // ---- appointments -------------------------------------------------------

    async fn appointment(&self, id: &str) -> StoreResult<Option<Appointment>>;

    /// Appointments for one staff member with dates in `[from, to]`,
    /// ordered by (date, start). Used to hydrate the availability index.
    async fn appointments_by_staff_in_range(
        &self,
        staff_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Appointment>>;

    /// Appointments for one salon with dates in `[from, to]`, ordered by
    /// (date, start). Used by analytics windows.
    async fn appointments_in_range(
        &self,
        salon_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Appointment>>;

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()>;

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Commits a reschedule: new placement, possibly a new staff member.
    #[allow(clippy::too_many_arguments)]
    async fn update_appointment_schedule(
        &self,
        id: &str,
        staff_id: &str,
        branch_id: &str,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    // ---- payments -----------------------------------------------------------

    async fn payment(&self, id: &str) -> StoreResult<Option<Payment>>;

    /// Steady state is one payment per appointment; the earliest row wins
    /// if storage ever holds more.
    async fn payment_by_appointment(&self, appointment_id: &str) -> StoreResult<Option<Payment>>;

    async fn insert_payment(&self, payment: &Payment) -> StoreResult<()>;

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()>;

    // ---- commission splits --------------------------------------------------

    /// Inserts a split unless one with the same (appointment, entry kind)
    /// already exists. Returns whether the insert happened — the
    /// finalize-once guard.
    async fn try_insert_split(&self, split: &CommissionSplit) -> StoreResult<bool>;

    /// All split entries for an appointment, original first.
    async fn splits_by_appointment(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Vec<CommissionSplit>>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

#[derive(Debug, Default)]
struct Tables {
    salons: HashMap<String, Salon>,
    branches: HashMap<String, Branch>,
    staff: HashMap<String, Staff>,
    services: HashMap<String, Service>,
    users: HashMap<String, User>,
    appointments: HashMap<String, Appointment>,
    payments: HashMap<String, Payment>,
    splits: Vec<CommissionSplit>,
}

/// Reference `SalonStore` over tokio-guarded maps.
///
/// Used by engine unit tests and small deployments; `sheba-db` provides
/// the durable SQLite implementation behind the same trait.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    // Catalog writes are a test/seeding concern, so they live on the
    // concrete type rather than the engine-facing trait.

    pub async fn put_salon(&self, salon: Salon) {
        self.inner.write().await.salons.insert(salon.id.clone(), salon);
    }

    pub async fn put_branch(&self, branch: Branch) {
        self.inner
            .write()
            .await
            .branches
            .insert(branch.id.clone(), branch);
    }

    pub async fn put_staff(&self, staff: Staff) {
        self.inner.write().await.staff.insert(staff.id.clone(), staff);
    }

    pub async fn put_service(&self, service: Service) {
        self.inner
            .write()
            .await
            .services
            .insert(service.id.clone(), service);
    }

    pub async fn put_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id.clone(), user);
    }
}

#[async_trait]
impl SalonStore for InMemoryStore {
    async fn salon(&self, id: &str) -> StoreResult<Option<Salon>> {
        Ok(self.inner.read().await.salons.get(id).cloned())
    }

    async fn branch(&self, id: &str) -> StoreResult<Option<Branch>> {
        Ok(self.inner.read().await.branches.get(id).cloned())
    }

    async fn staff_member(&self, id: &str) -> StoreResult<Option<Staff>> {
        Ok(self.inner.read().await.staff.get(id).cloned())
    }

    async fn service(&self, id: &str) -> StoreResult<Option<Service>> {
        Ok(self.inner.read().await.services.get(id).cloned())
    }

    async fn user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn staff_by_salon(&self, salon_id: &str) -> StoreResult<Vec<Staff>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<Staff> = tables
            .staff
            .values()
            .filter(|s| s.salon_id == salon_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn services_by_salon(&self, salon_id: &str) -> StoreResult<Vec<Service>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<Service> = tables
            .services
            .values()
            .filter(|s| s.salon_id == salon_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn appointment(&self, id: &str) -> StoreResult<Option<Appointment>> {
        Ok(self.inner.read().await.appointments.get(id).cloned())
    }

    async fn appointments_by_staff_in_range(
        &self,
        staff_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| {
                a.staff_id == staff_id && from <= a.appointment_date && a.appointment_date <= to
            })
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.appointment_date, a.start_time));
        Ok(rows)
    }

    async fn appointments_in_range(
        &self,
        salon_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Appointment>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<Appointment> = tables
            .appointments
            .values()
            .filter(|a| {
                a.salon_id == salon_id && from <= a.appointment_date && a.appointment_date <= to
            })
            .cloned()
            .collect();
        rows.sort_by_key(|a| (a.appointment_date, a.start_time));
        Ok(rows)
    }

    async fn insert_appointment(&self, appointment: &Appointment) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        if tables.appointments.contains_key(&appointment.id) {
            return Err(StoreError::Duplicate {
                entity: "Appointment",
                id: appointment.id.clone(),
            });
        }
        tables
            .appointments
            .insert(appointment.id.clone(), appointment.clone());
        Ok(())
    }

    async fn update_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
        updated_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        let appointment = tables
            .appointments
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Appointment",
                id: id.to_string(),
            })?;
        appointment.status = status;
        appointment.updated_at = updated_at;
        Ok(())
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
        let mut tables = self.inner.write().await;
        let appointment = tables
            .appointments
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Appointment",
                id: id.to_string(),
            })?;
        appointment.staff_id = staff_id.to_string();
        appointment.branch_id = branch_id.to_string();
        appointment.appointment_date = date;
        appointment.start_time = start;
        appointment.end_time = end;
        appointment.updated_at = updated_at;
        Ok(())
    }

    async fn payment(&self, id: &str) -> StoreResult<Option<Payment>> {
        Ok(self.inner.read().await.payments.get(id).cloned())
    }

    async fn payment_by_appointment(&self, appointment_id: &str) -> StoreResult<Option<Payment>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<&Payment> = tables
            .payments
            .values()
            .filter(|p| p.appointment_id == appointment_id)
            .collect();
        rows.sort_by_key(|p| p.created_at);
        Ok(rows.first().map(|p| (*p).clone()))
    }

    async fn insert_payment(&self, payment: &Payment) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        if tables.payments.contains_key(&payment.id) {
            return Err(StoreError::Duplicate {
                entity: "Payment",
                id: payment.id.clone(),
            });
        }
        tables.payments.insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
        paid_at: Option<DateTime<Utc>>,
    ) -> StoreResult<()> {
        let mut tables = self.inner.write().await;
        let payment = tables
            .payments
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Payment",
                id: id.to_string(),
            })?;
        payment.status = status;
        if paid_at.is_some() {
            payment.paid_at = paid_at;
        }
        Ok(())
    }

    async fn try_insert_split(&self, split: &CommissionSplit) -> StoreResult<bool> {
        let mut tables = self.inner.write().await;
        // One original and at most one reversal per appointment; the
        // check-and-insert happens under a single write lock, making this
        // the compare-and-set the finalize path relies on.
        let exists = tables
            .splits
            .iter()
            .any(|s| s.appointment_id == split.appointment_id && s.entry == split.entry);
        if exists {
            return Ok(false);
        }
        tables.splits.push(split.clone());
        Ok(true)
    }

    async fn splits_by_appointment(
        &self,
        appointment_id: &str,
    ) -> StoreResult<Vec<CommissionSplit>> {
        let tables = self.inner.read().await;
        let mut rows: Vec<CommissionSplit> = tables
            .splits
            .iter()
            .filter(|s| s.appointment_id == appointment_id)
            .cloned()
            .collect();
        rows.sort_by_key(|s| match s.entry {
            SplitEntry::Original => 0,
            SplitEntry::Reversal => 1,
        });
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sheba_core::Money;

    fn split(appointment_id: &str, entry: SplitEntry) -> CommissionSplit {
        CommissionSplit {
            id: uuid::Uuid::new_v4().to_string(),
            appointment_id: appointment_id.to_string(),
            staff_id: "staff-1".to_string(),
            salon_id: "salon-1".to_string(),
            staff_share: Money::from_cents(3000),
            salon_share: Money::from_cents(6500),
            platform_share: Money::from_cents(500),
            entry,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_try_insert_split_is_finalize_once() {
        let store = InMemoryStore::new();

        assert!(store
            .try_insert_split(&split("appt-1", SplitEntry::Original))
            .await
            .unwrap());
        // Second original for the same appointment loses the race
        assert!(!store
            .try_insert_split(&split("appt-1", SplitEntry::Original))
            .await
            .unwrap());
        // A reversal is a distinct entry kind and still goes in once
        assert!(store
            .try_insert_split(&split("appt-1", SplitEntry::Reversal))
            .await
            .unwrap());
        assert!(!store
            .try_insert_split(&split("appt-1", SplitEntry::Reversal))
            .await
            .unwrap());

        let rows = store.splits_by_appointment("appt-1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].entry, SplitEntry::Original);
        assert_eq!(rows[1].entry, SplitEntry::Reversal);
    }

    #[tokio::test]
    async fn test_update_missing_appointment_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update_appointment_status("ghost", AppointmentStatus::Confirmed, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }
}

//! # Booking Engine
//!
//! Validates and commits appointment state transitions, enforcing the
//! scheduling invariants via the availability index.
//!
//! ## Booking Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Booking Lifecycle                                   │
//! │                                                                         │
//! │  1. BOOK                                                               │
//! │     └── book() → validate links → lock staff → index check-and-insert  │
//! │                → Appointment { status: Pending }                        │
//! │                                                                         │
//! │  2. PROGRESS                                                           │
//! │     └── transition() → pending → confirmed → in_progress → completed   │
//! │                                                                         │
//! │  3. (OPTIONAL) DIVERT                                                  │
//! │     └── transition(cancelled | no_show) → index entry removed,          │
//! │         slot free for rebooking                                        │
//! │                                                                         │
//! │  4. (OPTIONAL) RESCHEDULE                                              │
//! │     └── reschedule() → atomic swap: old slot out, new slot in,         │
//! │         full rollback when either half fails                           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Index Ownership
//! The engine owns the availability index and hydrates it lazily, one
//! (staff, date) page at a time, from the store. Hydration and every
//! mutation happen under that staff member's keyed mutex, so
//! check-and-insert sequences never interleave for the same staff.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

use sheba_core::{
    validation, Appointment, AppointmentStatus, AvailabilityIndex, CoreError, Slot,
    ValidationError,
};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::locks::StaffLocks;
use crate::store::SalonStore;

// =============================================================================
// Requests
// =============================================================================

/// A booking request as it arrives from the caller.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub salon_id: String,
    pub branch_id: String,
    pub client_id: String,
    pub staff_id: String,
    pub service_id: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Overrides `start + service.duration`. Re-validated for overlap like
    /// any other interval.
    pub end_time: Option<NaiveTime>,
    pub notes: Option<String>,
}

/// A reschedule request: new placement for an existing appointment.
#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    /// Hand the appointment to a different staff member. `None` keeps the
    /// current one.
    pub staff_id: Option<String>,
    /// End-time override; otherwise the service duration applies.
    pub end_time: Option<NaiveTime>,
}

// =============================================================================
// Booking Engine
// =============================================================================

/// The scheduling core: availability index + per-staff serialization over
/// an injected store.
pub struct BookingEngine {
    store: Arc<dyn SalonStore>,
    config: EngineConfig,
    index: RwLock<AvailabilityIndex>,
    /// (staff, date) pages already loaded from the store.
    hydrated: Mutex<HashSet<(String, NaiveDate)>>,
    locks: StaffLocks,
}

impl BookingEngine {
    /// Creates an engine over a store. The index starts empty and fills
    /// lazily as dates are touched.
    pub fn new(store: Arc<dyn SalonStore>, config: EngineConfig) -> Self {
        BookingEngine {
            store,
            config,
            index: RwLock::new(AvailabilityIndex::new()),
            hydrated: Mutex::new(HashSet::new()),
            locks: StaffLocks::new(),
        }
    }

    /// Books an appointment in `pending` status.
    ///
    /// ## Failure Modes
    /// - `Validation` — broken ownership links or inactive entities,
    ///   rejected before any mutation
    /// - `InvalidInterval` — backwards/zero-length slot
    /// - `SlotConflict` — carries the colliding appointment id; no
    ///   alternative is auto-suggested (callers use [`next_free`])
    ///
    /// [`next_free`]: BookingEngine::next_free
    pub async fn book(&self, request: BookingRequest) -> EngineResult<Appointment> {
        if request.client_id.trim().is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "client_id".to_string(),
            })
            .into());
        }

        let salon = self
            .store
            .salon(&request.salon_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Salon", &request.salon_id))?;
        let branch = self
            .store
            .branch(&request.branch_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Branch", &request.branch_id))?;
        let staff = self
            .store
            .staff_member(&request.staff_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Staff", &request.staff_id))?;
        let service = self
            .store
            .service(&request.service_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Service", &request.service_id))?;

        validation::validate_branch_bookable(&branch, &salon).map_err(CoreError::from)?;
        validation::validate_staff_bookable(&staff, &salon, &branch.id)
            .map_err(CoreError::from)?;
        validation::validate_service_bookable(&service, &salon).map_err(CoreError::from)?;

        let slot = match request.end_time {
            Some(end) => Slot::new(
                request.date,
                request.start_time,
                end,
                &request.staff_id,
                &request.branch_id,
            )?,
            None => Slot::with_duration(
                request.date,
                request.start_time,
                service.duration_minutes,
                &request.staff_id,
                &request.branch_id,
            )?,
        };

        let appointment_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let appointment = Appointment {
            id: appointment_id.clone(),
            salon_id: request.salon_id,
            branch_id: request.branch_id,
            client_id: request.client_id,
            staff_id: request.staff_id.clone(),
            service_id: request.service_id,
            status: AppointmentStatus::Pending,
            appointment_date: slot.date,
            start_time: slot.start,
            end_time: slot.end,
            // Price snapshot: later service price changes never alter this
            total_price: service.price,
            notes: request.notes,
            created_at: now,
            updated_at: now,
        };

        // Serialize all check-and-insert work for this staff member
        let _guard = self.locks.acquire(&request.staff_id).await;
        self.ensure_hydrated(&request.staff_id, slot.date).await?;

        {
            let mut index = self.index.write().await;
            index.insert(slot.clone(), &appointment_id)?;
        }

        if let Err(err) = self.store.insert_appointment(&appointment).await {
            // The store write failed after the index mutation: roll the
            // slot back so the failure leaves no trace
            let mut index = self.index.write().await;
            index.remove(&appointment.staff_id, slot.date, slot.start);
            return Err(err.into());
        }

        info!(
            appointment_id = %appointment.id,
            staff_id = %appointment.staff_id,
            date = %appointment.appointment_date,
            start = %appointment.start_time,
            "Appointment booked"
        );
        Ok(appointment)
    }

    /// Advances an appointment through the state machine.
    ///
    /// Entering `cancelled` or `no_show` removes the interval from the
    /// availability index, freeing the slot for rebooking. Entering
    /// `completed` is the trigger the payment reconciler checks.
    pub async fn transition(
        &self,
        appointment_id: &str,
        to: AppointmentStatus,
    ) -> EngineResult<Appointment> {
        let probe = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", appointment_id))?;

        let _guard = self.locks.acquire(&probe.staff_id).await;

        // Re-read under the lock: the status may have moved while we waited
        let mut appointment = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", appointment_id))?;

        if !appointment.status.can_transition(to) {
            return Err(CoreError::IllegalTransition {
                appointment_id: appointment_id.to_string(),
                from: appointment.status,
                to,
            }
            .into());
        }

        // No-show additionally requires the booked time to have passed
        // without check-in
        if to == AppointmentStatus::NoShow && appointment.end_instant() > Utc::now() {
            return Err(CoreError::IllegalTransition {
                appointment_id: appointment_id.to_string(),
                from: appointment.status,
                to,
            }
            .into());
        }

        let now = Utc::now();
        self.store
            .update_appointment_status(appointment_id, to, now)
            .await?;

        if !to.holds_slot() {
            let mut index = self.index.write().await;
            index.remove(
                &appointment.staff_id,
                appointment.appointment_date,
                appointment.start_time,
            );
            debug!(
                appointment_id = %appointment_id,
                status = %to,
                "Slot released"
            );
        }

        info!(appointment_id = %appointment_id, from = %appointment.status, to = %to, "Appointment transitioned");
        appointment.status = to;
        appointment.updated_at = now;
        Ok(appointment)
    }

    /// Moves an appointment to a new date/time and optionally a new staff
    /// member, as an atomic swap.
    ///
    /// The old interval is vacated and the new one checked-and-inserted
    /// under the staff lock(s); any failure — conflict or store error —
    /// restores the old interval before returning. The index is never left
    /// with the old slot freed and the new slot unbooked.
    pub async fn reschedule(
        &self,
        appointment_id: &str,
        request: RescheduleRequest,
    ) -> EngineResult<Appointment> {
        let probe = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", appointment_id))?;

        let target_staff_id = request
            .staff_id
            .clone()
            .unwrap_or_else(|| probe.staff_id.clone());

        let (_first, _second) = self
            .locks
            .acquire_pair(&probe.staff_id, &target_staff_id)
            .await;

        let mut appointment = self
            .store
            .appointment(appointment_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", appointment_id))?;

        // Only open bookings move; started or closed ones keep their slot
        if !matches!(
            appointment.status,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        ) {
            return Err(EngineError::NotReschedulable {
                appointment_id: appointment_id.to_string(),
                status: appointment.status,
            });
        }

        let salon = self
            .store
            .salon(&appointment.salon_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Salon", &appointment.salon_id))?;
        let service = self
            .store
            .service(&appointment.service_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Service", &appointment.service_id))?;

        if target_staff_id != appointment.staff_id {
            let staff = self
                .store
                .staff_member(&target_staff_id)
                .await?
                .ok_or_else(|| EngineError::not_found("Staff", &target_staff_id))?;
            validation::validate_staff_bookable(&staff, &salon, &appointment.branch_id)
                .map_err(CoreError::from)?;
        }

        let new_slot = match request.end_time {
            Some(end) => Slot::new(
                request.date,
                request.start_time,
                end,
                &target_staff_id,
                &appointment.branch_id,
            )?,
            None => Slot::with_duration(
                request.date,
                request.start_time,
                service.duration_minutes,
                &target_staff_id,
                &appointment.branch_id,
            )?,
        };

        self.ensure_hydrated(&appointment.staff_id, appointment.appointment_date)
            .await?;
        self.ensure_hydrated(&target_staff_id, new_slot.date).await?;

        // Swap inside one index guard: vacate the old interval first so a
        // same-staff move can overlap its own previous time
        let old_entry = {
            let mut index = self.index.write().await;
            let old_entry = index.remove(
                &appointment.staff_id,
                appointment.appointment_date,
                appointment.start_time,
            );

            if let Err(err) = index.insert(new_slot.clone(), appointment_id) {
                if let Some(entry) = old_entry {
                    // Cannot conflict: the interval was vacated moments ago
                    // under the same locks
                    let _ = index.insert(entry.slot, entry.appointment_id);
                }
                return Err(err.into());
            }
            old_entry
        };

        let now = Utc::now();
        if let Err(err) = self
            .store
            .update_appointment_schedule(
                appointment_id,
                &target_staff_id,
                &appointment.branch_id,
                new_slot.date,
                new_slot.start,
                new_slot.end,
                now,
            )
            .await
        {
            let mut index = self.index.write().await;
            index.remove(&target_staff_id, new_slot.date, new_slot.start);
            if let Some(entry) = old_entry {
                let _ = index.insert(entry.slot, entry.appointment_id);
            }
            return Err(err.into());
        }

        info!(
            appointment_id = %appointment_id,
            staff_id = %target_staff_id,
            date = %new_slot.date,
            start = %new_slot.start,
            "Appointment rescheduled"
        );

        appointment.staff_id = target_staff_id;
        appointment.appointment_date = new_slot.date;
        appointment.start_time = new_slot.start;
        appointment.end_time = new_slot.end;
        appointment.updated_at = now;
        Ok(appointment)
    }

    /// Earliest free slot of the given width for a staff member within the
    /// configured working hours.
    pub async fn next_free(
        &self,
        staff_id: &str,
        branch_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
    ) -> EngineResult<Slot> {
        let _guard = self.locks.acquire(staff_id).await;
        self.ensure_hydrated(staff_id, date).await?;

        let index = self.index.read().await;
        let hours = self.config.working_hours();
        Ok(index.next_free(staff_id, branch_id, date, duration_minutes, &hours)?)
    }

    /// Loads one (staff, date) page of active appointments from the store
    /// into the index. Caller holds the staff lock.
    async fn ensure_hydrated(&self, staff_id: &str, date: NaiveDate) -> EngineResult<()> {
        let key = (staff_id.to_string(), date);
        {
            let hydrated = self.hydrated.lock().await;
            if hydrated.contains(&key) {
                return Ok(());
            }
        }

        let rows = self
            .store
            .appointments_by_staff_in_range(staff_id, date, date)
            .await?;

        let mut hydrated = self.hydrated.lock().await;
        if hydrated.contains(&key) {
            return Ok(());
        }

        let mut index = self.index.write().await;
        for appointment in rows.iter().filter(|a| a.status.holds_slot()) {
            let loaded = Slot::new(
                appointment.appointment_date,
                appointment.start_time,
                appointment.end_time,
                &appointment.staff_id,
                &appointment.branch_id,
            )
            .and_then(|slot| index.insert(slot, &appointment.id));

            if let Err(err) = loaded {
                // Stored data violating the interval invariants is a bug
                // upstream; surface it but keep serving the rest of the day
                warn!(
                    appointment_id = %appointment.id,
                    error = %err,
                    "Skipped unloadable appointment during hydration"
                );
            }
        }
        hydrated.insert(key);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::{Days, NaiveDate, NaiveTime};
    use sheba_core::{
        CommissionRule, Money, Rate, Salon, SalonSize, SalonType, Service, Staff, StaffRole,
    };

    fn date() -> NaiveDate {
        // Far enough in the future that no-show eligibility stays false
        Utc::now()
            .date_naive()
            .checked_add_days(Days::new(30))
            .unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn salon() -> Salon {
        Salon {
            id: "salon-1".to_string(),
            name: "Zemen Beauty".to_string(),
            description: None,
            owner_id: "user-owner".to_string(),
            phone: "+251911000000".to_string(),
            email: "hello@zemen.example".to_string(),
            address: "Bole Road".to_string(),
            city: "Addis Ababa".to_string(),
            country: "Ethiopia".to_string(),
            salon_type: SalonType::Beauty,
            size: SalonSize::Medium,
            commission_rate: Rate::from_bps(4000),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn branch(id: &str) -> sheba_core::Branch {
        sheba_core::Branch {
            id: id.to_string(),
            salon_id: "salon-1".to_string(),
            name: "Main".to_string(),
            address: "Bole Road".to_string(),
            phone: "+251911000001".to_string(),
            email: None,
            is_main_branch: true,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    fn staff(id: &str) -> Staff {
        Staff {
            id: id.to_string(),
            user_id: format!("user-{id}"),
            salon_id: "salon-1".to_string(),
            branch_id: None,
            role: StaffRole::Stylist,
            specialization: None,
            commission_percentage: Rate::from_bps(4000),
            is_active: true,
            hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn service(id: &str, duration: u32, price_cents: i64) -> Service {
        Service {
            id: id.to_string(),
            salon_id: "salon-1".to_string(),
            category_id: "cat-1".to_string(),
            name: "Haircut".to_string(),
            description: None,
            duration_minutes: duration,
            price: Money::from_cents(price_cents),
            commission: CommissionRule::Percentage(Rate::from_bps(3000)),
            is_active: true,
            created_at: Utc::now(),
        }
    }

    async fn engine() -> (Arc<InMemoryStore>, BookingEngine) {
        let store = Arc::new(InMemoryStore::new());
        store.put_salon(salon()).await;
        store.put_branch(branch("branch-1")).await;
        store.put_staff(staff("staff-1")).await;
        store.put_staff(staff("staff-2")).await;
        store.put_service(service("service-30", 30, 45000)).await;

        let engine = BookingEngine::new(store.clone(), EngineConfig::default());
        (store, engine)
    }

    fn request(staff_id: &str, start: NaiveTime) -> BookingRequest {
        BookingRequest {
            salon_id: "salon-1".to_string(),
            branch_id: "branch-1".to_string(),
            client_id: "client-1".to_string(),
            staff_id: staff_id.to_string(),
            service_id: "service-30".to_string(),
            date: date(),
            start_time: start,
            end_time: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_book_creates_pending_with_price_snapshot() {
        let (store, engine) = engine().await;

        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        assert_eq!(appointment.status, AppointmentStatus::Pending);
        assert_eq!(appointment.start_time, t(10, 0));
        assert_eq!(appointment.end_time, t(10, 30)); // 30-minute service
        assert_eq!(appointment.total_price.cents(), 45000);

        let stored = store.appointment(&appointment.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Pending);

        // Price changes after booking never touch the snapshot
        store.put_service(service("service-30", 30, 99000)).await;
        let unchanged = store.appointment(&appointment.id).await.unwrap().unwrap();
        assert_eq!(unchanged.total_price.cents(), 45000);
    }

    #[tokio::test]
    async fn test_spec_conflict_scenario() {
        // Staff S has A at 10:00-10:30; 10:15-10:45 fails referencing A;
        // 10:30-11:00 succeeds.
        let (_store, engine) = engine().await;

        let a = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        let mut overlapping = request("staff-1", t(10, 15));
        overlapping.end_time = Some(t(10, 45));
        let err = engine.book(overlapping).await.unwrap_err();
        match err {
            EngineError::Core(CoreError::SlotConflict {
                conflicting_appointment_id,
                ..
            }) => assert_eq!(conflicting_appointment_id, a.id),
            other => panic!("expected SlotConflict, got {other}"),
        }

        let adjacent = engine.book(request("staff-1", t(10, 30))).await.unwrap();
        assert_eq!(adjacent.start_time, t(10, 30));
    }

    #[tokio::test]
    async fn test_conflict_detected_against_preexisting_store_rows() {
        // Index hydrates (staff, date) pages from the store on first touch
        let (store, engine) = engine().await;

        let now = Utc::now();
        let existing = Appointment {
            id: "appt-existing".to_string(),
            salon_id: "salon-1".to_string(),
            branch_id: "branch-1".to_string(),
            client_id: "client-9".to_string(),
            staff_id: "staff-1".to_string(),
            service_id: "service-30".to_string(),
            status: AppointmentStatus::Confirmed,
            appointment_date: date(),
            start_time: t(9, 0),
            end_time: t(9, 30),
            total_price: Money::from_cents(45000),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_appointment(&existing).await.unwrap();

        let err = engine.book(request("staff-1", t(9, 15))).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::SlotConflict { .. })
        ));
    }

    #[tokio::test]
    async fn test_book_rejects_broken_ownership_links() {
        let (store, engine) = engine().await;

        // Staff scoped to a different branch
        let mut scoped = staff("staff-scoped");
        scoped.branch_id = Some("branch-other".to_string());
        store.put_staff(scoped).await;
        let err = engine
            .book(request("staff-scoped", t(10, 0)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::Validation(_))
        ));

        // Inactive service
        let mut retired = service("service-retired", 30, 1000);
        retired.is_active = false;
        store.put_service(retired).await;
        let mut req = request("staff-1", t(12, 0));
        req.service_id = "service-retired".to_string();
        assert!(matches!(
            engine.book(req).await.unwrap_err(),
            EngineError::Core(CoreError::Validation(_))
        ));

        // Unknown staff
        assert!(matches!(
            engine.book(request("staff-ghost", t(10, 0))).await.unwrap_err(),
            EngineError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_transition_walks_the_happy_path() {
        let (_store, engine) = engine().await;
        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        for status in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
        ] {
            let updated = engine.transition(&appointment.id, status).await.unwrap();
            assert_eq!(updated.status, status);
        }
    }

    #[tokio::test]
    async fn test_transition_rejects_pending_to_completed() {
        let (_store, engine) = engine().await;
        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        let err = engine
            .transition(&appointment.id, AppointmentStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Core(CoreError::IllegalTransition { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_frees_the_slot() {
        let (_store, engine) = engine().await;
        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        engine
            .transition(&appointment.id, AppointmentStatus::Cancelled)
            .await
            .unwrap();

        // The exact interval is bookable again
        let rebooked = engine.book(request("staff-1", t(10, 0))).await.unwrap();
        assert_eq!(rebooked.start_time, t(10, 0));
    }

    #[tokio::test]
    async fn test_no_show_requires_the_time_to_have_passed() {
        let (store, engine) = engine().await;

        // Future appointment: confirmed but not eligible for no-show yet
        let future = engine.book(request("staff-1", t(10, 0))).await.unwrap();
        engine
            .transition(&future.id, AppointmentStatus::Confirmed)
            .await
            .unwrap();
        assert!(matches!(
            engine
                .transition(&future.id, AppointmentStatus::NoShow)
                .await
                .unwrap_err(),
            EngineError::Core(CoreError::IllegalTransition { .. })
        ));

        // Past appointment: eligible
        let yesterday = Utc::now().date_naive().pred_opt().unwrap();
        let now = Utc::now();
        let past = Appointment {
            id: "appt-past".to_string(),
            salon_id: "salon-1".to_string(),
            branch_id: "branch-1".to_string(),
            client_id: "client-2".to_string(),
            staff_id: "staff-2".to_string(),
            service_id: "service-30".to_string(),
            status: AppointmentStatus::Confirmed,
            appointment_date: yesterday,
            start_time: t(10, 0),
            end_time: t(10, 30),
            total_price: Money::from_cents(45000),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        store.insert_appointment(&past).await.unwrap();

        let updated = engine
            .transition("appt-past", AppointmentStatus::NoShow)
            .await
            .unwrap();
        assert_eq!(updated.status, AppointmentStatus::NoShow);
    }

    #[tokio::test]
    async fn test_reschedule_moves_and_frees_old_slot() {
        let (_store, engine) = engine().await;
        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        let moved = engine
            .reschedule(
                &appointment.id,
                RescheduleRequest {
                    date: date(),
                    start_time: t(14, 0),
                    staff_id: None,
                    end_time: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.start_time, t(14, 0));
        assert_eq!(moved.end_time, t(14, 30));

        // Old interval is free again, new one is taken
        assert!(engine.book(request("staff-1", t(10, 0))).await.is_ok());
        assert!(engine.book(request("staff-1", t(14, 0))).await.is_err());
    }

    #[tokio::test]
    async fn test_reschedule_onto_own_interval_succeeds() {
        // 10:00-10:30 → 10:15-10:45 overlaps itself; self-conflict must be
        // excluded by vacating the old interval first
        let (_store, engine) = engine().await;
        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        let moved = engine
            .reschedule(
                &appointment.id,
                RescheduleRequest {
                    date: date(),
                    start_time: t(10, 15),
                    staff_id: None,
                    end_time: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.start_time, t(10, 15));
    }

    #[tokio::test]
    async fn test_reschedule_conflict_rolls_back_completely() {
        let (_store, engine) = engine().await;
        let blocker = engine.book(request("staff-1", t(10, 0))).await.unwrap();
        let mover = engine.book(request("staff-1", t(11, 0))).await.unwrap();

        let err = engine
            .reschedule(
                &mover.id,
                RescheduleRequest {
                    date: date(),
                    start_time: t(10, 15),
                    staff_id: None,
                    end_time: None,
                },
            )
            .await
            .unwrap_err();
        match err {
            EngineError::Core(CoreError::SlotConflict {
                conflicting_appointment_id,
                ..
            }) => assert_eq!(conflicting_appointment_id, blocker.id),
            other => panic!("expected SlotConflict, got {other}"),
        }

        // The mover still holds its original interval: a third booking
        // there must collide with it, not find it freed
        let err = engine.book(request("staff-1", t(11, 0))).await.unwrap_err();
        match err {
            EngineError::Core(CoreError::SlotConflict {
                conflicting_appointment_id,
                ..
            }) => assert_eq!(conflicting_appointment_id, mover.id),
            other => panic!("expected SlotConflict, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_reschedule_to_other_staff() {
        let (_store, engine) = engine().await;
        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();

        let moved = engine
            .reschedule(
                &appointment.id,
                RescheduleRequest {
                    date: date(),
                    start_time: t(10, 0),
                    staff_id: Some("staff-2".to_string()),
                    end_time: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(moved.staff_id, "staff-2");

        // staff-1's interval is free again; staff-2's is now taken
        assert!(engine.book(request("staff-1", t(10, 0))).await.is_ok());
        assert!(engine.book(request("staff-2", t(10, 0))).await.is_err());
    }

    #[tokio::test]
    async fn test_reschedule_completed_is_rejected() {
        let (_store, engine) = engine().await;
        let appointment = engine.book(request("staff-1", t(10, 0))).await.unwrap();
        for status in [
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
        ] {
            engine.transition(&appointment.id, status).await.unwrap();
        }

        let err = engine
            .reschedule(
                &appointment.id,
                RescheduleRequest {
                    date: date(),
                    start_time: t(15, 0),
                    staff_id: None,
                    end_time: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::NotReschedulable { .. }));
    }

    #[tokio::test]
    async fn test_next_free_respects_bookings_and_hours() {
        let (_store, engine) = engine().await;
        engine.book(request("staff-1", t(9, 0))).await.unwrap();
        engine.book(request("staff-1", t(9, 30))).await.unwrap();

        let slot = engine
            .next_free("staff-1", "branch-1", date(), 30)
            .await
            .unwrap();
        assert_eq!(slot.start, t(10, 0));

        // next_free never proposes a slot book() would reject
        let mut req = request("staff-1", slot.start);
        req.end_time = Some(slot.end);
        assert!(engine.book(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_concurrent_bookings_same_slot_one_winner() {
        let (store, engine) = engine().await;
        let engine = Arc::new(engine);

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.book(request("staff-1", t(10, 0))).await
            }));
        }

        let mut wins = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => wins += 1,
                Err(EngineError::Core(CoreError::SlotConflict { .. })) => conflicts += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 7);

        // Exactly one appointment landed in the store for that interval
        let day = store
            .appointments_by_staff_in_range("staff-1", date(), date())
            .await
            .unwrap();
        assert_eq!(day.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_bookings_distinct_staff_all_win() {
        let (_store, engine) = engine().await;
        let engine = Arc::new(engine);

        let mut handles = Vec::new();
        for staff_id in ["staff-1", "staff-2"] {
            for minutes in [0u32, 30] {
                let engine = engine.clone();
                let staff_id = staff_id.to_string();
                handles.push(tokio::spawn(async move {
                    engine.book(request(&staff_id, t(10, minutes))).await
                }));
            }
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
    }
}

//! # Reporting Service
//!
//! Store-backed windows feeding the pure analytics folds in `sheba-core`.
//!
//! ## Division of Labor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ReportingService (this module)          sheba_core::analytics         │
//! │                                                                         │
//! │  • slice the ledger to windows     ──►   • fold into DashboardStats    │
//! │  • resolve display names                 • zero-filled revenue series  │
//! │    (catalog + user lookups)              • performance groupings       │
//! │  • thread external ratings through       • change percentages          │
//! │                                                                         │
//! │  Reads only. No locks over the ledger: a report taken while bookings   │
//! │  land reads a consistent-per-row, possibly slightly stale snapshot.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use sheba_core::analytics::{
    self, DashboardStats, Granularity, RatingInput, ReportWindow, RevenueData, ServicePerformance,
    StaffPerformance,
};

use crate::error::EngineResult;
use crate::store::SalonStore;

/// Analytics queries over one salon's appointment ledger.
pub struct ReportingService {
    store: Arc<dyn SalonStore>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn SalonStore>) -> Self {
        ReportingService { store }
    }

    /// Headline dashboard numbers for a window, with change percentages
    /// against the immediately preceding window of equal length.
    ///
    /// Ratings come from the external review system; the engine folds them
    /// through verbatim.
    pub async fn dashboard(
        &self,
        salon_id: &str,
        window: ReportWindow,
        ratings: &RatingInput,
    ) -> EngineResult<DashboardStats> {
        let prior = window.prior();
        let current_rows = self
            .store
            .appointments_in_range(salon_id, window.from, window.to)
            .await?;
        let prior_rows = self
            .store
            .appointments_in_range(salon_id, prior.from, prior.to)
            .await?;

        Ok(analytics::dashboard_stats(
            &current_rows,
            &prior_rows,
            ratings,
        ))
    }

    /// Ordered revenue buckets over a window, zero-filled for quiet
    /// periods.
    pub async fn revenue_series(
        &self,
        salon_id: &str,
        window: ReportWindow,
        granularity: Granularity,
    ) -> EngineResult<Vec<RevenueData>> {
        let rows = self
            .store
            .appointments_in_range(salon_id, window.from, window.to)
            .await?;
        Ok(analytics::revenue_series(&rows, &window, granularity))
    }

    /// Per-service totals, sorted by revenue descending (id ascending on
    /// ties).
    pub async fn service_performance(
        &self,
        salon_id: &str,
        window: ReportWindow,
    ) -> EngineResult<Vec<ServicePerformance>> {
        let rows = self
            .store
            .appointments_in_range(salon_id, window.from, window.to)
            .await?;

        let names: HashMap<String, String> = self
            .store
            .services_by_salon(salon_id)
            .await?
            .into_iter()
            .map(|s| (s.id, s.name))
            .collect();

        Ok(analytics::service_performance(&rows, &window, &names))
    }

    /// Per-staff totals, with display names resolved through the staff
    /// member's user record.
    pub async fn staff_performance(
        &self,
        salon_id: &str,
        window: ReportWindow,
        ratings: &RatingInput,
    ) -> EngineResult<Vec<StaffPerformance>> {
        let rows = self
            .store
            .appointments_in_range(salon_id, window.from, window.to)
            .await?;

        // Staff records carry no display name of their own; it lives on
        // the linked user. A missing user row falls back to the staff id.
        let mut names: HashMap<String, String> = HashMap::new();
        for staff in self.store.staff_by_salon(salon_id).await? {
            if let Some(user) = self.store.user(&staff.user_id).await? {
                names.insert(staff.id, user.full_name());
            }
        }

        Ok(analytics::staff_performance(&rows, &window, &names, ratings))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::{NaiveDate, NaiveTime, Utc};
    use sheba_core::{
        Appointment, AppointmentStatus, Money, Rate, Staff, StaffRole, User, UserRole,
    };

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    fn appointment(
        id: &str,
        date: NaiveDate,
        status: AppointmentStatus,
        price_cents: i64,
        client: &str,
        staff: &str,
    ) -> Appointment {
        let now = Utc::now();
        Appointment {
            id: id.to_string(),
            salon_id: "salon-1".to_string(),
            branch_id: "branch-1".to_string(),
            client_id: client.to_string(),
            staff_id: staff.to_string(),
            service_id: "service-1".to_string(),
            status,
            appointment_date: date,
            start_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            total_price: Money::from_cents(price_cents),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn staff(id: &str, user_id: &str) -> Staff {
        Staff {
            id: id.to_string(),
            user_id: user_id.to_string(),
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

    fn user(id: &str, first: &str, last: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{first}@zemen.example"),
            first_name: first.to_string(),
            last_name: last.to_string(),
            phone: "+251911000000".to_string(),
            role: UserRole::Stylist,
            is_verified: true,
            created_at: Utc::now(),
        }
    }

    async fn seeded() -> (Arc<InMemoryStore>, ReportingService) {
        let store = Arc::new(InMemoryStore::new());

        // Current window (Jan 8-14): two completed, one cancelled
        for row in [
            appointment("a1", d(10), AppointmentStatus::Completed, 10000, "c1", "staff-1"),
            appointment("a2", d(10), AppointmentStatus::Completed, 5000, "c2", "staff-2"),
            appointment("a3", d(12), AppointmentStatus::Cancelled, 7000, "c1", "staff-1"),
            // Prior window (Jan 1-7)
            appointment("a0", d(3), AppointmentStatus::Completed, 10000, "c3", "staff-1"),
        ] {
            store.insert_appointment(&row).await.unwrap();
        }

        store.put_staff(staff("staff-1", "user-1")).await;
        store.put_staff(staff("staff-2", "user-ghost")).await;
        store.put_user(user("user-1", "Hanna", "Tesfaye")).await;

        let reporting = ReportingService::new(store.clone());
        (store, reporting)
    }

    #[tokio::test]
    async fn test_dashboard_window_vs_prior() {
        let (_store, reporting) = seeded().await;

        let stats = reporting
            .dashboard(
                "salon-1",
                ReportWindow::new(d(8), d(14)),
                &RatingInput::default(),
            )
            .await
            .unwrap();

        assert_eq!(stats.total_revenue.cents(), 15000);
        assert_eq!(stats.total_appointments, 3);
        assert_eq!(stats.total_clients, 2);
        assert_eq!(stats.revenue_change, 50.0);
        assert_eq!(stats.appointments_change, 200.0);
    }

    #[tokio::test]
    async fn test_revenue_series_zero_filled() {
        let (_store, reporting) = seeded().await;

        let series = reporting
            .revenue_series("salon-1", ReportWindow::new(d(8), d(14)), Granularity::Day)
            .await
            .unwrap();

        assert_eq!(series.len(), 7);
        let active: Vec<_> = series.iter().filter(|b| !b.revenue.is_zero()).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].date, d(10));
        assert_eq!(active[0].revenue.cents(), 15000);
        assert_eq!(active[0].appointments, 2);
    }

    #[tokio::test]
    async fn test_staff_performance_resolves_user_names() {
        let (_store, reporting) = seeded().await;

        let rows = reporting
            .staff_performance(
                "salon-1",
                ReportWindow::new(d(8), d(14)),
                &RatingInput::default(),
            )
            .await
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].staff_id, "staff-1");
        assert_eq!(rows[0].staff_name, "Hanna Tesfaye");
        // No user record: the raw id stands in rather than hiding revenue
        assert_eq!(rows[1].staff_id, "staff-2");
        assert_eq!(rows[1].staff_name, "staff-2");
    }

    #[tokio::test]
    async fn test_reports_scope_to_salon() {
        let (store, reporting) = seeded().await;

        let mut foreign = appointment("b1", d(10), AppointmentStatus::Completed, 99999, "c9", "s9");
        foreign.salon_id = "salon-other".to_string();
        store.insert_appointment(&foreign).await.unwrap();

        let stats = reporting
            .dashboard(
                "salon-1",
                ReportWindow::new(d(8), d(14)),
                &RatingInput::default(),
            )
            .await
            .unwrap();
        assert_eq!(stats.total_revenue.cents(), 15000);
    }
}

//! # Analytics Aggregates
//!
//! Pure fold functions over the appointment ledger, producing the four
//! shapes the dashboard consumes: `DashboardStats`, `RevenueData`,
//! `ServicePerformance`, `StaffPerformance`.
//!
//! ## Derivation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Aggregates are DERIVED, never stored as truth:                         │
//! │  recomputable at any time from the appointment/payment ledger.          │
//! │                                                                         │
//! │  revenue          = Σ total_price of COMPLETED appointments             │
//! │  appointments     = count of all appointments in the window             │
//! │  clients          = distinct client ids in the window                   │
//! │  rating           = external collaborator input (not computed here)     │
//! │                                                                         │
//! │  change% = (current − prior) / prior × 100                              │
//! │            defined as 0 when prior == 0 (never a division error)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ratings come from outside the engine (review collection is a separate
//! system); they are threaded through as an input so the folds stay pure.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Appointment, AppointmentStatus};

// =============================================================================
// Report Window
// =============================================================================

/// A bounded, inclusive date range for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportWindow {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
}

impl ReportWindow {
    /// Creates a window; `from` and `to` are both included. A backwards
    /// range is normalized rather than rejected.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            ReportWindow { from, to }
        } else {
            ReportWindow { from: to, to: from }
        }
    }

    /// Number of days covered (at least 1).
    pub fn days(&self) -> u64 {
        (self.to - self.from).num_days() as u64 + 1
    }

    /// The immediately preceding window of equal length, used as the
    /// comparison baseline for change percentages.
    pub fn prior(&self) -> ReportWindow {
        let len = self.days();
        let to = self.from.pred_opt().unwrap_or(self.from);
        let from = to.checked_sub_days(Days::new(len - 1)).unwrap_or(to);
        ReportWindow { from, to }
    }

    /// Whether a date falls inside the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from <= date && date <= self.to
    }
}

/// Bucket width for the revenue series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    /// Seven-day strides anchored at the window start.
    Week,
    /// Calendar months, clipped to the window.
    Month,
}

// =============================================================================
// Output Shapes (the dashboard contract)
// =============================================================================

/// Headline dashboard numbers with period-over-period change percentages.
///
/// `*_change` values are signed percentages; the stat-card widget renders
/// a "+" prefix only when positive (see [`format_change`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_revenue: Money,
    pub revenue_change: f64,
    pub total_appointments: u64,
    pub appointments_change: f64,
    pub total_clients: u64,
    pub clients_change: f64,
    pub average_rating: f64,
    pub rating_change: f64,
}

/// One bucket of the revenue chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RevenueData {
    /// Bucket start date.
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub revenue: Money,
    /// Completed (revenue-generating) appointments in the bucket.
    pub appointments: u64,
}

/// Per-service totals over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServicePerformance {
    pub service_id: String,
    pub service_name: String,
    pub bookings: u64,
    pub revenue: Money,
}

/// Per-staff totals over a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffPerformance {
    pub staff_id: String,
    pub staff_name: String,
    pub appointments: u64,
    pub revenue: Money,
    pub rating: f64,
}

// =============================================================================
// Rating Input
// =============================================================================

/// Ratings supplied by the external review system.
///
/// The engine never computes ratings; it folds them into the dashboard
/// shapes verbatim.
#[derive(Debug, Clone, Default)]
pub struct RatingInput {
    /// Average rating over the current window.
    pub average: f64,
    /// Average rating over the prior window.
    pub prior_average: f64,
    /// Per-staff averages for `StaffPerformance`.
    pub by_staff: HashMap<String, f64>,
}

// =============================================================================
// Change Arithmetic
// =============================================================================

/// Period-over-period change as a signed percentage.
///
/// Zero-prior policy: a change against a zero baseline is reported as 0,
/// not infinity/NaN — new activity with no history shows as flat rather
/// than surfacing a division error to the dashboard.
pub fn change_percent(current: f64, prior: f64) -> f64 {
    if prior == 0.0 {
        0.0
    } else {
        (current - prior) / prior * 100.0
    }
}

/// Renders a change percentage the way the stat-card widget expects:
/// "+" prefix only when positive, one decimal place.
///
/// ## Example
/// ```rust
/// use sheba_core::analytics::format_change;
///
/// assert_eq!(format_change(12.5), "+12.5%");
/// assert_eq!(format_change(-3.35), "-3.4%");
/// assert_eq!(format_change(0.0), "0.0%");
/// ```
pub fn format_change(change: f64) -> String {
    if change > 0.0 {
        format!("+{change:.1}%")
    } else {
        format!("{change:.1}%")
    }
}

// =============================================================================
// Folds
// =============================================================================

fn completed_revenue(appointments: &[Appointment]) -> Money {
    appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Completed)
        .fold(Money::zero(), |acc, a| acc + a.total_price)
}

fn distinct_clients(appointments: &[Appointment]) -> u64 {
    appointments
        .iter()
        .map(|a| a.client_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64
}

/// Folds two pre-windowed appointment slices into the headline stats.
///
/// Callers slice the ledger to the current and prior windows first (the
/// engine's reporter does this via the store); the fold itself stays pure.
pub fn dashboard_stats(
    current: &[Appointment],
    prior: &[Appointment],
    ratings: &RatingInput,
) -> DashboardStats {
    let total_revenue = completed_revenue(current);
    let prior_revenue = completed_revenue(prior);

    let total_appointments = current.len() as u64;
    let prior_appointments = prior.len() as u64;

    let total_clients = distinct_clients(current);
    let prior_clients = distinct_clients(prior);

    DashboardStats {
        total_revenue,
        revenue_change: change_percent(total_revenue.cents() as f64, prior_revenue.cents() as f64),
        total_appointments,
        appointments_change: change_percent(total_appointments as f64, prior_appointments as f64),
        total_clients,
        clients_change: change_percent(total_clients as f64, prior_clients as f64),
        average_rating: ratings.average,
        rating_change: change_percent(ratings.average, ratings.prior_average),
    }
}

/// Start date of the bucket a given date falls into.
fn bucket_start(date: NaiveDate, window: &ReportWindow, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Day => date,
        Granularity::Week => {
            let offset = (date - window.from).num_days() as u64;
            window
                .from
                .checked_add_days(Days::new(offset - offset % 7))
                .unwrap_or(date)
        }
        Granularity::Month => window
            .from
            .max(date.with_day(1).unwrap_or(date)),
    }
}

/// Advance to the next bucket start.
fn next_bucket(start: NaiveDate, granularity: Granularity) -> Option<NaiveDate> {
    match granularity {
        Granularity::Day => start.checked_add_days(Days::new(1)),
        Granularity::Week => start.checked_add_days(Days::new(7)),
        Granularity::Month => {
            let first = start.with_day(1)?;
            first.checked_add_months(chrono::Months::new(1))
        }
    }
}

/// Produces the ordered revenue series over a window, one bucket per
/// granularity unit, with zero-filled buckets for inactive periods.
///
/// Only completed appointments contribute; appointments outside the window
/// are ignored regardless of status.
pub fn revenue_series(
    appointments: &[Appointment],
    window: &ReportWindow,
    granularity: Granularity,
) -> Vec<RevenueData> {
    // Pre-seed every bucket so quiet periods appear as explicit zeros
    // (the chart must show gaps as flat, not skip them)
    let mut buckets: BTreeMap<NaiveDate, (Money, u64)> = BTreeMap::new();
    let mut start = window.from;
    loop {
        buckets.insert(start, (Money::zero(), 0));
        match next_bucket(start, granularity) {
            Some(next) if next <= window.to => start = next,
            _ => break,
        }
    }

    for appointment in appointments {
        if appointment.status != AppointmentStatus::Completed
            || !window.contains(appointment.appointment_date)
        {
            continue;
        }
        let key = bucket_start(appointment.appointment_date, window, granularity);
        if let Some((revenue, count)) = buckets.get_mut(&key) {
            *revenue += appointment.total_price;
            *count += 1;
        }
    }

    buckets
        .into_iter()
        .map(|(date, (revenue, appointments))| RevenueData {
            date,
            revenue,
            appointments,
        })
        .collect()
}

/// Sorts performance rows by revenue descending, ties by ascending id —
/// deterministic output for equal revenues.
fn sort_by_revenue<T>(rows: &mut [T], revenue: impl Fn(&T) -> Money, id: impl Fn(&T) -> String) {
    rows.sort_by(|a, b| {
        revenue(b)
            .cents()
            .cmp(&revenue(a).cents())
            .then_with(|| id(a).cmp(&id(b)))
    });
}

/// Groups completed appointments by service.
///
/// `service_names` maps service id → display name (from the catalog);
/// unknown ids fall back to the raw id so a stale catalog never hides
/// revenue.
pub fn service_performance(
    appointments: &[Appointment],
    window: &ReportWindow,
    service_names: &HashMap<String, String>,
) -> Vec<ServicePerformance> {
    let mut grouped: HashMap<&str, (u64, Money)> = HashMap::new();
    for appointment in appointments {
        if appointment.status != AppointmentStatus::Completed
            || !window.contains(appointment.appointment_date)
        {
            continue;
        }
        let entry = grouped
            .entry(appointment.service_id.as_str())
            .or_insert((0, Money::zero()));
        entry.0 += 1;
        entry.1 += appointment.total_price;
    }

    let mut rows: Vec<ServicePerformance> = grouped
        .into_iter()
        .map(|(service_id, (bookings, revenue))| ServicePerformance {
            service_id: service_id.to_string(),
            service_name: service_names
                .get(service_id)
                .cloned()
                .unwrap_or_else(|| service_id.to_string()),
            bookings,
            revenue,
        })
        .collect();

    sort_by_revenue(&mut rows, |r| r.revenue, |r| r.service_id.clone());
    rows
}

/// Groups completed appointments by staff member.
pub fn staff_performance(
    appointments: &[Appointment],
    window: &ReportWindow,
    staff_names: &HashMap<String, String>,
    ratings: &RatingInput,
) -> Vec<StaffPerformance> {
    let mut grouped: HashMap<&str, (u64, Money)> = HashMap::new();
    for appointment in appointments {
        if appointment.status != AppointmentStatus::Completed
            || !window.contains(appointment.appointment_date)
        {
            continue;
        }
        let entry = grouped
            .entry(appointment.staff_id.as_str())
            .or_insert((0, Money::zero()));
        entry.0 += 1;
        entry.1 += appointment.total_price;
    }

    let mut rows: Vec<StaffPerformance> = grouped
        .into_iter()
        .map(|(staff_id, (appointments, revenue))| StaffPerformance {
            staff_id: staff_id.to_string(),
            staff_name: staff_names
                .get(staff_id)
                .cloned()
                .unwrap_or_else(|| staff_id.to_string()),
            appointments,
            revenue,
            rating: ratings.by_staff.get(staff_id).copied().unwrap_or(0.0),
        })
        .collect();

    sort_by_revenue(&mut rows, |r| r.revenue, |r| r.staff_id.clone());
    rows
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

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
        service: &str,
    ) -> Appointment {
        Appointment {
            id: id.to_string(),
            salon_id: "salon-1".to_string(),
            branch_id: "branch-1".to_string(),
            client_id: client.to_string(),
            staff_id: staff.to_string(),
            service_id: service.to_string(),
            status,
            appointment_date: date,
            start_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            end_time: chrono::NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
            total_price: Money::from_cents(price_cents),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_change_percent_zero_prior_policy() {
        // prior 0, current 100 => 0 by policy, never infinity/NaN
        assert_eq!(change_percent(100.0, 0.0), 0.0);
        assert_eq!(change_percent(0.0, 0.0), 0.0);
        assert_eq!(change_percent(150.0, 100.0), 50.0);
        assert_eq!(change_percent(50.0, 100.0), -50.0);
    }

    #[test]
    fn test_format_change_prefix_rules() {
        assert_eq!(format_change(12.5), "+12.5%");
        assert_eq!(format_change(-3.35), "-3.4%");
        assert_eq!(format_change(0.0), "0.0%");
    }

    #[test]
    fn test_window_prior() {
        let window = ReportWindow::new(d(8), d(14));
        assert_eq!(window.days(), 7);

        let prior = window.prior();
        assert_eq!(prior.from, d(1));
        assert_eq!(prior.to, d(7));
    }

    #[test]
    fn test_dashboard_stats_folds() {
        let current = vec![
            appointment("a1", d(10), AppointmentStatus::Completed, 10000, "c1", "s1", "sv1"),
            appointment("a2", d(11), AppointmentStatus::Completed, 5000, "c2", "s1", "sv1"),
            appointment("a3", d(12), AppointmentStatus::Cancelled, 7000, "c1", "s2", "sv2"),
        ];
        let prior = vec![appointment(
            "a0",
            d(3),
            AppointmentStatus::Completed,
            10000,
            "c9",
            "s1",
            "sv1",
        )];
        let ratings = RatingInput {
            average: 4.5,
            prior_average: 4.0,
            ..Default::default()
        };

        let stats = dashboard_stats(&current, &prior, &ratings);

        // Cancelled appointment counts toward traffic, not revenue
        assert_eq!(stats.total_revenue.cents(), 15000);
        assert_eq!(stats.total_appointments, 3);
        assert_eq!(stats.total_clients, 2);
        assert_eq!(stats.revenue_change, 50.0);
        assert_eq!(stats.appointments_change, 200.0);
        assert_eq!(stats.clients_change, 100.0);
        assert_eq!(stats.average_rating, 4.5);
        assert!((stats.rating_change - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_dashboard_stats_empty_prior_is_all_zero_changes() {
        let current = vec![appointment(
            "a1",
            d(10),
            AppointmentStatus::Completed,
            10000,
            "c1",
            "s1",
            "sv1",
        )];
        let stats = dashboard_stats(&current, &[], &RatingInput::default());

        assert_eq!(stats.revenue_change, 0.0);
        assert_eq!(stats.appointments_change, 0.0);
        assert_eq!(stats.clients_change, 0.0);
        assert_eq!(stats.rating_change, 0.0);
    }

    #[test]
    fn test_revenue_series_zero_fills_seven_day_window() {
        // Spec scenario: 7-day window, activity only on day 3
        let window = ReportWindow::new(d(1), d(7));
        let appointments = vec![
            appointment("a1", d(3), AppointmentStatus::Completed, 4000, "c1", "s1", "sv1"),
            appointment("a2", d(3), AppointmentStatus::Completed, 6000, "c2", "s1", "sv1"),
        ];

        let series = revenue_series(&appointments, &window, Granularity::Day);

        assert_eq!(series.len(), 7);
        for bucket in &series {
            if bucket.date == d(3) {
                assert_eq!(bucket.revenue.cents(), 10000);
                assert_eq!(bucket.appointments, 2);
            } else {
                assert_eq!(bucket.revenue.cents(), 0);
                assert_eq!(bucket.appointments, 0);
            }
        }
        // Ordered, no gaps
        for (i, bucket) in series.iter().enumerate() {
            assert_eq!(bucket.date, d(1 + i as u32));
        }
    }

    #[test]
    fn test_revenue_series_ignores_non_completed_and_out_of_window() {
        let window = ReportWindow::new(d(1), d(7));
        let appointments = vec![
            appointment("a1", d(3), AppointmentStatus::Pending, 4000, "c1", "s1", "sv1"),
            appointment("a2", d(20), AppointmentStatus::Completed, 6000, "c2", "s1", "sv1"),
        ];

        let series = revenue_series(&appointments, &window, Granularity::Day);
        assert!(series.iter().all(|b| b.revenue.is_zero() && b.appointments == 0));
    }

    #[test]
    fn test_revenue_series_weekly_buckets() {
        let window = ReportWindow::new(d(1), d(14));
        let appointments = vec![
            appointment("a1", d(2), AppointmentStatus::Completed, 1000, "c1", "s1", "sv1"),
            appointment("a2", d(9), AppointmentStatus::Completed, 2000, "c1", "s1", "sv1"),
            appointment("a3", d(14), AppointmentStatus::Completed, 500, "c1", "s1", "sv1"),
        ];

        let series = revenue_series(&appointments, &window, Granularity::Week);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].date, d(1));
        assert_eq!(series[0].revenue.cents(), 1000);
        assert_eq!(series[1].date, d(8));
        assert_eq!(series[1].revenue.cents(), 2500);
    }

    #[test]
    fn test_service_performance_sorted_with_deterministic_ties() {
        let window = ReportWindow::new(d(1), d(31));
        let appointments = vec![
            appointment("a1", d(2), AppointmentStatus::Completed, 5000, "c1", "s1", "sv-b"),
            appointment("a2", d(3), AppointmentStatus::Completed, 5000, "c2", "s1", "sv-a"),
            appointment("a3", d(4), AppointmentStatus::Completed, 9000, "c3", "s1", "sv-c"),
            appointment("a4", d(5), AppointmentStatus::NoShow, 9000, "c3", "s1", "sv-a"),
        ];
        let names = HashMap::from([
            ("sv-a".to_string(), "Haircut".to_string()),
            ("sv-b".to_string(), "Manicure".to_string()),
            ("sv-c".to_string(), "Full Spa".to_string()),
        ]);

        let rows = service_performance(&appointments, &window, &names);

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].service_id, "sv-c");
        // Equal revenue: ascending id breaks the tie
        assert_eq!(rows[1].service_id, "sv-a");
        assert_eq!(rows[2].service_id, "sv-b");
        assert_eq!(rows[1].service_name, "Haircut");
        assert_eq!(rows[1].bookings, 1);
    }

    #[test]
    fn test_staff_performance_includes_ratings() {
        let window = ReportWindow::new(d(1), d(31));
        let appointments = vec![
            appointment("a1", d(2), AppointmentStatus::Completed, 5000, "c1", "staff-1", "sv1"),
            appointment("a2", d(3), AppointmentStatus::Completed, 8000, "c2", "staff-2", "sv1"),
        ];
        let names = HashMap::from([
            ("staff-1".to_string(), "Hanna T.".to_string()),
            ("staff-2".to_string(), "Meron A.".to_string()),
        ]);
        let ratings = RatingInput {
            by_staff: HashMap::from([("staff-1".to_string(), 4.8)]),
            ..Default::default()
        };

        let rows = staff_performance(&appointments, &window, &names, &ratings);

        assert_eq!(rows[0].staff_id, "staff-2");
        assert_eq!(rows[0].rating, 0.0); // no rating supplied
        assert_eq!(rows[1].staff_id, "staff-1");
        assert_eq!(rows[1].rating, 4.8);
        assert_eq!(rows[1].staff_name, "Hanna T.");
    }
}

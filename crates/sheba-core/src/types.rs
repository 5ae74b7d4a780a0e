//! # Domain Types
//!
//! Core domain types used throughout Sheba Salon.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Salon       │   │     Branch      │   │     Staff       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  salon_id (FK)  │◄──│  branch_id (FK?)│       │
//! │  │  commission_rate│   │  is_main_branch │   │  commission_pct │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Service      │   │   Appointment   │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  duration_mins  │◄──│  service_id(FK) │◄──│  appointment_id │       │
//! │  │  CommissionRule │   │  status machine │   │  status machine │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  The Appointment is the central transactional entity: its status       │
//! │  machine drives the availability index, settlement, and analytics.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! `Appointment.total_price` is copied from the Service at booking time.
//! Later price changes never retroactively alter historical appointments.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::money::{Money, Rate};

// =============================================================================
// User
// =============================================================================

/// Platform-level user role.
///
/// Behavior differences by role are data-driven branches in the engine,
/// never subclassing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    PlatformAdmin,
    SalonAdmin,
    Stylist,
    Client,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::PlatformAdmin => "platform_admin",
            UserRole::SalonAdmin => "salon_admin",
            UserRole::Stylist => "stylist",
            UserRole::Client => "client",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platform_admin" => Ok(UserRole::PlatformAdmin),
            "salon_admin" => Ok(UserRole::SalonAdmin),
            "stylist" => Ok(UserRole::Stylist),
            "client" => Ok(UserRole::Client),
            other => Err(format!("unknown user role: {other}")),
        }
    }
}

/// A platform user (owner, staff member behind a Staff record, or client).
///
/// Authentication and authorization live outside this engine; the user
/// record is carried for identity and display only.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: UserRole,
    pub is_verified: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name for dashboards and logs.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

// =============================================================================
// Salon
// =============================================================================

/// What kind of establishment a salon is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SalonType {
    Hair,
    Beauty,
    Spa,
    Barbershop,
    Nails,
}

impl SalonType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalonType::Hair => "hair",
            SalonType::Beauty => "beauty",
            SalonType::Spa => "spa",
            SalonType::Barbershop => "barbershop",
            SalonType::Nails => "nails",
        }
    }
}

impl FromStr for SalonType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hair" => Ok(SalonType::Hair),
            "beauty" => Ok(SalonType::Beauty),
            "spa" => Ok(SalonType::Spa),
            "barbershop" => Ok(SalonType::Barbershop),
            "nails" => Ok(SalonType::Nails),
            other => Err(format!("unknown salon type: {other}")),
        }
    }
}

/// Salon size bracket (used for onboarding defaults, not by the engine).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SalonSize {
    Solo,
    Small,
    Medium,
    Large,
}

impl SalonSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalonSize::Solo => "solo",
            SalonSize::Small => "small",
            SalonSize::Medium => "medium",
            SalonSize::Large => "large",
        }
    }
}

impl FromStr for SalonSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solo" => Ok(SalonSize::Solo),
            "small" => Ok(SalonSize::Small),
            "medium" => Ok(SalonSize::Medium),
            "large" => Ok(SalonSize::Large),
            other => Err(format!("unknown salon size: {other}")),
        }
    }
}

/// A salon tenant. Owns zero-or-more branches.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Salon {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub name: String,
    pub description: Option<String>,

    /// Owning user id.
    pub owner_id: String,

    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub country: String,

    pub salon_type: SalonType,
    pub size: SalonSize,

    /// Default staff commission rate, used when a staff record carries none.
    pub commission_rate: Rate,

    /// Whether the salon is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Branch
// =============================================================================

/// A physical location of a salon. Belongs to exactly one salon.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Branch {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,

    /// Exactly one branch per salon should carry this flag.
    pub is_main_branch: bool,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Staff
// =============================================================================

/// Staff role within a salon. Closed set; scheduling treats all roles the
/// same, commission treats them the same, reporting may filter by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Stylist,
    Receptionist,
    Manager,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Stylist => "stylist",
            StaffRole::Receptionist => "receptionist",
            StaffRole::Manager => "manager",
        }
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stylist" => Ok(StaffRole::Stylist),
            "receptionist" => Ok(StaffRole::Receptionist),
            "manager" => Ok(StaffRole::Manager),
            other => Err(format!("unknown staff role: {other}")),
        }
    }
}

/// A staff member. Belongs to one salon, optionally scoped to one branch.
///
/// ## Branch Scoping
/// - `branch_id: None` — the staff member may take appointments at any
///   branch of the salon.
/// - `branch_id: Some(b)` — bookings are only valid at branch `b`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Staff {
    pub id: String,
    pub user_id: String,
    pub salon_id: String,
    pub branch_id: Option<String>,
    pub role: StaffRole,
    pub specialization: Option<String>,

    /// The staff member's cut of the commission baseline (0-100%).
    pub commission_percentage: Rate,

    pub is_active: bool,

    #[ts(as = "String")]
    pub hire_date: NaiveDate,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Staff {
    /// Checks whether this staff member may serve at the given branch.
    pub fn serves_branch(&self, branch_id: &str) -> bool {
        match &self.branch_id {
            Some(scoped) => scoped == branch_id,
            None => true,
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// A grouping of services within a salon's menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ServiceCategory {
    pub id: String,
    pub salon_id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// How the staff commission baseline for a service is defined.
///
/// ## Why an enum?
/// The source data model carried `commission_type` + `commission_value`
/// side by side, with "never both simultaneously active" as a prose rule.
/// The tagged union makes the illegal state unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "commissionType", content = "commissionValue")]
#[serde(rename_all = "snake_case")]
pub enum CommissionRule {
    /// The staff baseline is this percentage of the service price.
    Percentage(Rate),
    /// The staff baseline is this fixed amount (capped at the price).
    Fixed(Money),
}

/// A bookable service on a salon's menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Service {
    pub id: String,
    pub salon_id: String,
    pub category_id: String,
    pub name: String,
    pub description: Option<String>,

    /// Positive number of minutes a booking of this service occupies.
    pub duration_minutes: u32,

    /// Non-negative list price. Snapshotted onto appointments at booking.
    pub price: Money,

    /// Commission baseline for this service.
    pub commission: CommissionRule,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Appointment Status
// =============================================================================

/// The status of an appointment.
///
/// ## State Machine
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │   pending ──► confirmed ──► in_progress ──► completed                  │
/// │      │            │                                                     │
/// │      │            ├──► cancelled                                        │
/// │      └──► cancelled                                                     │
/// │                   │                                                     │
/// │                   └──► no_show   (only once the booked time passed)    │
/// │                                                                         │
/// │   Terminal: completed, cancelled, no_show                              │
/// │   Status only advances; pending is never re-entered.                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, awaiting confirmation.
    Pending,
    /// Confirmed by the salon.
    Confirmed,
    /// Client checked in, service underway.
    InProgress,
    /// Service delivered. Settlement may now finalize commission.
    Completed,
    /// Called off before the service. Frees the slot.
    Cancelled,
    /// Confirmed but the client never arrived. Frees the slot.
    NoShow,
}

impl AppointmentStatus {
    /// Checks whether the state machine permits `self → to`.
    ///
    /// The time precondition on `no_show` (booked end in the past) is the
    /// booking engine's to enforce; this matrix is purely structural.
    pub fn can_transition(&self, to: AppointmentStatus) -> bool {
        use AppointmentStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, InProgress)
                | (Confirmed, Cancelled)
                | (Confirmed, NoShow)
                | (InProgress, Completed)
        )
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Whether an appointment in this status holds its calendar slot.
    /// Cancelled and no-show appointments release theirs for rebooking.
    pub fn holds_slot(&self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    /// Stable string form used in storage and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AppointmentStatus::Pending),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

impl Default for AppointmentStatus {
    fn default() -> Self {
        AppointmentStatus::Pending
    }
}

// =============================================================================
// Appointment
// =============================================================================

/// The central transactional entity.
///
/// Scoped to (salon, branch, staff, client, service). `end_time` is
/// `start_time + service.duration_minutes` under normal flow; an override
/// is allowed at booking but is re-validated for overlap like any other
/// interval.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Appointment {
    pub id: String,
    pub salon_id: String,
    pub branch_id: String,
    pub client_id: String,
    pub staff_id: String,
    pub service_id: String,

    pub status: AppointmentStatus,

    #[ts(as = "String")]
    pub appointment_date: NaiveDate,
    #[ts(as = "String")]
    pub start_time: NaiveTime,
    #[ts(as = "String")]
    pub end_time: NaiveTime,

    /// Price snapshot taken from the Service at booking time.
    pub total_price: Money,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// The booked end as a UTC instant, for no-show eligibility checks.
    pub fn end_instant(&self) -> DateTime<Utc> {
        self.appointment_date.and_time(self.end_time).and_utc()
    }
}

// =============================================================================
// Payment
// =============================================================================

/// How a payment was made. Gateway integration lives outside the engine;
/// only the settlement outcome arrives here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Chapa,
    Telebirr,
    BankTransfer,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Chapa => "chapa",
            PaymentMethod::Telebirr => "telebirr",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "chapa" => Ok(PaymentMethod::Chapa),
            "telebirr" => Ok(PaymentMethod::Telebirr),
            "bank_transfer" => Ok(PaymentMethod::BankTransfer),
            other => Err(format!("unknown payment method: {other}")),
        }
    }
}

/// Settlement status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            other => Err(format!("unknown payment status: {other}")),
        }
    }
}

/// A payment towards an appointment.
///
/// 1:1 with the appointment in steady state; cancelled and no-show
/// appointments may legitimately have none. `amount` should equal
/// `Appointment.total_price` for completed payments — mismatches are
/// flagged by the reconciler, never silently corrected.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub appointment_id: String,
    pub amount: Money,
    pub method: PaymentMethod,
    pub status: PaymentStatus,

    /// Gateway transaction reference (Chapa/Telebirr/processor id).
    pub transaction_id: Option<String>,

    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory
// =============================================================================

/// A stocked retail or consumable item.
///
/// Carried for data-model completeness only: inventory tracking is outside
/// the scheduling/commission engine.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub salon_id: String,
    pub branch_id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub quantity: i64,
    pub reorder_level: i64,
    pub unit_price: Money,
    pub supplier: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_machine_forward_edges() {
        use AppointmentStatus::*;

        assert!(Pending.can_transition(Confirmed));
        assert!(Pending.can_transition(Cancelled));
        assert!(Confirmed.can_transition(InProgress));
        assert!(Confirmed.can_transition(Cancelled));
        assert!(Confirmed.can_transition(NoShow));
        assert!(InProgress.can_transition(Completed));
    }

    #[test]
    fn test_status_machine_rejects_shortcuts() {
        use AppointmentStatus::*;

        // Must pass through confirmed/in_progress
        assert!(!Pending.can_transition(Completed));
        assert!(!Pending.can_transition(InProgress));
        assert!(!Pending.can_transition(NoShow));
        // In-progress services cannot be cancelled or no-showed
        assert!(!InProgress.can_transition(Cancelled));
        assert!(!InProgress.can_transition(NoShow));
        // Pending is never re-entered
        assert!(!Confirmed.can_transition(Pending));
        assert!(!Cancelled.can_transition(Pending));
    }

    #[test]
    fn test_terminal_states_are_sinks() {
        use AppointmentStatus::*;

        for terminal in [Completed, Cancelled, NoShow] {
            assert!(terminal.is_terminal());
            for target in [Pending, Confirmed, InProgress, Completed, Cancelled, NoShow] {
                assert!(!terminal.can_transition(target));
            }
        }
    }

    #[test]
    fn test_holds_slot() {
        use AppointmentStatus::*;

        assert!(Pending.holds_slot());
        assert!(Confirmed.holds_slot());
        assert!(InProgress.holds_slot());
        assert!(Completed.holds_slot());
        assert!(!Cancelled.holds_slot());
        assert!(!NoShow.holds_slot());
    }

    #[test]
    fn test_status_string_round_trip() {
        use AppointmentStatus::*;

        for status in [Pending, Confirmed, InProgress, Completed, Cancelled, NoShow] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>(), Ok(status));
        }
        assert!("archived".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn test_staff_branch_scoping() {
        let staff = Staff {
            id: "st-1".into(),
            user_id: "u-1".into(),
            salon_id: "sa-1".into(),
            branch_id: Some("br-1".into()),
            role: StaffRole::Stylist,
            specialization: None,
            commission_percentage: Rate::from_bps(4000),
            is_active: true,
            hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            created_at: Utc::now(),
        };

        assert!(staff.serves_branch("br-1"));
        assert!(!staff.serves_branch("br-2"));

        let floating = Staff {
            branch_id: None,
            ..staff
        };
        assert!(floating.serves_branch("br-2"));
    }

    #[test]
    fn test_commission_rule_serde_shape() {
        let rule = CommissionRule::Percentage(Rate::from_bps(3000));
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["commissionType"], "percentage");
        assert_eq!(json["commissionValue"], 3000);

        let fixed: CommissionRule =
            serde_json::from_value(serde_json::json!({
                "commissionType": "fixed",
                "commissionValue": 3000
            }))
            .unwrap();
        assert_eq!(fixed, CommissionRule::Fixed(Money::from_cents(3000)));
    }
}

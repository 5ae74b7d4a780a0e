//! # Validation Module
//!
//! Input validation utilities for Sheba Salon.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Caller (dashboard/API surface)                               │
//! │  ├── Basic format checks (empty, length)                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE — before any engine mutation                     │
//! │  ├── Field shape (ids, durations, rates)                               │
//! │  └── Ownership links (staff ∈ salon, service ∈ salon)                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store (constraints, unique indexes)                          │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A validation failure is always rejected synchronously, before the
//! availability index or the store is touched.

use crate::error::{ValidationError, ValidationResult};
use crate::money::{Money, Rate};
use crate::types::{Branch, Salon, Service, Staff};

/// Longest service the platform will schedule, in minutes (a full day).
pub const MAX_SERVICE_DURATION_MINUTES: u32 = 480;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates an entity id (UUID v4 string form).
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

/// Validates a display name (salon, branch, service).
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a service duration in minutes.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_SERVICE_DURATION_MINUTES (480)
pub fn validate_duration_minutes(minutes: u32) -> ValidationResult<()> {
    if minutes == 0 {
        return Err(ValidationError::MustBePositive {
            field: "duration_minutes".to_string(),
        });
    }

    if minutes > MAX_SERVICE_DURATION_MINUTES {
        return Err(ValidationError::OutOfRange {
            field: "duration_minutes".to_string(),
            min: 1,
            max: MAX_SERVICE_DURATION_MINUTES as i64,
        });
    }

    Ok(())
}

/// Validates a price.
///
/// ## Rules
/// - Must be non-negative (zero allowed: promotional services exist)
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a commission or fee percentage (0-100%).
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate.bps() > Rate::FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Rate::FULL_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Ownership Validators
// =============================================================================

/// Checks that a service belongs to the salon and is bookable.
pub fn validate_service_bookable(service: &Service, salon: &Salon) -> ValidationResult<()> {
    if service.salon_id != salon.id {
        return Err(ValidationError::WrongOwner {
            entity: "service".to_string(),
            id: service.id.clone(),
            owner: "salon".to_string(),
            owner_id: salon.id.clone(),
        });
    }

    if !service.is_active {
        return Err(ValidationError::NotBookable {
            entity: "service".to_string(),
            id: service.id.clone(),
            reason: "inactive".to_string(),
        });
    }

    validate_duration_minutes(service.duration_minutes)?;
    validate_price(service.price)?;

    Ok(())
}

/// Checks that a staff member belongs to the salon, serves the branch, and
/// is bookable.
pub fn validate_staff_bookable(
    staff: &Staff,
    salon: &Salon,
    branch_id: &str,
) -> ValidationResult<()> {
    if staff.salon_id != salon.id {
        return Err(ValidationError::WrongOwner {
            entity: "staff".to_string(),
            id: staff.id.clone(),
            owner: "salon".to_string(),
            owner_id: salon.id.clone(),
        });
    }

    if !staff.is_active {
        return Err(ValidationError::NotBookable {
            entity: "staff".to_string(),
            id: staff.id.clone(),
            reason: "inactive".to_string(),
        });
    }

    if !staff.serves_branch(branch_id) {
        return Err(ValidationError::WrongOwner {
            entity: "staff".to_string(),
            id: staff.id.clone(),
            owner: "branch".to_string(),
            owner_id: branch_id.to_string(),
        });
    }

    Ok(())
}

/// Checks that a branch belongs to the salon and is open for booking.
pub fn validate_branch_bookable(branch: &Branch, salon: &Salon) -> ValidationResult<()> {
    if branch.salon_id != salon.id {
        return Err(ValidationError::WrongOwner {
            entity: "branch".to_string(),
            id: branch.id.clone(),
            owner: "salon".to_string(),
            owner_id: salon.id.clone(),
        });
    }

    if !branch.is_active {
        return Err(ValidationError::NotBookable {
            entity: "branch".to_string(),
            id: branch.id.clone(),
            reason: "inactive".to_string(),
        });
    }

    if !salon.is_active {
        return Err(ValidationError::NotBookable {
            entity: "salon".to_string(),
            id: salon.id.clone(),
            reason: "inactive".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CommissionRule, SalonSize, SalonType, StaffRole};
    use chrono::{NaiveDate, Utc};

    fn salon(id: &str, active: bool) -> Salon {
        Salon {
            id: id.to_string(),
            name: "Zemen Beauty".to_string(),
            description: None,
            owner_id: "11111111-1111-4111-8111-111111111111".to_string(),
            phone: "+251911000000".to_string(),
            email: "hello@zemen.example".to_string(),
            address: "Bole Road".to_string(),
            city: "Addis Ababa".to_string(),
            country: "Ethiopia".to_string(),
            salon_type: SalonType::Beauty,
            size: SalonSize::Medium,
            commission_rate: Rate::from_bps(4000),
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn staff(salon_id: &str, branch_id: Option<&str>, active: bool) -> Staff {
        Staff {
            id: "staff-1".to_string(),
            user_id: "user-1".to_string(),
            salon_id: salon_id.to_string(),
            branch_id: branch_id.map(str::to_string),
            role: StaffRole::Stylist,
            specialization: None,
            commission_percentage: Rate::from_bps(4000),
            is_active: active,
            hire_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn service(salon_id: &str, active: bool) -> Service {
        Service {
            id: "service-1".to_string(),
            salon_id: salon_id.to_string(),
            category_id: "cat-1".to_string(),
            name: "Haircut".to_string(),
            description: None,
            duration_minutes: 45,
            price: Money::from_cents(45000),
            commission: CommissionRule::Percentage(Rate::from_bps(3000)),
            is_active: active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("staff_id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_id("staff_id", "").is_err());
        assert!(validate_id("staff_id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Haircut & Styling").is_ok());
        assert!(validate_name("").is_err());
        assert!(validate_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_duration() {
        assert!(validate_duration_minutes(30).is_ok());
        assert!(validate_duration_minutes(480).is_ok());
        assert!(validate_duration_minutes(0).is_err());
        assert!(validate_duration_minutes(481).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(Money::zero()).is_ok());
        assert!(validate_price(Money::from_cents(45000)).is_ok());
        assert!(validate_price(Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate("commission", Rate::from_bps(10000)).is_ok());
        assert!(validate_rate("commission", Rate::from_bps(10001)).is_err());
    }

    #[test]
    fn test_service_ownership() {
        let salon = salon("salon-1", true);
        assert!(validate_service_bookable(&service("salon-1", true), &salon).is_ok());
        assert!(validate_service_bookable(&service("salon-2", true), &salon).is_err());
        assert!(validate_service_bookable(&service("salon-1", false), &salon).is_err());
    }

    #[test]
    fn test_staff_branch_scope() {
        let salon = salon("salon-1", true);

        // Branch-scoped staff only serves its branch
        let scoped = staff("salon-1", Some("branch-1"), true);
        assert!(validate_staff_bookable(&scoped, &salon, "branch-1").is_ok());
        assert!(validate_staff_bookable(&scoped, &salon, "branch-2").is_err());

        // Unscoped staff serves any branch of the salon
        let floating = staff("salon-1", None, true);
        assert!(validate_staff_bookable(&floating, &salon, "branch-2").is_ok());

        assert!(validate_staff_bookable(&staff("salon-2", None, true), &salon, "branch-1").is_err());
        assert!(validate_staff_bookable(&staff("salon-1", None, false), &salon, "branch-1").is_err());
    }
}

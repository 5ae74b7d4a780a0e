//! # Error Types
//!
//! Domain-specific error types for sheba-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  sheba-core errors (this file)                                         │
//! │  ├── CoreError        - Scheduling/commission domain errors            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  sheba-engine errors (separate crate)                                  │
//! │  └── EngineError      - Orchestration + store failures                 │
//! │                                                                         │
//! │  sheba-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → caller              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (conflicting id, attempted interval)
//! 3. Errors are enum variants, never String
//! 4. Recoverable errors (`SlotConflict`, `IllegalTransition`) carry enough
//!    context for the caller to retry with different input

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::types::AppointmentStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Scheduling and commission domain errors.
///
/// Validation variants are rejected synchronously before any mutation;
/// `SlotConflict` and `IllegalTransition` are recoverable by the caller and
/// never leave the availability index corrupted.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A time interval with `start >= end`.
    ///
    /// ## When This Occurs
    /// - Booking request with a backwards or zero-length interval
    /// - End-time override earlier than the start
    /// - Working hours where closing does not follow opening
    #[error("Invalid interval on {date}: {start}..{end}")]
    InvalidInterval {
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    },

    /// The requested slot overlaps an existing active appointment.
    ///
    /// ## User Workflow
    /// ```text
    /// Book 10:15-10:45 for staff S
    ///      │
    ///      ▼
    /// Index probe finds 10:00-10:30 (appointment A) still active
    ///      │
    ///      ▼
    /// SlotConflict { conflicting_appointment_id: A, .. }
    ///      │
    ///      ▼
    /// UI offers `next_free` suggestions; the caller decides
    /// ```
    #[error("Slot {date} {start}..{end} for staff {staff_id} conflicts with appointment {conflicting_appointment_id}")]
    SlotConflict {
        staff_id: String,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        conflicting_appointment_id: String,
    },

    /// No gap of the requested width remains in the working day.
    #[error("No availability for staff {staff_id} on {date} for {duration_minutes} minutes")]
    NoAvailability {
        staff_id: String,
        date: NaiveDate,
        duration_minutes: u32,
    },

    /// The appointment state machine forbids the requested edge.
    #[error("Illegal transition for appointment {appointment_id}: {from} -> {to}")]
    IllegalTransition {
        appointment_id: String,
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    /// A commission rule that can never be applied (e.g. negative fixed
    /// amount, percentage above 100%).
    #[error("Invalid commission rule: {reason}")]
    InvalidCommissionRule { reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before scheduling logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A referenced entity does not exist or is inactive.
    #[error("{entity} {id} is not available for booking: {reason}")]
    NotBookable {
        entity: String,
        id: String,
        reason: String,
    },

    /// An entity belongs to a different salon/branch than the request.
    #[error("{entity} {id} does not belong to {owner} {owner_id}")]
    WrongOwner {
        entity: String,
        id: String,
        owner: String,
        owner_id: String,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::SlotConflict {
            staff_id: "staff-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            start: NaiveTime::from_hms_opt(10, 15, 0).unwrap(),
            end: NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
            conflicting_appointment_id: "appt-a".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Slot 2024-01-10 10:15:00..10:45:00 for staff staff-1 conflicts with appointment appt-a"
        );
    }

    #[test]
    fn test_illegal_transition_message() {
        let err = CoreError::IllegalTransition {
            appointment_id: "appt-1".to_string(),
            from: AppointmentStatus::Pending,
            to: AppointmentStatus::Completed,
        };
        assert_eq!(
            err.to_string(),
            "Illegal transition for appointment appt-1: pending -> completed"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "staff_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}

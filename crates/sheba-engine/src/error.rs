//! # Engine Error Types
//!
//! Error types for booking, reconciliation, and reporting operations.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Engine Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │     Domain      │  │     Store       │  │     Settlement          │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  SlotConflict   │  │  NotFound       │  │  OrphanPayment          │ │
//! │  │  IllegalTrans.  │  │  Duplicate      │  │                         │ │
//! │  │  NoAvailability │  │  Backend        │  │  (AmountMismatch is a   │ │
//! │  │  (via CoreError)│  │                 │  │   flagged outcome, not  │ │
//! │  └─────────────────┘  └─────────────────┘  │   an error)             │ │
//! │                                            └─────────────────────────┘ │
//! │                                                                         │
//! │  Recoverable errors never leave the availability index corrupted:     │
//! │  every failed mutation sequence rolls back before returning.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use sheba_core::{AppointmentStatus, CoreError};

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Store Error
// =============================================================================

/// Failures crossing the persistence boundary.
///
/// Concrete stores (SQLite, in-memory) map their native errors into these
/// variants; the engine never sees a backend-specific type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found for an update that requires it to exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Insert collided with an existing row.
    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },

    /// Backend failure (connection, query, serialization).
    #[error("Store backend error: {0}")]
    Backend(String),
}

// =============================================================================
// Engine Error
// =============================================================================

/// Engine operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Domain rule violation from sheba-core (slot conflicts, illegal
    /// transitions, invalid intervals, validation failures).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persistence boundary failure.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A settlement callback arrived for an unknown appointment.
    #[error("Orphan payment: no appointment {appointment_id}")]
    OrphanPayment { appointment_id: String },

    /// Reschedule requested for an appointment whose status no longer
    /// holds a bookable slot.
    #[error("Appointment {appointment_id} is {status}, cannot reschedule")]
    NotReschedulable {
        appointment_id: String,
        status: AppointmentStatus,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::OrphanPayment {
            appointment_id: "appt-9".to_string(),
        };
        assert_eq!(err.to_string(), "Orphan payment: no appointment appt-9");

        let err = EngineError::not_found("Service", "svc-1");
        assert_eq!(err.to_string(), "Service not found: svc-1");
    }

    #[test]
    fn test_core_error_is_transparent() {
        let core = CoreError::NoAvailability {
            staff_id: "staff-1".to_string(),
            date: chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            duration_minutes: 30,
        };
        let engine: EngineError = core.into();
        assert_eq!(
            engine.to_string(),
            "No availability for staff staff-1 on 2024-01-10 for 30 minutes"
        );
    }
}

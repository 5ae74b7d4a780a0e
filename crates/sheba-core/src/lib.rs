//! # sheba-core: Pure Business Logic for Sheba Salon
//!
//! This crate is the **heart** of the Sheba scheduling and commission
//! engine. It contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sheba Salon Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Dashboard / Booking Frontend                    │   │
//! │  │    Calendar UI ──► Booking UI ──► Checkout ──► Stat Cards      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON (ts-rs generated types)           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 sheba-engine (orchestration)                    │   │
//! │  │    book, transition, reschedule, reconcile, report             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ sheba-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    slot    │  │availability│ │   │
//! │  │   │  Salon    │  │   Money   │  │    Slot    │  │  ordered   │ │   │
//! │  │   │Appointment│  │   Rate    │  │  overlaps  │  │   index    │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐                 │   │
//! │  │   │commission │  │ analytics │  │ validation │                 │   │
//! │  │   │  splits   │  │   folds   │  │   rules    │                 │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘                 │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Salon, Staff, Service, Appointment, Payment…)
//! - [`money`] - Money and Rate types with integer arithmetic (no floats!)
//! - [`slot`] - Temporal slot model with half-open overlap arithmetic
//! - [`availability`] - Per-staff ordered index of booked intervals
//! - [`commission`] - Split computation and the append-only split ledger row
//! - [`analytics`] - Window folds producing the dashboard contract
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system, and clock access are FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod analytics;
pub mod availability;
pub mod commission;
pub mod error;
pub mod money;
pub mod slot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use sheba_core::Money` instead of
// `use sheba_core::money::Money`

pub use availability::{AvailabilityIndex, BookedSlot};
pub use commission::{compute_split, CommissionSplit, SplitAmounts, SplitEntry};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use slot::{Slot, WorkingHours};
pub use types::*;

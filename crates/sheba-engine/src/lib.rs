//! # sheba-engine: Scheduling & Settlement Engine
//!
//! Orchestrates the pure logic in `sheba-core` over an injected persistence
//! boundary: booking, state transitions, rescheduling, settlement
//! reconciliation, and reporting windows.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Sheba Salon Architecture                           │
//! │                                                                         │
//! │  Dashboard / Booking Frontend                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ sheba-engine (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────┐  ┌────────────┐  ┌────────────┐               │   │
//! │  │   │  booking   │  │ reconcile  │  │ reporting  │               │   │
//! │  │   │ book       │  │ settle     │  │ dashboard  │               │   │
//! │  │   │ transition │  │ finalize   │  │ revenue    │               │   │
//! │  │   │ reschedule │  │ reverse    │  │ perf rows  │               │   │
//! │  │   └─────┬──────┘  └─────┬──────┘  └─────┬──────┘               │   │
//! │  │         │               │               │                       │   │
//! │  │   ┌─────┴───────────────┴───────────────┴──────┐               │   │
//! │  │   │  locks (per-staff)  │  config  │  store    │               │   │
//! │  │   └─────────────────────┴──────────┴─────┬─────┘               │   │
//! │  └──────────────────────────────────────────┼─────────────────────┘   │
//! │                                             │ SalonStore trait         │
//! │                        ┌────────────────────┴────────────────────┐     │
//! │                        │ sheba-db (SQLite)   │  InMemoryStore    │     │
//! │                        └─────────────────────┴───────────────────┘     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`booking`] - Booking engine: book, transition, reschedule, next_free
//! - [`reconcile`] - Settlement callbacks, finalize-once commission, refunds
//! - [`reporting`] - Analytics windows over the store
//! - [`locks`] - Keyed per-staff serialization
//! - [`store`] - The `SalonStore` persistence boundary + in-memory reference
//! - [`config`] - Engine configuration (TOML)
//! - [`error`] - Engine and store error types
//!
//! ## Concurrency Model
//!
//! Bookings for distinct staff members run fully in parallel; requests for
//! the same staff member serialize on a keyed mutex held only across the
//! check-and-insert, never across external I/O. Commission finalization
//! needs no lock at all: it is an atomic finalize-once compare-and-set at
//! the store.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod booking;
pub mod config;
pub mod error;
pub mod locks;
pub mod reconcile;
pub mod reporting;
pub mod store;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use booking::{BookingEngine, BookingRequest, RescheduleRequest};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, StoreError, StoreResult};
pub use locks::StaffLocks;
pub use reconcile::{PaymentReconciler, ReconcileOutcome, SettlementCallback};
pub use reporting::ReportingService;
pub use store::{InMemoryStore, SalonStore};

//! # sheba-db: Database Layer for Sheba Salon
//!
//! This crate provides database access for the Sheba scheduling and
//! commission engine. It uses SQLite with sqlx for async operations and
//! implements the engine's `SalonStore` boundary.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sheba Salon Data Flow                             │
//! │                                                                         │
//! │  sheba-engine (book / reconcile / report)                              │
//! │       │                                                                 │
//! │       │ SalonStore trait                                                │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     sheba-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (catalog.rs,  │    │  (embedded)  │  │   │
//! │  │   │               │    │  appointment, │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  payment)     │    │ 001_init.sql │  │   │
//! │  │   │ WAL mode      │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (sheba.db)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations and the `SalonStore` impl
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sheba_db::{Database, DbConfig};
//! use sheba_engine::{BookingEngine, EngineConfig, SalonStore};
//!
//! let db = Database::new(DbConfig::new("path/to/sheba.db")).await?;
//! let store: Arc<dyn SalonStore> = Arc::new(db);
//! let engine = BookingEngine::new(store, EngineConfig::default());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::appointment::AppointmentRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::payment::{PaymentRepository, SplitRepository};

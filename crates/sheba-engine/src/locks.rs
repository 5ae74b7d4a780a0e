//! # Per-Staff Serialization
//!
//! Keyed mutexes guaranteeing that check-and-insert sequences for the same
//! staff member never interleave.
//!
//! ## Concurrency Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Booking Concurrency                                 │
//! │                                                                         │
//! │  Request A (staff-1) ──► acquire(staff-1) ──► check ──► insert ──► ✓   │
//! │  Request B (staff-2) ──► acquire(staff-2) ──► check ──► insert ──► ✓   │
//! │                          (runs fully in parallel with A)               │
//! │                                                                         │
//! │  Request C (staff-1) ──► acquire(staff-1) ──► ...waits for A...        │
//! │                                                                         │
//! │  RULE: the lock covers check-and-insert only. It is NEVER held         │
//! │  across gateway calls, notifications, or any external I/O.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rescheduling across two staff members acquires both locks in id order,
//! so two concurrent swaps can never deadlock.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of per-staff mutexes, created lazily on first use.
///
/// Lock objects are never evicted: a salon's staff roster is small and a
/// stale entry costs one `Arc<Mutex>` of memory.
#[derive(Debug, Default)]
pub struct StaffLocks {
    registry: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl StaffLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        StaffLocks {
            registry: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the lock object for one staff member.
    async fn entry(&self, staff_id: &str) -> Arc<Mutex<()>> {
        let mut registry = self.registry.lock().await;
        registry
            .entry(staff_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquires the mutex for one staff member. Held for the duration of a
    /// check-and-insert, then dropped.
    pub async fn acquire(&self, staff_id: &str) -> OwnedMutexGuard<()> {
        self.entry(staff_id).await.lock_owned().await
    }

    /// Acquires the mutexes for two staff members in deterministic (id)
    /// order. When both ids are equal a single guard is returned.
    pub async fn acquire_pair(
        &self,
        first_id: &str,
        second_id: &str,
    ) -> (OwnedMutexGuard<()>, Option<OwnedMutexGuard<()>>) {
        if first_id == second_id {
            return (self.acquire(first_id).await, None);
        }

        // Id order, not argument order: concurrent swaps agree on it
        let (lo, hi) = if first_id < second_id {
            (first_id, second_id)
        } else {
            (second_id, first_id)
        };

        let lo_guard = self.acquire(lo).await;
        let hi_guard = self.acquire(hi).await;
        (lo_guard, Some(hi_guard))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

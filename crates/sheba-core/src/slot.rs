//! # Temporal Slot Model
//!
//! A `Slot` is a staff- and branch-scoped time interval on a calendar date.
//! It is the unit the availability index stores and the booking engine
//! reasons about.
//!
//! ## Half-Open Intervals
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Intervals are [start, end) — the end minute is NOT occupied.           │
//! │                                                                         │
//! │  10:00 ────────── 10:30 ────────── 11:00                                │
//! │  [══════ A ══════)                                                      │
//! │                   [══════ B ══════)                                     │
//! │                                                                         │
//! │  A = 10:00..10:30 and B = 10:30..11:00 do NOT overlap:                  │
//! │  back-to-back bookings are the normal case in a salon day.              │
//! │                                                                         │
//! │  C = 10:15..10:45 overlaps A (10:15 < 10:30 && 10:00 < 10:45)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pure value types only: no clock access, no side effects. The only
//! failure mode is invalid input (`start >= end`).

use chrono::{Duration, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

// =============================================================================
// Slot
// =============================================================================

/// A time interval scoped to a branch and staff member.
///
/// Two slots can only conflict when they share a staff member and a date;
/// the branch is carried for booking context, not for the overlap test
/// (capacity is per staff, not per branch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Slot {
    #[ts(as = "String")]
    pub date: NaiveDate,
    #[ts(as = "String")]
    pub start: NaiveTime,
    #[ts(as = "String")]
    pub end: NaiveTime,
    pub staff_id: String,
    pub branch_id: String,
}

impl Slot {
    /// Creates a slot, rejecting backwards and zero-length intervals.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{NaiveDate, NaiveTime};
    /// use sheba_core::slot::Slot;
    ///
    /// let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    /// let t10 = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
    /// let t1030 = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
    ///
    /// assert!(Slot::new(date, t10, t1030, "staff-1", "branch-1").is_ok());
    /// assert!(Slot::new(date, t1030, t10, "staff-1", "branch-1").is_err());
    /// assert!(Slot::new(date, t10, t10, "staff-1", "branch-1").is_err());
    /// ```
    pub fn new(
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        staff_id: impl Into<String>,
        branch_id: impl Into<String>,
    ) -> CoreResult<Self> {
        if start >= end {
            return Err(CoreError::InvalidInterval { date, start, end });
        }

        Ok(Slot {
            date,
            start,
            end,
            staff_id: staff_id.into(),
            branch_id: branch_id.into(),
        })
    }

    /// Builds a slot from a start time and a duration in minutes.
    ///
    /// Fails with `InvalidInterval` when the duration is zero or the end
    /// would run past midnight (a salon working day never wraps).
    pub fn with_duration(
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: u32,
        staff_id: impl Into<String>,
        branch_id: impl Into<String>,
    ) -> CoreResult<Self> {
        let end = start
            .overflowing_add_signed(Duration::minutes(duration_minutes as i64))
            .0;
        // overflowing_add wraps past midnight; a wrapped end lands at or
        // before the start and is rejected by the constructor
        Slot::new(date, start, end, staff_id, branch_id)
    }

    /// True iff both slots occupy the same staff member's time: same date,
    /// same staff, half-open intervals intersect.
    ///
    /// Zero-length intervals cannot be constructed, so the strict
    /// comparison below never reports a phantom overlap for them.
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.staff_id == other.staff_id
            && self.date == other.date
            && self.start < other.end
            && other.start < self.end
    }

    /// True iff the given time falls inside `[start, end)`.
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time < self.end
    }

    /// Interval width in minutes.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

// =============================================================================
// Working Hours
// =============================================================================

/// The bookable window of a working day.
///
/// `next_free` never proposes a slot outside these bounds; existing
/// bookings outside them (manual overrides) still block their interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct WorkingHours {
    #[ts(as = "String")]
    pub opens: NaiveTime,
    #[ts(as = "String")]
    pub closes: NaiveTime,
}

impl WorkingHours {
    /// Creates working hours, rejecting `opens >= closes`.
    pub fn new(opens: NaiveTime, closes: NaiveTime) -> CoreResult<Self> {
        if opens >= closes {
            // Reuse the interval error; the date is irrelevant for hours
            return Err(CoreError::InvalidInterval {
                date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default(),
                start: opens,
                end: closes,
            });
        }
        Ok(WorkingHours { opens, closes })
    }

    /// Minutes between opening and closing.
    pub fn span_minutes(&self) -> i64 {
        (self.closes - self.opens).num_minutes()
    }
}

impl Default for WorkingHours {
    /// 09:00-19:00, the platform-wide default working day.
    fn default() -> Self {
        WorkingHours {
            opens: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            closes: NaiveTime::from_hms_opt(19, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

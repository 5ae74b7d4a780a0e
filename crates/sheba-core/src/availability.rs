//! # Availability Index
//!
//! Per-staff ordered index of booked intervals, the structure the booking
//! engine consults before committing any appointment.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     AvailabilityIndex                                   │
//! │                                                                         │
//! │  staff-1 ──► BTreeMap keyed by (date, start)                            │
//! │              (2024-01-10, 09:00) ──► 09:00..09:45  appt-12              │
//! │              (2024-01-10, 10:00) ──► 10:00..10:30  appt-17              │
//! │              (2024-01-11, 13:00) ──► 13:00..14:00  appt-21              │
//! │                                                                         │
//! │  staff-2 ──► BTreeMap keyed by (date, start)                            │
//! │              ...                                                        │
//! │                                                                         │
//! │  INVARIANT: intervals under one staff key are pairwise disjoint.        │
//! │  Because they are disjoint and ordered, an overlap test needs only      │
//! │  the predecessor of the candidate's end — one O(log n) probe, never     │
//! │  a linear scan.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency Contract
//! The index itself is a plain data structure. Callers must serialize
//! mutations per staff key (the engine holds a per-staff mutex across each
//! check-and-insert); reads from other staff keys may proceed in parallel.

use chrono::{NaiveDate, NaiveTime};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound::{Excluded, Included};

use crate::error::{CoreError, CoreResult};
use crate::slot::{Slot, WorkingHours};

/// Upper sentinel for a whole-day range scan.
fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN)
}

// =============================================================================
// Booked Slot
// =============================================================================

/// An index entry: the interval plus the appointment that holds it.
///
/// Carrying the appointment id lets `SlotConflict` name the collision so
/// callers can surface "conflicts with appointment X" instead of a bare
/// rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookedSlot {
    pub slot: Slot,
    pub appointment_id: String,
}

// =============================================================================
// Availability Index
// =============================================================================

/// Per-staff, per-date sorted structure of booked intervals.
///
/// Holds only active appointments (cancelled and no-show entries are
/// removed, freeing their interval for rebooking).
#[derive(Debug, Default)]
pub struct AvailabilityIndex {
    by_staff: HashMap<String, BTreeMap<(NaiveDate, NaiveTime), BookedSlot>>,
}

impl AvailabilityIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        AvailabilityIndex {
            by_staff: HashMap::new(),
        }
    }

    /// Finds the booked entry overlapping the candidate slot, if any.
    ///
    /// ## Why the predecessor probe is enough
    /// Booked intervals for one staff member are pairwise disjoint. Any
    /// entry overlapping `[start, end)` must itself start before `end`;
    /// among those, the latest-starting one is the only possible match —
    /// every earlier one ends at or before the next one's start.
    pub fn conflicting(&self, slot: &Slot) -> Option<&BookedSlot> {
        let day = self.by_staff.get(&slot.staff_id)?;

        let (_, candidate) = day
            .range((
                Included((slot.date, NaiveTime::MIN)),
                Excluded((slot.date, slot.end)),
            ))
            .next_back()?;

        if candidate.slot.end > slot.start {
            Some(candidate)
        } else {
            None
        }
    }

    /// O(log n) free check for a candidate slot.
    pub fn is_free(&self, slot: &Slot) -> bool {
        self.conflicting(slot).is_none()
    }

    /// Books an interval for an appointment.
    ///
    /// Re-checks the overlap invariant and fails with `SlotConflict`
    /// (carrying the colliding appointment id) rather than corrupting the
    /// index. Callers that already probed `is_free` under the staff lock
    /// will never see the error path.
    pub fn insert(&mut self, slot: Slot, appointment_id: impl Into<String>) -> CoreResult<()> {
        if let Some(existing) = self.conflicting(&slot) {
            return Err(CoreError::SlotConflict {
                staff_id: slot.staff_id.clone(),
                date: slot.date,
                start: slot.start,
                end: slot.end,
                conflicting_appointment_id: existing.appointment_id.clone(),
            });
        }

        let key = (slot.date, slot.start);
        self.by_staff
            .entry(slot.staff_id.clone())
            .or_default()
            .insert(
                key,
                BookedSlot {
                    slot,
                    appointment_id: appointment_id.into(),
                },
            );
        Ok(())
    }

    /// Removes the entry starting at (date, start) for a staff member,
    /// freeing the interval for rebooking. Returns the removed entry, or
    /// `None` when nothing was booked there.
    pub fn remove(
        &mut self,
        staff_id: &str,
        date: NaiveDate,
        start: NaiveTime,
    ) -> Option<BookedSlot> {
        let day = self.by_staff.get_mut(staff_id)?;
        let removed = day.remove(&(date, start));
        if day.is_empty() {
            self.by_staff.remove(staff_id);
        }
        removed
    }

    /// Finds the earliest free gap of `duration_minutes` within working
    /// hours on the given date.
    ///
    /// ## Algorithm
    /// ```text
    /// cursor = opens
    /// for each booked interval (ordered by start):
    ///     skip intervals ending at or before cursor
    ///     gap before this interval wide enough?  → done
    ///     otherwise cursor = max(cursor, interval.end)
    /// trailing gap before closing wide enough?   → done
    /// otherwise the working day is exhausted     → NoAvailability
    /// ```
    ///
    /// The result is always the earliest slot `is_free` would accept;
    /// bookings placed outside working hours still block their interval.
    pub fn next_free(
        &self,
        staff_id: &str,
        branch_id: &str,
        date: NaiveDate,
        duration_minutes: u32,
        hours: &WorkingHours,
    ) -> CoreResult<Slot> {
        let exhausted = || CoreError::NoAvailability {
            staff_id: staff_id.to_string(),
            date,
            duration_minutes,
        };

        if duration_minutes == 0 || duration_minutes as i64 > hours.span_minutes() {
            return Err(exhausted());
        }

        let mut cursor = hours.opens;

        if let Some(day) = self.by_staff.get(staff_id) {
            let day_range = day.range((
                Included((date, NaiveTime::MIN)),
                Included((date, end_of_day())),
            ));

            for (_, booked) in day_range {
                if booked.slot.end <= cursor {
                    // Entirely before the cursor (e.g. an early booking
                    // placed before opening time)
                    continue;
                }
                if booked.slot.start >= cursor
                    && (booked.slot.start - cursor).num_minutes() >= duration_minutes as i64
                {
                    break;
                }
                cursor = cursor.max(booked.slot.end);
            }
        }

        if (hours.closes - cursor).num_minutes() >= duration_minutes as i64 {
            Slot::with_duration(date, cursor, duration_minutes, staff_id, branch_id)
        } else {
            Err(exhausted())
        }
    }

    /// Number of booked intervals held for one staff member.
    pub fn booked_count(&self, staff_id: &str) -> usize {
        self.by_staff.get(staff_id).map_or(0, |day| day.len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: NaiveTime, end: NaiveTime) -> Slot {
        Slot::new(date(), start, end, "staff-1", "branch-1").unwrap()
    }

    fn hours() -> WorkingHours {
        WorkingHours::new(t(9, 0), t(19, 0)).unwrap()
    }

    #[test]
    fn test_insert_and_conflict_scenario() {
        // Spec scenario: A at 10:00-10:30; 10:15-10:45 conflicts with A;
        // 10:30-11:00 succeeds.
        let mut index = AvailabilityIndex::new();
        index.insert(slot(t(10, 0), t(10, 30)), "appt-a").unwrap();

        let overlapping = slot(t(10, 15), t(10, 45));
        assert!(!index.is_free(&overlapping));
        let err = index.insert(overlapping, "appt-b").unwrap_err();
        match err {
            CoreError::SlotConflict {
                conflicting_appointment_id,
                ..
            } => assert_eq!(conflicting_appointment_id, "appt-a"),
            other => panic!("expected SlotConflict, got {other}"),
        }

        let adjacent = slot(t(10, 30), t(11, 0));
        assert!(index.is_free(&adjacent));
        index.insert(adjacent, "appt-c").unwrap();
        assert_eq!(index.booked_count("staff-1"), 2);
    }

    #[test]
    fn test_conflict_detects_earlier_long_booking() {
        // The predecessor probe must catch an interval that starts well
        // before the candidate but swallows it.
        let mut index = AvailabilityIndex::new();
        index.insert(slot(t(9, 0), t(12, 0)), "appt-long").unwrap();

        assert!(!index.is_free(&slot(t(10, 0), t(10, 30))));
        assert!(index.is_free(&slot(t(12, 0), t(12, 30))));
    }

    #[test]
    fn test_remove_frees_interval() {
        let mut index = AvailabilityIndex::new();
        index.insert(slot(t(10, 0), t(10, 30)), "appt-a").unwrap();

        let removed = index.remove("staff-1", date(), t(10, 0)).unwrap();
        assert_eq!(removed.appointment_id, "appt-a");

        // Same interval can now be rebooked
        assert!(index.is_free(&slot(t(10, 0), t(10, 30))));
        assert!(index.remove("staff-1", date(), t(10, 0)).is_none());
    }

    #[test]
    fn test_staff_and_dates_are_independent() {
        let mut index = AvailabilityIndex::new();
        index.insert(slot(t(10, 0), t(10, 30)), "appt-a").unwrap();

        let other_staff = Slot::new(date(), t(10, 0), t(10, 30), "staff-2", "branch-1").unwrap();
        assert!(index.is_free(&other_staff));

        let next_day = Slot::new(
            date().succ_opt().unwrap(),
            t(10, 0),
            t(10, 30),
            "staff-1",
            "branch-1",
        )
        .unwrap();
        assert!(index.is_free(&next_day));
    }

    #[test]
    fn test_next_free_empty_day_starts_at_opening() {
        let index = AvailabilityIndex::new();
        let found = index
            .next_free("staff-1", "branch-1", date(), 30, &hours())
            .unwrap();
        assert_eq!(found.start, t(9, 0));
        assert_eq!(found.end, t(9, 30));
    }

    #[test]
    fn test_next_free_skips_busy_prefix() {
        let mut index = AvailabilityIndex::new();
        index.insert(slot(t(9, 0), t(9, 45)), "a").unwrap();
        index.insert(slot(t(10, 0), t(11, 0)), "b").unwrap();

        // 30-minute gap between 9:45 and 10:00 is too narrow for 45 minutes
        let found = index
            .next_free("staff-1", "branch-1", date(), 45, &hours())
            .unwrap();
        assert_eq!(found.start, t(11, 0));

        // ...but wide enough for 15
        let found = index
            .next_free("staff-1", "branch-1", date(), 15, &hours())
            .unwrap();
        assert_eq!(found.start, t(9, 45));
    }

    #[test]
    fn test_next_free_result_is_always_free() {
        let mut index = AvailabilityIndex::new();
        index.insert(slot(t(9, 0), t(9, 30)), "a").unwrap();
        index.insert(slot(t(9, 30), t(10, 15)), "b").unwrap();
        index.insert(slot(t(13, 0), t(14, 0)), "c").unwrap();

        for duration in [15u32, 30, 45, 60, 120] {
            let found = index
                .next_free("staff-1", "branch-1", date(), duration, &hours())
                .unwrap();
            assert!(index.is_free(&found), "next_free returned a busy slot");
            assert_eq!(found.duration_minutes(), duration as i64);

            // Earliest: no free slot of the same width starts earlier
            let mut probe = hours().opens;
            while probe < found.start {
                let candidate =
                    Slot::with_duration(date(), probe, duration, "staff-1", "branch-1").unwrap();
                assert!(
                    !index.is_free(&candidate),
                    "slot at {probe} was free but next_free returned {}",
                    found.start
                );
                probe += chrono::Duration::minutes(5);
            }
        }
    }

    #[test]
    fn test_next_free_exhausted_day() {
        let mut index = AvailabilityIndex::new();
        index.insert(slot(t(9, 0), t(18, 45)), "marathon").unwrap();

        let err = index
            .next_free("staff-1", "branch-1", date(), 30, &hours())
            .unwrap_err();
        assert!(matches!(err, CoreError::NoAvailability { .. }));

        // 15 minutes still fit before closing
        let found = index
            .next_free("staff-1", "branch-1", date(), 15, &hours())
            .unwrap();
        assert_eq!(found.start, t(18, 45));
    }

    #[test]
    fn test_next_free_ignores_other_days_bookings() {
        let mut index = AvailabilityIndex::new();
        let tomorrow = date().succ_opt().unwrap();
        index
            .insert(
                Slot::new(tomorrow, t(9, 0), t(19, 0), "staff-1", "branch-1").unwrap(),
                "tomorrow-full",
            )
            .unwrap();

        let found = index
            .next_free("staff-1", "branch-1", date(), 60, &hours())
            .unwrap();
        assert_eq!(found.start, t(9, 0));
    }

    #[test]
    fn test_next_free_rejects_degenerate_durations() {
        let index = AvailabilityIndex::new();
        assert!(index
            .next_free("staff-1", "branch-1", date(), 0, &hours())
            .is_err());
        // Longer than the whole working day
        assert!(index
            .next_free("staff-1", "branch-1", date(), 601, &hours())
            .is_err());
    }
}

//! Free slot computation from busy intervals.
//!
//! Two policies are offered. [`free_gaps`] returns the maximal free spans of the
//! window that are at least as long as the requested duration; [`grid_slots`]
//! steps through the window in duration-sized increments and keeps every
//! candidate that no busy interval overlaps.

use chrono::{DateTime, Utc};

use crate::models::{Availability, BusyInterval, Slot, SlotDuration, SlotPolicy, TimeWindow};

/// Clip busy intervals to the window, dropping empty ones and those entirely outside.
///
/// Returns the intervals sorted by `(start, end)`.
fn clip_to_window(busy: &[BusyInterval], window: &TimeWindow) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy
        .iter()
        .filter(|b| b.start < b.end)
        .filter(|b| b.start < window.end() && b.end > window.start())
        .map(|b| (b.start.max(window.start()), b.end.min(window.end())))
        .collect();

    intervals.sort_by_key(|&(start, end)| (start, end));
    intervals
}

/// Maximal free gaps of at least `duration` within the window.
///
/// Gaps are not split into duration-sized pieces. Overlapping and unsorted busy
/// intervals are tolerated.
pub fn free_gaps(busy: &[BusyInterval], window: &TimeWindow, duration: SlotDuration) -> Vec<Slot> {
    let min = duration.as_delta();
    let mut gaps = Vec::new();
    let mut cursor = window.start();

    for (busy_start, busy_end) in clip_to_window(busy, window) {
        if busy_start > cursor && busy_start - cursor >= min {
            gaps.push(Slot::new(cursor, busy_start));
        }
        cursor = cursor.max(busy_end);
    }

    if window.end() > cursor && window.end() - cursor >= min {
        gaps.push(Slot::new(cursor, window.end()));
    }

    gaps
}

/// Fixed-length candidates at `start + k * duration` that no busy interval overlaps.
///
/// The last candidate ends at or before the window end. Busy order is irrelevant.
pub fn grid_slots(busy: &[BusyInterval], window: &TimeWindow, duration: SlotDuration) -> Vec<Slot> {
    let step = duration.as_delta();
    let mut slots = Vec::new();
    let mut current = window.start();

    while let Some(candidate_end) = current.checked_add_signed(step) {
        if candidate_end > window.end() {
            break;
        }
        if !busy.iter().any(|b| b.overlaps(current, candidate_end)) {
            slots.push(Slot::new(current, candidate_end));
        }
        current = candidate_end;
    }

    slots
}

/// Run the selected policy
pub fn compute(
    policy: SlotPolicy,
    busy: &[BusyInterval],
    window: &TimeWindow,
    duration: SlotDuration,
) -> Availability {
    let slots = match policy {
        SlotPolicy::Gaps => free_gaps(busy, window, duration),
        SlotPolicy::Grid => grid_slots(busy, window, duration),
    };

    tracing::debug!(
        policy = %policy,
        busy = busy.len(),
        slots = slots.len(),
        "Computed availability"
    );

    Availability {
        policy,
        duration,
        slots,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, h, m, 0).unwrap()
    }

    fn window(from: (u32, u32), to: (u32, u32)) -> TimeWindow {
        TimeWindow::new(at(from.0, from.1), at(to.0, to.1)).unwrap()
    }

    fn busy(from: (u32, u32), to: (u32, u32)) -> BusyInterval {
        BusyInterval::new(at(from.0, from.1), at(to.0, to.1))
    }

    fn minutes(m: i64) -> SlotDuration {
        SlotDuration::from_minutes(m).unwrap()
    }

    #[test]
    fn test_gaps_after_short_busy_block() {
        let slots = free_gaps(&[busy((9, 30), (10, 0))], &window((9, 0), (12, 0)), minutes(60));
        assert_eq!(slots, vec![Slot::new(at(10, 0), at(12, 0))]);
    }

    #[test]
    fn test_gaps_empty_calendar_is_whole_window() {
        let w = window((9, 0), (12, 0));
        assert_eq!(free_gaps(&[], &w, minutes(60)), vec![Slot::new(at(9, 0), at(12, 0))]);
        assert!(free_gaps(&[], &w, minutes(240)).is_empty());
    }

    #[test]
    fn test_gaps_busy_covering_window() {
        let w = window((9, 0), (12, 0));
        assert!(free_gaps(&[busy((9, 0), (12, 0))], &w, minutes(15)).is_empty());
        assert!(free_gaps(&[busy((8, 0), (13, 0))], &w, minutes(15)).is_empty());
    }

    #[test]
    fn test_gaps_unsorted_and_overlapping() {
        let intervals = [
            busy((14, 0), (15, 0)),
            busy((10, 0), (11, 30)),
            busy((11, 0), (12, 0)),
            busy((10, 30), (10, 45)),
        ];
        let slots = free_gaps(&intervals, &window((9, 0), (17, 0)), minutes(60));
        assert_eq!(
            slots,
            vec![
                Slot::new(at(9, 0), at(10, 0)),
                Slot::new(at(12, 0), at(14, 0)),
                Slot::new(at(15, 0), at(17, 0)),
            ]
        );
    }

    #[test]
    fn test_gaps_skip_short_spans() {
        let intervals = [busy((9, 30), (10, 0)), busy((10, 20), (11, 0))];
        let slots = free_gaps(&intervals, &window((9, 0), (12, 0)), minutes(30));
        assert_eq!(
            slots,
            vec![Slot::new(at(9, 0), at(9, 30)), Slot::new(at(11, 0), at(12, 0))]
        );
    }

    #[test]
    fn test_gaps_ignore_busy_outside_window() {
        let intervals = [busy((7, 0), (8, 0)), busy((13, 0), (14, 0)), busy((8, 30), (9, 15))];
        let slots = free_gaps(&intervals, &window((9, 0), (12, 0)), minutes(60));
        assert_eq!(slots, vec![Slot::new(at(9, 15), at(12, 0))]);
    }

    #[test]
    fn test_gaps_ignore_degenerate_busy() {
        let inverted = BusyInterval::new(at(11, 0), at(10, 0));
        let slots = free_gaps(&[inverted, busy((10, 0), (10, 0))], &window((9, 0), (12, 0)), minutes(60));
        assert_eq!(slots, vec![Slot::new(at(9, 0), at(12, 0))]);
    }

    #[test]
    fn test_grid_full_window() {
        let slots = grid_slots(&[], &window((9, 0), (12, 0)), minutes(60));
        assert_eq!(
            slots,
            vec![
                Slot::new(at(9, 0), at(10, 0)),
                Slot::new(at(10, 0), at(11, 0)),
                Slot::new(at(11, 0), at(12, 0)),
            ]
        );
    }

    #[test]
    fn test_grid_drops_partial_tail() {
        let slots = grid_slots(&[], &window((9, 0), (10, 40)), minutes(30));
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.last().unwrap().end, at(10, 30));
    }

    #[test]
    fn test_grid_excludes_strict_overlaps_only() {
        let intervals = [busy((9, 30), (10, 0)), busy((11, 0), (11, 0))];
        let slots = grid_slots(&intervals, &window((9, 0), (12, 0)), minutes(30));
        assert_eq!(
            slots.iter().map(|s| s.start).collect::<Vec<_>>(),
            vec![at(9, 0), at(10, 0), at(10, 30), at(11, 0), at(11, 30)]
        );
    }

    #[test]
    fn test_grid_window_shorter_than_duration() {
        assert!(grid_slots(&[], &window((9, 0), (9, 45)), minutes(60)).is_empty());
    }

    #[test]
    fn test_compute_selects_policy() {
        let w = window((9, 0), (12, 0));
        let intervals = [busy((9, 30), (10, 0))];

        let gaps = compute(SlotPolicy::Gaps, &intervals, &w, minutes(60));
        assert_eq!(gaps.policy, SlotPolicy::Gaps);
        assert_eq!(gaps.slots, vec![Slot::new(at(10, 0), at(12, 0))]);

        let grid = compute(SlotPolicy::Grid, &intervals, &w, minutes(60));
        assert_eq!(grid.policy, SlotPolicy::Grid);
        assert_eq!(
            grid.slots,
            vec![Slot::new(at(10, 0), at(11, 0)), Slot::new(at(11, 0), at(12, 0))]
        );
    }
}

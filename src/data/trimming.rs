//! Interval algebra for "keep" ranges on the elapsed-time axis.
//!
//! The operator selects one or more intervals of the recording to keep; the
//! trimmed dataset is the union of those intervals. Intervals are closed on
//! both ends and may be authored in either order (start after end), so they
//! are normalized before use and merged into a minimal sorted cover.

use serde::{Deserialize, Serialize};

use crate::data::session::{ChannelRow, SessionData};

/// A single kept range on the elapsed-time axis. Closed on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// The same interval with `start <= end`.
    pub fn normalized(self) -> Self {
        if self.start <= self.end {
            self
        } else {
            Self {
                start: self.end,
                end: self.start,
            }
        }
    }

    /// Closed-interval membership test.
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t <= self.end
    }
}

/// Normalize every interval so `start <= end`, preserving order otherwise.
pub fn normalize(intervals: &[Interval]) -> Vec<Interval> {
    intervals.iter().map(|iv| iv.normalized()).collect()
}

/// Merge normalized intervals into a minimal, sorted, non-overlapping cover.
///
/// Sorts by start ascending, then folds left to right: interval B merges
/// into the running interval A when `B.start <= A.end` (touching counts as
/// overlapping), taking `end = max(A.end, B.end)`.
pub fn merge(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted = normalize(intervals);
    sorted.sort_by(|a, b| a.start.partial_cmp(&b.start).unwrap_or(std::cmp::Ordering::Equal));

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        match merged.last_mut() {
            Some(last) if iv.start <= last.end => {
                if iv.end > last.end {
                    last.end = iv.end;
                }
            }
            _ => merged.push(iv),
        }
    }
    merged
}

/// Keep the rows whose elapsed time lies in the closed union of `intervals`.
///
/// With zero intervals this is an identity pass-through: a full copy of all
/// rows sorted by elapsed time, not an empty-set rejection. The result is
/// always an owned copy sorted ascending; callers may mutate it freely.
/// Single-point intervals (`start == end`) keep exactly the samples at that
/// instant; the comparison is exact `>=`/`<=`, no epsilon widening.
pub fn filter_by_union<R: ChannelRow>(rows: &[R], intervals: &[Interval]) -> Vec<R> {
    let mut sorted: Vec<R> = rows.to_vec();
    sorted.sort_by(|a, b| {
        a.elapsed()
            .partial_cmp(&b.elapsed())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    if intervals.is_empty() {
        return sorted;
    }

    let merged = merge(intervals);
    sorted
        .into_iter()
        .filter(|row| merged.iter().any(|iv| iv.contains(row.elapsed())))
        .collect()
}

/// Apply the trim union to every channel of a session dataset.
pub fn apply_trims(data: &SessionData, trims: &[Interval]) -> SessionData {
    SessionData {
        scale: filter_by_union(&data.scale, trims),
        volume: filter_by_union(&data.volume, trims),
        pressure: filter_by_union(&data.pressure, trims),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::session::PressureRow;

    fn iv(start: f64, end: f64) -> Interval {
        Interval::new(start, end)
    }

    fn rows(times: &[f64]) -> Vec<PressureRow> {
        times
            .iter()
            .map(|&t| PressureRow {
                elapsed_time: t,
                pressure: Some(t * 2.0),
            })
            .collect()
    }

    fn times(rows: &[PressureRow]) -> Vec<f64> {
        rows.iter().map(|r| r.elapsed_time).collect()
    }

    #[test]
    fn normalize_swaps_reversed_bounds() {
        let out = normalize(&[iv(5.0, 2.0), iv(1.0, 3.0)]);
        assert_eq!(out, vec![iv(2.0, 5.0), iv(1.0, 3.0)]);
    }

    #[test]
    fn merge_produces_sorted_non_overlapping_cover() {
        let out = merge(&[iv(5.0, 2.0), iv(1.0, 3.0)]);
        assert_eq!(out, vec![iv(1.0, 5.0)]);

        let out = merge(&[iv(0.0, 1.0), iv(1.0, 2.0), iv(4.0, 6.0)]);
        // Touching intervals merge; disjoint ones stay apart.
        assert_eq!(out, vec![iv(0.0, 2.0), iv(4.0, 6.0)]);
        for pair in out.windows(2) {
            assert!(pair[0].end < pair[1].start, "cover must be non-overlapping");
        }
    }

    #[test]
    fn merge_preserves_covered_points() {
        let original = [iv(5.0, 2.0), iv(1.0, 3.0), iv(7.0, 7.0)];
        let merged = merge(&original);
        for t in [1.0, 2.0, 2.5, 3.0, 4.9, 5.0, 7.0] {
            let in_original = original.iter().any(|i| i.normalized().contains(t));
            let in_merged = merged.iter().any(|i| i.contains(t));
            assert_eq!(in_original, in_merged, "coverage differs at t={t}");
        }
        assert!(!merged.iter().any(|i| i.contains(6.0)));
    }

    #[test]
    fn empty_interval_set_returns_full_sorted_copy() {
        let input = rows(&[3.0, 1.0, 2.0]);
        let mut out = filter_by_union(&input, &[]);
        assert_eq!(times(&out), vec![1.0, 2.0, 3.0]);
        // The result is a defensive copy; mutating it leaves the input alone.
        out[0].elapsed_time = 99.0;
        assert_eq!(input[1].elapsed_time, 1.0);
    }

    #[test]
    fn filter_is_idempotent() {
        let input = rows(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let trims = [iv(1.0, 3.0), iv(2.0, 5.0)];
        let once = filter_by_union(&input, &trims);
        let twice = filter_by_union(&once, &trims);
        assert_eq!(times(&once), times(&twice));
    }

    #[test]
    fn reversed_and_overlapping_trims() {
        // {5,2} and {1,3} normalize to {2,5},{1,3} and merge to {1,5}.
        let trims = [iv(5.0, 2.0), iv(1.0, 3.0)];
        assert_eq!(merge(&trims), vec![iv(1.0, 5.0)]);
        let out = filter_by_union(&rows(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]), &trims);
        assert_eq!(times(&out), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn single_point_interval_keeps_exact_instant() {
        let out = filter_by_union(&rows(&[0.0, 1.0, 1.0000001, 2.0]), &[iv(1.0, 1.0)]);
        assert_eq!(times(&out), vec![1.0]);
    }

    #[test]
    fn apply_trims_filters_every_channel() {
        let data = SessionData {
            scale: vec![crate::data::session::ScaleRow {
                elapsed_time: 10.0,
                scale: Some(1.0),
            }],
            volume: vec![crate::data::session::VolumeRow {
                elapsed_time: 1.0,
                volume: Some(1.0),
            }],
            pressure: rows(&[0.5, 1.5, 9.0]),
        };
        let out = apply_trims(&data, &[iv(0.0, 2.0)]);
        assert!(out.scale.is_empty());
        assert_eq!(out.volume.len(), 1);
        assert_eq!(times(&out.pressure), vec![0.5, 1.5]);
    }
}

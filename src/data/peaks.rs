//! Peak markers on the pressure channel and the snap-to-local-max engine.
//!
//! Peaks come either from the backend detector ("auto") or from the operator
//! clicking / dragging on the pressure chart ("manual"). Interactive
//! placement never uses the raw pointer position: the target x is snapped to
//! the nearest sample and then to the closest local maximum within a
//! time-bounded neighborhood, so a marker always sits on a physically
//! meaningful sample.

use serde::{Deserialize, Serialize};

use crate::data::series::Point;

/// Provenance of a peak (and, once any edit happens, of the whole list).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakSource {
    Auto,
    Manual,
}

/// A marked pressure peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub time: f64,
    pub value: f64,
    /// Index into the sample sequence the peak was placed on, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub source: PeakSource,
}

/// Detection parameters forwarded to the backend. All optional; the backend
/// owns the defaults and blank fields are sent as null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeakParams {
    pub height: Option<f64>,
    pub threshold: Option<f64>,
    pub distance: Option<f64>,
    pub prominence: Option<f64>,
    pub width: Option<f64>,
}

/// Time tolerance (seconds) under which a newly added peak is considered a
/// duplicate of an existing one and rejected.
pub const DEDUPE_WINDOW_SEC: f64 = 0.5;

/// Flip every peak to manual provenance.
///
/// Any user edit taints the whole list: the detector's output no longer
/// describes it. This is the single transition point for that rule; mutation
/// sites call it instead of poking `source` fields individually.
pub fn mark_manual(peaks: &mut [Peak]) {
    for peak in peaks {
        peak.source = PeakSource::Manual;
    }
}

/// Index of the sample nearest to `x` by absolute time distance.
pub fn nearest_index_by_x(points: &[Point], x: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, p) in points.iter().enumerate() {
        let delta = (p.x - x).abs();
        match best {
            Some((_, d)) if d <= delta => {}
            _ => best = Some((i, delta)),
        }
    }
    best.map(|(i, _)| i)
}

/// Find the best local maximum within `window_indices` of `start_index`.
///
/// A sample qualifies when its y is `>=` both neighbors (an open boundary is
/// treated as negative infinity, so edge samples can qualify). Among the
/// candidates, the one with smallest index distance to `start_index` wins;
/// ties break toward the larger y. If the span holds no local maximum at all
/// (monotonic region), the largest-y sample of the span is returned instead.
pub fn find_local_max_index(
    points: &[Point],
    start_index: usize,
    window_indices: usize,
) -> Option<usize> {
    if points.is_empty() {
        return None;
    }
    let start = start_index.saturating_sub(window_indices);
    let end = (start_index + window_indices).min(points.len() - 1);

    let mut candidates: Vec<usize> = Vec::new();
    for i in start..=end {
        let prev = if i > 0 { points[i - 1].y } else { f64::NEG_INFINITY };
        let next = if i + 1 < points.len() {
            points[i + 1].y
        } else {
            f64::NEG_INFINITY
        };
        if points[i].y >= prev && points[i].y >= next {
            candidates.push(i);
        }
    }

    if !candidates.is_empty() {
        let mut best = candidates[0];
        let mut best_distance = best.abs_diff(start_index);
        for &candidate in &candidates {
            let distance = candidate.abs_diff(start_index);
            if distance < best_distance
                || (distance == best_distance && points[candidate].y > points[best].y)
            {
                best = candidate;
                best_distance = distance;
            }
        }
        return Some(best);
    }

    let mut best = start;
    for i in start + 1..=end {
        if points[i].y > points[best].y {
            best = i;
        }
    }
    Some(best)
}

/// Snap a pointer-domain x to the nearest local pressure maximum.
///
/// 1. locate the nearest sample to `x`;
/// 2. expand left/right while neighboring samples stay within `window_sec`
///    of `x`, establishing the index span;
/// 3. pick the best local maximum in the symmetric span via
///    [`find_local_max_index`].
///
/// Returns the chosen sample's index and point, or `None` when the sequence
/// is empty. `points` must be sorted ascending by x (projection output).
pub fn snap_to_local_max(points: &[Point], x: f64, window_sec: f64) -> Option<(usize, Point)> {
    let start_index = nearest_index_by_x(points, x)?;

    let mut left = start_index;
    while left > 0 && x - points[left - 1].x <= window_sec {
        left -= 1;
    }
    let mut right = start_index;
    while right + 1 < points.len() && points[right + 1].x - x <= window_sec {
        right += 1;
    }

    let window_indices = (start_index - left).max(right - start_index);
    let best = find_local_max_index(points, start_index, window_indices)?;
    Some((best, points[best]))
}

/// Whether a new peak at `time` duplicates one already in `peaks`.
pub fn is_duplicate(peaks: &[Peak], time: f64, tolerance_sec: f64) -> bool {
    peaks.iter().any(|p| (p.time - time).abs() <= tolerance_sec)
}

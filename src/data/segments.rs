//! Per-void segments: the onset → peak → empty cycle around each peak.
//!
//! Segments are derived by the backend from the windowed dataset and the
//! confirmed peak list, then refined locally: the operator can drag or place
//! onset/empty markers, which snap to pressure samples whose local slope
//! matches the marker kind (rising for onset, flat for empty). A cleared
//! marker is `(None, None)`, explicitly distinct from a zero reading.

use serde::{Deserialize, Serialize};

use crate::data::series::Point;

/// An onset or empty marker; `(None, None)` means undetected / cleared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SegmentPoint {
    pub time: Option<f64>,
    pub value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

impl SegmentPoint {
    pub fn at(time: f64, value: f64, index: usize) -> Self {
        Self {
            time: Some(time),
            value: Some(value),
            index: Some(index),
        }
    }

    /// The cleared marker.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_set(&self) -> bool {
        self.time.is_some() && self.value.is_some()
    }
}

/// Derived metrics of one segment. All nullable on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentMetrics {
    /// Inter-micturition interval: onset minus the previous segment's empty.
    pub imi_sec: Option<f64>,
    pub max_pressure: Option<f64>,
    pub avg_pressure_between_empty_and_next_onset: Option<f64>,
    pub delta_volume: Option<f64>,
}

/// One derived voiding cycle, one entry per confirmed peak.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub i: usize,
    pub onset_time: f64,
    pub peak_time: f64,
    pub empty_time: f64,
    pub metrics: SegmentMetrics,
}

/// Thresholds controlling the backend derivation. Every field is optional
/// and sent as null when blank; the backend supplies its own defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentParams {
    pub onset_gradient: Option<f64>,
    pub onset_pressure_drop: Option<f64>,
    pub empty_pressure_drop: Option<f64>,
    pub min_after_peak_sec: Option<f64>,
    pub search_start_after_prev_peak_sec: Option<f64>,
    pub fallback_onset_sec: Option<f64>,
    pub fallback_empty_sec: Option<f64>,
}

/// Which marker kind a refinement gesture is placing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Onset,
    Empty,
}

/// Minimum rising slope (pressure units / s) for an onset snap target.
pub const ONSET_SLOPE_THRESHOLD: f64 = 0.02;
/// Maximum |slope| for an empty snap target (the bladder is at rest).
pub const FLAT_SLOPE_THRESHOLD: f64 = 0.01;

/// Backward-difference slope at each sample of an x-sorted sequence.
///
/// The first sample reuses the forward difference so the result has the same
/// length as the input; a zero time step degrades to a unit step.
pub fn derivatives(points: &[Point]) -> Vec<f64> {
    if points.len() < 2 {
        return vec![0.0; points.len()];
    }
    let mut out = Vec::with_capacity(points.len());
    for i in 0..points.len() {
        let (a, b) = if i == 0 {
            (points[0], points[1])
        } else {
            (points[i - 1], points[i])
        };
        let dt = b.x - a.x;
        let dt = if dt == 0.0 { 1.0 } else { dt };
        out.push((b.y - a.y) / dt);
    }
    out
}

/// Snap a refinement gesture at `time` to a slope-compatible sample.
///
/// Onset markers prefer the time-nearest sample whose slope is at least
/// [`ONSET_SLOPE_THRESHOLD`]; empty markers prefer one whose |slope| is at
/// most [`FLAT_SLOPE_THRESHOLD`]. When no sample qualifies, the plain
/// time-nearest sample is used. Returns `None` for an empty sequence.
pub fn snap_segment_point(points: &[Point], time: f64, kind: MarkerKind) -> Option<SegmentPoint> {
    if points.is_empty() {
        return None;
    }
    let slopes = derivatives(points);

    let mut best: Option<(usize, f64)> = None;
    for (idx, p) in points.iter().enumerate() {
        let slope_ok = match kind {
            MarkerKind::Onset => slopes[idx] >= ONSET_SLOPE_THRESHOLD,
            MarkerKind::Empty => slopes[idx].abs() <= FLAT_SLOPE_THRESHOLD,
        };
        if !slope_ok {
            continue;
        }
        let delta = (p.x - time).abs();
        match best {
            Some((_, d)) if d <= delta => {}
            _ => best = Some((idx, delta)),
        }
    }

    let idx = match best {
        Some((idx, _)) => idx,
        None => {
            // Monotonic or noisy region with no qualifying slope: nearest wins.
            let mut nearest = 0usize;
            let mut min_delta = (points[0].x - time).abs();
            for (idx, p) in points.iter().enumerate().skip(1) {
                let delta = (p.x - time).abs();
                if delta < min_delta {
                    nearest = idx;
                    min_delta = delta;
                }
            }
            nearest
        }
    };
    Some(SegmentPoint::at(points[idx].x, points[idx].y, idx))
}

//! The experiment window: a single active analysis range.
//!
//! Distinct from trims: the window is one authoritative `(start, end)` pair
//! selected per wizard step, applied after trimming. Both bounds are clamped
//! independently into the dataset's observed extent and then reordered, so a
//! request like `start = -10, end = 1000` on an observed range `[0, 100]`
//! yields `{0, 100}`.

use serde::{Deserialize, Serialize};

use crate::data::session::{ChannelRow, SessionData};

/// The active analysis range on the elapsed-time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExperimentWindow {
    pub start: f64,
    pub end: f64,
}

impl ExperimentWindow {
    /// Clamp both bounds into `[observed_min, observed_max]` independently,
    /// then reorder so `start <= end`.
    pub fn clamped(start: f64, end: f64, observed_min: f64, observed_max: f64) -> Self {
        let a = start.clamp(observed_min, observed_max);
        let b = end.clamp(observed_min, observed_max);
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Clamp against a dataset's combined observed range.
    ///
    /// `None` when the dataset is empty: an undefined window, not a zero one.
    pub fn clamped_to(data: &SessionData, start: f64, end: f64) -> Option<Self> {
        let (min, max) = data.observed_time_range()?;
        Some(Self::clamped(start, end, min, max))
    }

    /// Bound equality within `epsilon`, used for the confirm-window gate.
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.start - other.start).abs() <= epsilon && (self.end - other.end).abs() <= epsilon
    }
}

/// Keep the rows of one channel with `start <= elapsed <= end`.
///
/// Does not re-sort: upstream (trimming) has already established order.
pub fn filter_by_window<R: ChannelRow>(rows: &[R], start: f64, end: f64) -> Vec<R> {
    rows.iter()
        .filter(|row| {
            let t = row.elapsed();
            t.is_finite() && t >= start && t <= end
        })
        .cloned()
        .collect()
}

/// Apply one window to every channel of a session dataset.
///
/// Windowing and trimming are independent, composable filters; this applies
/// only the window and never consults the trim set.
pub fn apply_window(data: &SessionData, start: f64, end: f64) -> SessionData {
    SessionData {
        scale: filter_by_window(&data.scale, start, end),
        volume: filter_by_window(&data.volume, start, end),
        pressure: filter_by_window(&data.pressure, start, end),
    }
}

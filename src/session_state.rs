//! The derived-state pipeline of one analysis session.
//!
//! All session state lives in a single [`SessionState`] value mutated only
//! through its action methods. The dependency chain is
//!
//! ```text
//! original → trims → current → window → windowed → peaks → segments
//! ```
//!
//! and every mutation funnels through [`SessionState::invalidate_from`], which
//! resets each artifact downstream of the changed stage. No code path may
//! leave a downstream artifact referencing a stale upstream input; keeping the
//! cascade in one place makes that mechanically checkable.

use crate::data::peaks::{self, Peak, PeakSource};
use crate::data::segments::{self, MarkerKind, Segment, SegmentParams, SegmentPoint};
use crate::data::series::{self, Point};
use crate::data::trimming::{self, Interval};
use crate::data::windowing::{self, ExperimentWindow};
use crate::data::SessionData;

/// A stage of the pipeline whose input just changed.
///
/// Ordering follows the dependency chain; `invalidate_from(stage)` resets
/// everything ranked after `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Dataset,
    Trims,
    Window,
    Peaks,
}

/// Segment markers returned by a derivation, one entry per segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentMarkers {
    pub onset: Vec<SegmentPoint>,
    pub peak: Vec<SegmentPoint>,
    pub empty: Vec<SegmentPoint>,
}

/// All pipeline state of the running session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// The dataset as uploaded, immutable until the next upload.
    original: Option<SessionData>,
    /// Kept time ranges; empty means "keep everything".
    trims: Vec<Interval>,
    /// `original` after trims, the input to windowing.
    current: Option<SessionData>,
    /// Range-slider bounds as currently authored, not yet committed.
    draft_window: Option<(f64, f64)>,
    /// The committed analysis window, if any.
    confirmed_window: Option<ExperimentWindow>,
    /// `current` restricted to the confirmed window.
    windowed: Option<SessionData>,

    peaks: Vec<Peak>,
    /// The auto-detect step was run or explicitly skipped.
    peaks_acknowledged: bool,
    /// The operator signed off on the current peak list.
    peaks_confirmed: bool,

    segment_params: SegmentParams,
    segments: Vec<Segment>,
    markers: SegmentMarkers,
    /// A derivation has succeeded against the current peak set.
    segments_derived: bool,
    /// The operator signed off on the onset/empty markers.
    markers_confirmed: bool,
}

impl SessionState {
    // ────────────────────────── read access ──────────────────────────

    pub fn original(&self) -> Option<&SessionData> {
        self.original.as_ref()
    }

    pub fn trims(&self) -> &[Interval] {
        &self.trims
    }

    /// The trimmed dataset, the input to range selection.
    pub fn current(&self) -> Option<&SessionData> {
        self.current.as_ref()
    }

    pub fn draft_window(&self) -> Option<(f64, f64)> {
        self.draft_window
    }

    pub fn confirmed_window(&self) -> Option<ExperimentWindow> {
        self.confirmed_window
    }

    pub fn windowed(&self) -> Option<&SessionData> {
        self.windowed.as_ref()
    }

    /// The dataset the current wizard step observes: windowed if a window is
    /// confirmed, else the trimmed dataset, else the original.
    pub fn effective(&self) -> Option<&SessionData> {
        self.windowed
            .as_ref()
            .or(self.current.as_ref())
            .or(self.original.as_ref())
    }

    /// Pressure channel of [`Self::effective`] as an x-sorted point sequence.
    pub fn pressure_points(&self) -> Vec<Point> {
        self.effective()
            .map(|d| series::to_points(&d.pressure))
            .unwrap_or_default()
    }

    pub fn peaks(&self) -> &[Peak] {
        &self.peaks
    }

    pub fn peaks_acknowledged(&self) -> bool {
        self.peaks_acknowledged
    }

    pub fn peaks_confirmed(&self) -> bool {
        self.peaks_confirmed
    }

    pub fn segment_params(&self) -> &SegmentParams {
        &self.segment_params
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn markers(&self) -> &SegmentMarkers {
        &self.markers
    }

    pub fn segments_derived(&self) -> bool {
        self.segments_derived
    }

    pub fn markers_confirmed(&self) -> bool {
        self.markers_confirmed
    }

    /// True when the draft range matches the committed window within
    /// `epsilon`. Any draft edit after a commit re-dirties this.
    pub fn window_is_confirmed(&self, epsilon: f64) -> bool {
        match (self.draft_window, self.confirmed_window) {
            (Some((start, end)), Some(confirmed)) => {
                let draft = ExperimentWindow {
                    start: start.min(end),
                    end: start.max(end),
                };
                confirmed.approx_eq(&draft, epsilon)
            }
            _ => false,
        }
    }

    // ──────────────────────────── actions ────────────────────────────

    /// Install a freshly uploaded dataset, resetting the whole pipeline.
    pub fn load_dataset(&mut self, data: SessionData) {
        self.original = Some(data);
        self.invalidate_from(Stage::Dataset);
    }

    /// Replace the trim set and recompute the trimmed dataset.
    pub fn set_trims(&mut self, trims: Vec<Interval>) {
        self.trims = trims;
        self.recompute_current();
        self.invalidate_from(Stage::Trims);
    }

    /// Drop all trims, restoring the full original extent.
    pub fn clear_trims(&mut self) {
        self.set_trims(Vec::new());
    }

    /// Move the draft range-slider bounds. Does not touch the committed
    /// window, but the confirm gate goes stale until re-committed.
    pub fn set_draft_window(&mut self, start: f64, end: f64) {
        self.draft_window = Some((start, end));
    }

    /// Commit the draft window: clamp it to the trimmed dataset's observed
    /// extent, recompute the windowed view, and reset peaks/segments.
    ///
    /// Returns false (and changes nothing) when there is no dataset or no
    /// draft to commit.
    pub fn confirm_window(&mut self) -> bool {
        let Some(current) = self.current.as_ref() else {
            return false;
        };
        let Some((start, end)) = self.draft_window else {
            return false;
        };
        let Some(window) = ExperimentWindow::clamped_to(current, start, end) else {
            return false;
        };
        self.confirmed_window = Some(window);
        // Snap the draft onto the clamped bounds so the gate reads satisfied.
        self.draft_window = Some((window.start, window.end));
        self.windowed = Some(windowing::apply_window(current, window.start, window.end));
        self.invalidate_from(Stage::Window);
        true
    }

    /// Install a detector result, replacing any existing peak list.
    pub fn set_detected_peaks(&mut self, mut peaks: Vec<Peak>) {
        peaks.sort_by(|a, b| a.time.total_cmp(&b.time));
        self.peaks = peaks;
        self.peaks_acknowledged = true;
        self.invalidate_from(Stage::Peaks);
    }

    /// Acknowledge the auto-detect step without running the detector.
    pub fn skip_auto_detection(&mut self) {
        self.peaks_acknowledged = true;
    }

    /// Add a peak near `time`, snapped to the nearest local pressure maximum.
    ///
    /// Rejected (returns false) when the pressure series is empty or an
    /// existing peak lies within `dedupe_sec` of the snapped time.
    pub fn add_peak_near(&mut self, time: f64, snap_window_sec: f64, dedupe_sec: f64) -> bool {
        let points = self.pressure_points();
        let Some((index, point)) = peaks::snap_to_local_max(&points, time, snap_window_sec) else {
            return false;
        };
        if peaks::is_duplicate(&self.peaks, point.x, dedupe_sec) {
            return false;
        }
        self.peaks.push(Peak {
            time: point.x,
            value: point.y,
            index: Some(index),
            source: PeakSource::Manual,
        });
        self.peaks.sort_by(|a, b| a.time.total_cmp(&b.time));
        peaks::mark_manual(&mut self.peaks);
        self.invalidate_from(Stage::Peaks);
        true
    }

    /// Move the peak at `peak_index` to the snap target nearest `time`.
    pub fn move_peak(&mut self, peak_index: usize, time: f64, snap_window_sec: f64) -> bool {
        if peak_index >= self.peaks.len() {
            return false;
        }
        let points = self.pressure_points();
        let Some((index, point)) = peaks::snap_to_local_max(&points, time, snap_window_sec) else {
            return false;
        };
        let peak = &mut self.peaks[peak_index];
        peak.time = point.x;
        peak.value = point.y;
        peak.index = Some(index);
        self.peaks.sort_by(|a, b| a.time.total_cmp(&b.time));
        peaks::mark_manual(&mut self.peaks);
        self.invalidate_from(Stage::Peaks);
        true
    }

    pub fn remove_peak(&mut self, peak_index: usize) -> bool {
        if peak_index >= self.peaks.len() {
            return false;
        }
        self.peaks.remove(peak_index);
        peaks::mark_manual(&mut self.peaks);
        self.invalidate_from(Stage::Peaks);
        true
    }

    /// Sign off on the current peak list. Re-arms whenever the list changes.
    pub fn confirm_peaks(&mut self) {
        if !self.peaks.is_empty() {
            self.peaks_confirmed = true;
        }
    }

    /// Update derivation thresholds. Returns true when a convenience
    /// re-derivation should be issued, which is only the case once a first
    /// derivation has succeeded.
    pub fn set_segment_params(&mut self, params: SegmentParams) -> bool {
        let changed = params != self.segment_params;
        self.segment_params = params;
        changed && self.segments_derived
    }

    /// Install a successful derivation result.
    pub fn apply_segment_results(&mut self, segments: Vec<Segment>, markers: SegmentMarkers) {
        self.segments = segments;
        self.markers = markers;
        self.segments_derived = true;
        self.markers_confirmed = false;
    }

    /// Refine the onset or empty marker of one segment by snapping `time`
    /// onto a slope-compatible pressure sample. Refinement edits the derived
    /// segment in place and re-arms the marker sign-off; it does not
    /// invalidate the derivation.
    pub fn refine_segment_point(&mut self, segment_index: usize, kind: MarkerKind, time: f64) -> bool {
        if segment_index >= self.segments.len() {
            return false;
        }
        let points = self.pressure_points();
        let Some(snapped) = segments::snap_segment_point(&points, time, kind) else {
            return false;
        };
        let slot = match kind {
            MarkerKind::Onset => self.markers.onset.get_mut(segment_index),
            MarkerKind::Empty => self.markers.empty.get_mut(segment_index),
        };
        let Some(slot) = slot else {
            return false;
        };
        *slot = snapped;
        if let Some(t) = snapped.time {
            match kind {
                MarkerKind::Onset => self.segments[segment_index].onset_time = t,
                MarkerKind::Empty => self.segments[segment_index].empty_time = t,
            }
        }
        self.markers_confirmed = false;
        true
    }

    /// Clear one onset/empty marker to the "undetected" state.
    pub fn clear_segment_point(&mut self, segment_index: usize, kind: MarkerKind) -> bool {
        let slot = match kind {
            MarkerKind::Onset => self.markers.onset.get_mut(segment_index),
            MarkerKind::Empty => self.markers.empty.get_mut(segment_index),
        };
        let Some(slot) = slot else {
            return false;
        };
        *slot = SegmentPoint::cleared();
        self.markers_confirmed = false;
        true
    }

    /// Sign off on the onset/empty markers as refined.
    pub fn confirm_markers(&mut self) {
        if self.segments_derived {
            self.markers_confirmed = true;
        }
    }

    // ─────────────────────── invalidation cascade ───────────────────────

    fn recompute_current(&mut self) {
        self.current = self
            .original
            .as_ref()
            .map(|d| trimming::apply_trims(d, &self.trims));
    }

    /// Reset every artifact downstream of `stage`. The single choke point of
    /// the cascade; all mutation sites route through here.
    pub fn invalidate_from(&mut self, stage: Stage) {
        if stage <= Stage::Dataset {
            self.trims.clear();
            self.recompute_current();
        }
        if stage <= Stage::Trims {
            self.draft_window = self
                .current
                .as_ref()
                .and_then(|d| d.observed_time_range());
            self.confirmed_window = None;
            self.windowed = None;
        }
        if stage <= Stage::Window {
            self.peaks.clear();
            self.peaks_acknowledged = false;
        }
        if stage <= Stage::Peaks {
            self.peaks_confirmed = false;
            self.segments.clear();
            self.markers = SegmentMarkers::default();
            self.segments_derived = false;
            self.markers_confirmed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::session::{PressureRow, ScaleRow, VolumeRow};

    fn dataset() -> SessionData {
        let pressure = [
            (0.0, 1.0),
            (1.0, 5.0),
            (2.0, 3.0),
            (3.0, 5.0),
            (4.0, 1.0),
            (5.0, 2.0),
            (6.0, 1.0),
        ];
        SessionData {
            scale: vec![ScaleRow {
                elapsed_time: 0.0,
                scale: Some(10.0),
            }],
            volume: vec![VolumeRow {
                elapsed_time: 6.0,
                volume: Some(0.5),
            }],
            pressure: pressure
                .iter()
                .map(|&(t, p)| PressureRow {
                    elapsed_time: t,
                    pressure: Some(p),
                })
                .collect(),
        }
    }

    fn loaded() -> SessionState {
        let mut state = SessionState::default();
        state.load_dataset(dataset());
        state
    }

    fn with_peaks() -> SessionState {
        let mut state = loaded();
        state.confirm_window();
        state.set_detected_peaks(vec![Peak {
            time: 1.0,
            value: 5.0,
            index: Some(1),
            source: PeakSource::Auto,
        }]);
        state
    }

    #[test]
    fn load_resets_everything_and_seeds_draft_window() {
        let state = loaded();
        assert!(state.original().is_some());
        assert!(state.current().is_some());
        assert_eq!(state.draft_window(), Some((0.0, 6.0)));
        assert!(state.confirmed_window().is_none());
        assert!(state.peaks().is_empty());
    }

    #[test]
    fn confirm_window_clamps_and_satisfies_the_gate() {
        let mut state = loaded();
        state.set_draft_window(-10.0, 1000.0);
        assert!(state.confirm_window());
        let window = state.confirmed_window().unwrap();
        assert_eq!((window.start, window.end), (0.0, 6.0));
        assert!(state.window_is_confirmed(1e-9));

        // A later draft edit re-dirties the gate without touching the
        // committed window.
        state.set_draft_window(1.0, 6.0);
        assert!(!state.window_is_confirmed(1e-9));
        assert!(state.confirmed_window().is_some());
    }

    #[test]
    fn trim_change_empties_peaks_and_segments() {
        let mut state = with_peaks();
        state.confirm_peaks();
        state.apply_segment_results(
            vec![Segment {
                i: 0,
                onset_time: 0.5,
                peak_time: 1.0,
                empty_time: 2.0,
                metrics: Default::default(),
            }],
            SegmentMarkers {
                onset: vec![SegmentPoint::at(0.5, 1.0, 0)],
                peak: vec![SegmentPoint::at(1.0, 5.0, 1)],
                empty: vec![SegmentPoint::at(2.0, 3.0, 2)],
            },
        );
        state.set_trims(vec![Interval::new(1.0, 5.0)]);
        assert!(state.peaks().is_empty());
        assert!(state.segments().is_empty());
        assert!(!state.peaks_confirmed());
        assert!(!state.segments_derived());
        assert!(state.confirmed_window().is_none());
        // current was recomputed against the new trims
        assert_eq!(state.current().unwrap().pressure.len(), 5);
    }

    #[test]
    fn manual_add_taints_the_whole_list_and_dedupes() {
        let mut state = with_peaks();
        assert!(state.add_peak_near(3.1, 2.0, 0.5));
        assert!(state.peaks().iter().all(|p| p.source == PeakSource::Manual));
        assert_eq!(state.peaks().len(), 2);
        // Within 0.5 s of the freshly snapped peak at t=3
        assert!(!state.add_peak_near(3.2, 2.0, 0.5));
        assert_eq!(state.peaks().len(), 2);
    }

    #[test]
    fn peak_edit_resets_confirm_and_segments() {
        let mut state = with_peaks();
        state.confirm_peaks();
        state.apply_segment_results(Vec::new(), SegmentMarkers::default());
        assert!(state.segments_derived());
        assert!(state.remove_peak(0));
        assert!(!state.peaks_confirmed());
        assert!(!state.segments_derived());
    }

    #[test]
    fn params_change_requests_rederive_only_after_first_derivation() {
        let mut state = with_peaks();
        let params = SegmentParams {
            onset_gradient: Some(0.3),
            ..Default::default()
        };
        assert!(!state.set_segment_params(params.clone()));
        state.apply_segment_results(Vec::new(), SegmentMarkers::default());
        // unchanged params: no re-run
        assert!(!state.set_segment_params(params));
        let params = SegmentParams {
            onset_gradient: Some(0.4),
            ..Default::default()
        };
        assert!(state.set_segment_params(params));
    }

    #[test]
    fn refinement_edits_segments_in_place_without_invalidation() {
        let mut state = with_peaks();
        state.apply_segment_results(
            vec![Segment {
                i: 0,
                onset_time: 0.0,
                peak_time: 1.0,
                empty_time: 4.0,
                metrics: Default::default(),
            }],
            SegmentMarkers {
                onset: vec![SegmentPoint::at(0.0, 1.0, 0)],
                peak: vec![SegmentPoint::at(1.0, 5.0, 1)],
                empty: vec![SegmentPoint::at(4.0, 1.0, 4)],
            },
        );
        state.confirm_markers();
        assert!(state.markers_confirmed());
        assert!(state.refine_segment_point(0, MarkerKind::Onset, 0.4));
        assert!(state.segments_derived(), "refinement must not invalidate");
        assert!(!state.markers_confirmed());
        assert!(state.markers.onset[0].is_set());
        assert!(state.clear_segment_point(0, MarkerKind::Empty));
        assert!(!state.markers.empty[0].is_set());
    }
}

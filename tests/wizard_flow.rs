use cystoview::data::session::PressureRow;
use cystoview::session_state::SegmentMarkers;
use cystoview::{
    Interval, Peak, PeakSource, Segment, SegmentMetrics, SessionData, SessionState, WizardState,
    WizardStep,
};

const EPS: f64 = 1e-9;

fn recording() -> SessionData {
    SessionData {
        pressure: (0..=60)
            .map(|t| PressureRow {
                elapsed_time: t as f64,
                pressure: Some(10.0 + 5.0 * ((t % 10) as f64 - 5.0).abs()),
            })
            .collect(),
        ..Default::default()
    }
}

fn detected_peak(time: f64, value: f64) -> Peak {
    Peak {
        time,
        value,
        index: None,
        source: PeakSource::Auto,
    }
}

fn derived_segment(i: usize) -> Segment {
    Segment {
        i,
        onset_time: i as f64 * 10.0,
        peak_time: i as f64 * 10.0 + 5.0,
        empty_time: i as f64 * 10.0 + 9.0,
        metrics: SegmentMetrics::default(),
    }
}

#[test]
fn wizard_walks_a_complete_session() {
    let mut state = SessionState::default();
    let mut wizard = WizardState::default();

    // Upload
    assert!(!wizard.next(&state, EPS));
    state.load_dataset(recording());
    assert!(wizard.next(&state, EPS));
    assert_eq!(wizard.step(), WizardStep::SelectRange);

    // Select range: draft alone never satisfies the gate.
    state.set_draft_window(5.0, 55.0);
    assert!(!wizard.next(&state, EPS));
    assert!(state.confirm_window());
    assert!(wizard.next(&state, EPS));
    assert_eq!(wizard.step(), WizardStep::AutoPeaks);

    // Auto peaks: a detector result acknowledges the step.
    assert!(!wizard.next(&state, EPS));
    state.set_detected_peaks(vec![detected_peak(15.0, 35.0), detected_peak(25.0, 35.0)]);
    assert!(wizard.next(&state, EPS));
    assert_eq!(wizard.step(), WizardStep::RefinePeaks);

    // Refine peaks: confirmation is required and re-arms on edits.
    assert!(!wizard.next(&state, EPS));
    state.confirm_peaks();
    assert!(state.remove_peak(1));
    assert!(!wizard.next(&state, EPS), "edit must re-arm the confirm gate");
    state.confirm_peaks();
    assert!(wizard.next(&state, EPS));
    assert_eq!(wizard.step(), WizardStep::Segments);

    // Segments: a derivation result opens the last gate.
    assert!(!wizard.next(&state, EPS));
    state.apply_segment_results(vec![derived_segment(0)], SegmentMarkers::default());
    assert!(wizard.next(&state, EPS));
    assert_eq!(wizard.step(), WizardStep::Download);

    // The last step has no forward gate.
    assert!(!wizard.next(&state, EPS));
}

#[test]
fn skip_acknowledgement_opens_the_auto_peaks_gate() {
    let mut state = SessionState::default();
    state.load_dataset(recording());
    state.confirm_window();

    assert!(!WizardStep::AutoPeaks.gate(&state, EPS));
    state.skip_auto_detection();
    assert!(WizardStep::AutoPeaks.gate(&state, EPS));
    // But the refine gate still needs actual peaks.
    assert!(!WizardStep::RefinePeaks.gate(&state, EPS));
}

#[test]
fn upstream_invalidation_closes_later_gates() {
    let mut state = SessionState::default();
    state.load_dataset(recording());
    state.confirm_window();
    state.set_detected_peaks(vec![detected_peak(15.0, 35.0)]);
    state.confirm_peaks();
    state.apply_segment_results(vec![derived_segment(0)], SegmentMarkers::default());

    assert!(WizardStep::SelectRange.gate(&state, EPS));
    assert!(WizardStep::RefinePeaks.gate(&state, EPS));
    assert!(WizardStep::Segments.gate(&state, EPS));

    // A new trim set re-closes every later gate without a wizard action.
    state.set_trims(vec![Interval::new(0.0, 30.0)]);
    assert!(!WizardStep::SelectRange.gate(&state, EPS));
    assert!(!WizardStep::AutoPeaks.gate(&state, EPS));
    assert!(!WizardStep::RefinePeaks.gate(&state, EPS));
    assert!(!WizardStep::Segments.gate(&state, EPS));

    // The dataset gate is untouched.
    assert!(WizardStep::Upload.gate(&state, EPS));
}

use cystoview::data::peaks::snap_to_local_max;
use cystoview::data::series::to_points;
use cystoview::data::session::{PressureRow, ScaleRow, VolumeRow};
use cystoview::data::trimming::{filter_by_union, merge, normalize};
use cystoview::data::windowing::apply_window;
use cystoview::{Interval, SessionData, SessionState};

fn pressure_rows(samples: &[(f64, f64)]) -> Vec<PressureRow> {
    samples
        .iter()
        .map(|&(t, p)| PressureRow {
            elapsed_time: t,
            pressure: Some(p),
        })
        .collect()
}

fn dataset(samples: &[(f64, f64)]) -> SessionData {
    SessionData {
        scale: samples
            .iter()
            .map(|&(t, _)| ScaleRow {
                elapsed_time: t,
                scale: Some(1.0),
            })
            .collect(),
        volume: samples
            .iter()
            .map(|&(t, _)| VolumeRow {
                elapsed_time: t,
                volume: Some(0.1 * t),
            })
            .collect(),
        pressure: pressure_rows(samples),
    }
}

#[test]
fn trim_merge_and_filter_scenario() {
    // {5,2} and {1,3} normalize to {2,5} and {1,3}, merge to {1,5}.
    let trims = vec![Interval::new(5.0, 2.0), Interval::new(1.0, 3.0)];
    let merged = merge(&normalize(&trims));
    assert_eq!(merged, vec![Interval::new(1.0, 5.0)]);

    let rows = pressure_rows(&[
        (0.0, 0.0),
        (1.0, 0.0),
        (2.0, 0.0),
        (3.0, 0.0),
        (4.0, 0.0),
        (5.0, 0.0),
        (6.0, 0.0),
    ]);
    let kept = filter_by_union(&rows, &trims);
    let times: Vec<f64> = kept.iter().map(|r| r.elapsed_time).collect();
    assert_eq!(times, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
}

#[test]
fn filter_by_union_is_idempotent() {
    let trims = vec![Interval::new(1.0, 3.0)];
    let rows = pressure_rows(&[(4.0, 0.0), (2.0, 0.0), (0.0, 0.0), (3.0, 0.0)]);
    let once = filter_by_union(&rows, &trims);
    let twice = filter_by_union(&once, &trims);
    assert_eq!(once, twice);
}

#[test]
fn window_of_full_extent_is_a_noop() {
    let data = dataset(&[(0.0, 1.0), (5.0, 2.0), (10.0, 3.0)]);
    let (min, max) = data.observed_time_range().unwrap();
    let windowed = apply_window(&data, min, max);
    assert_eq!(windowed, data);
}

#[test]
fn projection_is_finite_and_sorted() {
    let rows = pressure_rows(&[(3.0, 1.0), (f64::NAN, 2.0), (1.0, f64::INFINITY), (2.0, 5.0)]);
    let points = to_points(&rows);
    assert!(points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
    assert!(points.windows(2).all(|w| w[0].x <= w[1].x));
    assert_eq!(points.len(), 2);
}

#[test]
fn snap_on_strictly_increasing_returns_rightmost_in_span() {
    let rows = pressure_rows(&[(0.0, 1.0), (1.0, 2.0), (2.0, 3.0), (3.0, 4.0), (4.0, 5.0)]);
    let points = to_points(&rows);
    let (index, point) = snap_to_local_max(&points, 2.0, 1.5).unwrap();
    // Only the right edge of the span qualifies as a local max.
    assert_eq!(index, 3);
    assert_eq!(point.x, 3.0);
}

#[test]
fn full_session_invalidation_cascade() {
    let mut state = SessionState::default();
    state.load_dataset(dataset(&[
        (0.0, 1.0),
        (1.0, 5.0),
        (2.0, 3.0),
        (3.0, 5.0),
        (4.0, 1.0),
        (5.0, 2.0),
        (6.0, 1.0),
    ]));

    // Commit the seeded full-extent draft window.
    assert!(state.confirm_window());
    assert!(state.window_is_confirmed(1e-9));

    // Manual peak placement against the windowed pressure series.
    assert!(state.add_peak_near(1.4, 2.0, 0.5));
    let peak = state.peaks()[0].clone();
    assert_eq!((peak.time, peak.value), (1.0, 5.0));
    state.confirm_peaks();
    assert!(state.peaks_confirmed());

    // A re-upload resets every downstream artifact.
    state.load_dataset(dataset(&[(0.0, 1.0), (1.0, 2.0)]));
    assert!(state.trims().is_empty());
    assert!(state.confirmed_window().is_none());
    assert!(state.peaks().is_empty());
    assert!(!state.peaks_confirmed());
    assert!(state.segments().is_empty());
}

#[test]
fn trims_always_clear_peaks_and_segments() {
    let mut state = SessionState::default();
    state.load_dataset(dataset(&[(0.0, 1.0), (1.0, 5.0), (2.0, 1.0), (3.0, 4.0)]));
    state.confirm_window();
    assert!(state.add_peak_near(1.0, 2.0, 0.5));
    assert!(!state.peaks().is_empty());

    state.set_trims(vec![Interval::new(0.0, 2.0)]);
    assert!(state.peaks().is_empty());
    assert!(state.segments().is_empty());

    // Also true when trims are cleared again.
    state.confirm_window();
    assert!(state.add_peak_near(1.0, 2.0, 0.5));
    state.clear_trims();
    assert!(state.peaks().is_empty());
}

#[test]
fn window_clamp_scenario() {
    let mut state = SessionState::default();
    let samples: Vec<(f64, f64)> = (0..=100).map(|t| (t as f64, 1.0)).collect();
    state.load_dataset(dataset(&samples));
    state.set_draft_window(-10.0, 1000.0);
    assert!(state.confirm_window());
    let window = state.confirmed_window().unwrap();
    assert_eq!((window.start, window.end), (0.0, 100.0));
}

//! Point projection: channel rows to ordered `(x, y)` samples.
//!
//! Geometry and chart consumers work on plain point sequences, not rows.
//! Projection is a pure, restartable transform (safe to call on every
//! render) that drops any sample with a non-finite coordinate and imposes
//! ascending x order regardless of input row order.

use crate::data::session::ChannelRow;

/// A finite plot sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Project channel rows to `(elapsed, value)` points.
///
/// Rows with a missing or non-finite coordinate on either axis are dropped;
/// the result is sorted ascending by x.
pub fn to_points<R: ChannelRow>(rows: &[R]) -> Vec<Point> {
    let mut points: Vec<Point> = rows
        .iter()
        .filter_map(|row| {
            let x = row.elapsed();
            let y = row.value()?;
            if x.is_finite() && y.is_finite() {
                Some(Point::new(x, y))
            } else {
                None
            }
        })
        .collect();
    points.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    points
}

/// Extent of the x-sorted sequence: `last.x - first.x`, or 0 if empty.
pub fn duration(points: &[Point]) -> f64 {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) => last.x - first.x,
        _ => 0.0,
    }
}

/// Maximum y value, or 0 if empty.
pub fn max_y(points: &[Point]) -> f64 {
    points.iter().fold(None, |acc: Option<f64>, p| {
        Some(match acc {
            Some(m) if m >= p.y => m,
            _ => p.y,
        })
    })
    .unwrap_or(0.0)
}

/// y of the last point (by x), or 0 if empty.
pub fn final_y(points: &[Point]) -> f64 {
    points.last().map(|p| p.y).unwrap_or(0.0)
}

/// Display formatting for user-visible metrics; non-finite renders as "N/A".
pub fn format_number(n: f64, digits: usize) -> String {
    if n.is_finite() {
        format!("{n:.digits$}")
    } else {
        "N/A".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::session::PressureRow;

    fn row(t: f64, p: Option<f64>) -> PressureRow {
        PressureRow {
            elapsed_time: t,
            pressure: p,
        }
    }

    #[test]
    fn projection_drops_non_finite_and_sorts() {
        let rows = vec![
            row(3.0, Some(1.0)),
            row(1.0, Some(f64::NAN)),
            row(f64::INFINITY, Some(2.0)),
            row(2.0, None),
            row(0.5, Some(4.0)),
        ];
        let points = to_points(&rows);
        assert_eq!(points, vec![Point::new(0.5, 4.0), Point::new(3.0, 1.0)]);
        assert!(points.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        for pair in points.windows(2) {
            assert!(pair[0].x <= pair[1].x);
        }
    }

    #[test]
    fn summaries_of_empty_sequence_are_zero() {
        assert_eq!(duration(&[]), 0.0);
        assert_eq!(max_y(&[]), 0.0);
        assert_eq!(final_y(&[]), 0.0);
    }

    #[test]
    fn summaries_over_sorted_sequence() {
        let pts = vec![
            Point::new(1.0, 2.0),
            Point::new(4.0, 9.0),
            Point::new(10.0, 3.0),
        ];
        assert_eq!(duration(&pts), 9.0);
        assert_eq!(max_y(&pts), 9.0);
        assert_eq!(final_y(&pts), 3.0);
    }

    #[test]
    fn format_number_handles_non_finite() {
        assert_eq!(format_number(1.23456, 2), "1.23");
        assert_eq!(format_number(f64::NAN, 2), "N/A");
        assert_eq!(format_number(f64::INFINITY, 2), "N/A");
    }
}

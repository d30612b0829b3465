//! Session dataset: the three recorded channels of a cystometry experiment.
//!
//! A recording carries three parallel time series sharing one elapsed-time
//! axis but with independent sampling: the scale reading, the total infused
//! volume, and the bladder pressure. Rows arrive from the upload service as
//! JSON records whose keys are the instrument's column names; channel values
//! may be null where the instrument skipped a sample.

use serde::{Deserialize, Serialize};

/// A row of the scale channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleRow {
    #[serde(rename = "Elapsed Time")]
    pub elapsed_time: f64,
    #[serde(rename = "Scale")]
    pub scale: Option<f64>,
}

/// A row of the infused-volume channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeRow {
    #[serde(rename = "Elapsed Time")]
    pub elapsed_time: f64,
    #[serde(rename = "Tot Infused Vol")]
    pub volume: Option<f64>,
}

/// A row of the bladder-pressure channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PressureRow {
    #[serde(rename = "Elapsed Time")]
    pub elapsed_time: f64,
    #[serde(rename = "Bladder Pressure")]
    pub pressure: Option<f64>,
}

/// A channel row keyed by elapsed time.
///
/// All interval / window operations align rows on this key; the channel
/// value itself stays opaque to them.
pub trait ChannelRow: Clone {
    /// Elapsed time of this sample, in seconds since the recording start.
    fn elapsed(&self) -> f64;
    /// The channel value, if the instrument recorded one.
    fn value(&self) -> Option<f64>;
}

impl ChannelRow for ScaleRow {
    fn elapsed(&self) -> f64 {
        self.elapsed_time
    }
    fn value(&self) -> Option<f64> {
        self.scale
    }
}

impl ChannelRow for VolumeRow {
    fn elapsed(&self) -> f64 {
        self.elapsed_time
    }
    fn value(&self) -> Option<f64> {
        self.volume
    }
}

impl ChannelRow for PressureRow {
    fn elapsed(&self) -> f64 {
        self.elapsed_time
    }
    fn value(&self) -> Option<f64> {
        self.pressure
    }
}

/// The three channels of one uploaded recording.
///
/// The copy created at upload time is the immutable "original"; every later
/// view (trimmed, windowed) is derived from it and owned separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub scale: Vec<ScaleRow>,
    pub volume: Vec<VolumeRow>,
    pub pressure: Vec<PressureRow>,
}

impl SessionData {
    /// True when no channel holds any rows.
    pub fn is_empty(&self) -> bool {
        self.scale.is_empty() && self.volume.is_empty() && self.pressure.is_empty()
    }

    /// Row counts as (scale, volume, pressure), for status summaries.
    pub fn row_counts(&self) -> (usize, usize, usize) {
        (self.scale.len(), self.volume.len(), self.pressure.len())
    }

    /// Observed elapsed-time extent across *all three* channels combined.
    ///
    /// A channel with a narrower native range does not shrink the result;
    /// the shared bound is the union of all channels. Returns `None` when
    /// the dataset is empty or no finite time exists.
    pub fn observed_time_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut scan = |t: f64| {
            if t.is_finite() {
                if t < min {
                    min = t;
                }
                if t > max {
                    max = t;
                }
            }
        };
        for row in &self.scale {
            scan(row.elapsed_time);
        }
        for row in &self.volume {
            scan(row.elapsed_time);
        }
        for row in &self.pressure {
            scan(row.elapsed_time);
        }
        if min.is_finite() && max.is_finite() {
            Some((min, max))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressure(t: f64, p: f64) -> PressureRow {
        PressureRow {
            elapsed_time: t,
            pressure: Some(p),
        }
    }

    #[test]
    fn observed_range_spans_all_channels() {
        let data = SessionData {
            scale: vec![ScaleRow {
                elapsed_time: 5.0,
                scale: Some(1.0),
            }],
            volume: vec![VolumeRow {
                elapsed_time: 42.0,
                volume: Some(2.0),
            }],
            pressure: vec![pressure(-1.0, 3.0)],
        };
        assert_eq!(data.observed_time_range(), Some((-1.0, 42.0)));
    }

    #[test]
    fn observed_range_empty_dataset_is_none() {
        assert_eq!(SessionData::default().observed_time_range(), None);
        assert!(SessionData::default().is_empty());
    }

    #[test]
    fn observed_range_skips_non_finite_times() {
        let data = SessionData {
            pressure: vec![pressure(f64::NAN, 1.0), pressure(3.0, 2.0)],
            ..Default::default()
        };
        assert_eq!(data.observed_time_range(), Some((3.0, 3.0)));
    }

    #[test]
    fn wire_names_round_trip() {
        let json = r#"{"Elapsed Time": 1.5, "Bladder Pressure": null}"#;
        let row: PressureRow = serde_json::from_str(json).unwrap();
        assert_eq!(row.elapsed_time, 1.5);
        assert_eq!(row.pressure, None);
        let back = serde_json::to_value(&row).unwrap();
        assert!(back.get("Elapsed Time").is_some());
        assert!(back.get("Bladder Pressure").is_some());
    }
}

//! Session data model and the pure transformation stages of the pipeline.

pub mod peaks;
pub mod segments;
pub mod series;
pub mod session;
pub mod trimming;
pub mod windowing;

pub use peaks::{Peak, PeakParams, PeakSource};
pub use segments::{Segment, SegmentMetrics, SegmentParams, SegmentPoint};
pub use series::Point;
pub use session::{ChannelRow, SessionData};
pub use trimming::Interval;
pub use windowing::ExperimentWindow;

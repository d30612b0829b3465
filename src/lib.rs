//! CystoView: interactive analysis of cystometry recordings.
//!
//! A wizard-style egui/eframe application around a deterministic data
//! pipeline: the uploaded recording is trimmed to kept intervals, restricted
//! to a confirmed analysis window, annotated with pressure peaks (detected by
//! an external service, refined by hand with snap-to-local-max), and finally
//! split into per-void segments with metrics. Every upstream edit invalidates
//! all downstream artifacts.
//!
//! The pure pipeline lives in [`data`] and [`session_state`] and is usable
//! without the UI; [`app::run`] launches the full wizard.

pub mod api;
pub mod app;
pub mod config;
pub mod data;
pub mod error;
pub mod events;
pub mod plot;
pub mod session_state;
pub mod wizard;

mod panels;

pub use api::{ApiClient, ApiResponse};
pub use config::CystoViewConfig;
pub use data::{
    ExperimentWindow, Interval, Peak, PeakParams, PeakSource, Point, Segment, SegmentMetrics,
    SegmentParams, SegmentPoint, SessionData,
};
pub use error::ApiError;
pub use events::{EventController, EventFilter, EventKind, EventSubscription, SessionEvent};
pub use session_state::{SessionState, Stage};
pub use wizard::{WizardState, WizardStep};

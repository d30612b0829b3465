//! Event system for embedding code observing a CystoView session.
//!
//! Callers subscribe via [`EventController`]. Each event carries a set of
//! [`EventKind`] flags (bitflags-style) so that a single occurrence can match
//! multiple categories (e.g. a manual peak drag is *also* a `PEAKS_CHANGED`
//! event).
//!
//! The caller specifies an [`EventFilter`] to receive only the events they
//! care about.  The filter is a simple OR mask: an event is delivered when
//! `(event.kinds & filter) != 0`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};

use crate::wizard::WizardStep;

// ─────────────────────────────────────────────────────────────────────────────
// EventKind – bitflags
// ─────────────────────────────────────────────────────────────────────────────

/// Bitflags describing the *categories* an event belongs to.
///
/// A single [`SessionEvent`] may have several bits set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventKind(pub u64);

impl EventKind {
    // ── Pipeline ─────────────────────────────────────────────────────────
    /// A new recording was uploaded and installed as the session dataset.
    pub const DATASET_LOADED: Self = Self(1 << 0);
    /// The trim set changed (apply, undo, or restore).
    pub const TRIMS_CHANGED: Self = Self(1 << 1);
    /// The analysis window was committed.
    pub const WINDOW_CHANGED: Self = Self(1 << 2);
    /// The peak list changed (detector result or manual edit).
    pub const PEAKS_CHANGED: Self = Self(1 << 3);
    /// The operator signed off on the peak list.
    pub const PEAKS_CONFIRMED: Self = Self(1 << 4);
    /// A segment derivation completed.
    pub const SEGMENTS_DERIVED: Self = Self(1 << 5);
    /// An onset/empty marker was refined or cleared.
    pub const SEGMENT_POINT_EDITED: Self = Self(1 << 6);
    /// The operator signed off on the refined markers.
    pub const SEGMENTS_CONFIRMED: Self = Self(1 << 7);

    // ── Wizard / IO ──────────────────────────────────────────────────────
    /// The wizard moved to a different step.
    pub const STEP_CHANGED: Self = Self(1 << 8);
    /// A report was generated and is available for download.
    pub const REPORT_EXPORTED: Self = Self(1 << 9);
    /// A backend call failed.
    pub const API_ERROR: Self = Self(1 << 10);

    /// Wildcard: matches *every* event kind.
    pub const ALL: Self = Self(u64::MAX);

    /// Combine two event kinds (bitwise OR).
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Check whether `self` contains all bits in `other`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Check whether `self` intersects with `other` (at least one bit in common).
    #[inline]
    pub const fn intersects(self, other: Self) -> bool {
        (self.0 & other.0) != 0
    }

    /// Returns `true` if no bits are set.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventKind {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventKind {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::ops::BitAnd for EventKind {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "EMPTY");
        }
        if *self == EventKind::ALL {
            return write!(f, "ALL");
        }

        // Known kinds with their string names in declaration order.
        let pairs: &[(EventKind, &str)] = &[
            (EventKind::DATASET_LOADED, "DATASET_LOADED"),
            (EventKind::TRIMS_CHANGED, "TRIMS_CHANGED"),
            (EventKind::WINDOW_CHANGED, "WINDOW_CHANGED"),
            (EventKind::PEAKS_CHANGED, "PEAKS_CHANGED"),
            (EventKind::PEAKS_CONFIRMED, "PEAKS_CONFIRMED"),
            (EventKind::SEGMENTS_DERIVED, "SEGMENTS_DERIVED"),
            (EventKind::SEGMENT_POINT_EDITED, "SEGMENT_POINT_EDITED"),
            (EventKind::SEGMENTS_CONFIRMED, "SEGMENTS_CONFIRMED"),
            (EventKind::STEP_CHANGED, "STEP_CHANGED"),
            (EventKind::REPORT_EXPORTED, "REPORT_EXPORTED"),
            (EventKind::API_ERROR, "API_ERROR"),
        ];

        let mut names = Vec::new();
        let mut known_bits: u64 = 0;
        for (kind, name) in pairs {
            known_bits |= kind.0;
            if self.contains(*kind) {
                names.push((*name).to_string());
            }
        }

        let extra = self.0 & !known_bits;
        if extra != 0 {
            names.push(format!("0x{:x}", extra));
        }

        if names.is_empty() {
            write!(f, "0x{:x}", self.0)
        } else {
            write!(f, "{}", names.join("|"))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Metadata – per-event-type payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Metadata for dataset-loaded events.
#[derive(Debug, Clone)]
pub struct DatasetMeta {
    pub file_name: Option<String>,
    /// Row counts as (scale, volume, pressure).
    pub row_counts: (usize, usize, usize),
}

/// Metadata for trim / window events.
#[derive(Debug, Clone, Copy)]
pub struct RangeMeta {
    pub start: f64,
    pub end: f64,
    /// Number of kept intervals (1 for a window commit).
    pub interval_count: usize,
}

/// Metadata for peak-list events.
#[derive(Debug, Clone, Copy)]
pub struct PeaksMeta {
    pub count: usize,
    /// True once any manual edit has tainted the list.
    pub manual: bool,
}

/// Metadata for segment derivation / refinement events.
#[derive(Debug, Clone, Copy)]
pub struct SegmentsMeta {
    pub segment_count: usize,
    /// Index of the refined segment, for marker edits.
    pub segment_index: Option<usize>,
}

/// Metadata for wizard step changes.
#[derive(Debug, Clone, Copy)]
pub struct StepMeta {
    pub from: WizardStep,
    pub to: WizardStep,
}

/// Metadata for report exports.
#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub filename: String,
    pub download_url: String,
}

/// Metadata for backend failures.
#[derive(Debug, Clone)]
pub struct ErrorMeta {
    /// Human-readable message, as shown to the operator.
    pub message: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// SessionEvent – the top-level event type
// ─────────────────────────────────────────────────────────────────────────────

/// A rich event emitted by the CystoView UI.
///
/// `kinds` is a bitflag set of [`EventKind`] categories.  The various
/// `Option<…Meta>` fields carry metadata relevant to the kinds that are set.
#[derive(Debug, Clone)]
pub struct SessionEvent {
    /// Bitflag set of categories this event belongs to.
    pub kinds: EventKind,
    /// Monotonic timestamp (seconds since app start, from `std::time::Instant`).
    pub timestamp: f64,

    // ── Optional metadata ────────────────────────────────────────────────
    pub dataset: Option<DatasetMeta>,
    pub range: Option<RangeMeta>,
    pub peaks: Option<PeaksMeta>,
    pub segments: Option<SegmentsMeta>,
    pub step: Option<StepMeta>,
    pub report: Option<ReportMeta>,
    pub error: Option<ErrorMeta>,
}

impl SessionEvent {
    /// Create a new event with the given kinds; the timestamp is set on emit.
    pub fn new(kinds: EventKind) -> Self {
        Self {
            kinds,
            timestamp: 0.0,
            dataset: None,
            range: None,
            peaks: None,
            segments: None,
            step: None,
            report: None,
            error: None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventFilter
// ─────────────────────────────────────────────────────────────────────────────

/// A filter that selects which event categories a subscriber receives.
///
/// The filter is an OR-mask: an event is delivered when
/// `event.kinds.intersects(filter.mask)`.
#[derive(Debug, Clone, Copy)]
pub struct EventFilter {
    pub mask: EventKind,
}

impl EventFilter {
    /// Accept all events.
    pub const fn all() -> Self {
        Self {
            mask: EventKind::ALL,
        }
    }

    /// Accept only the specified event kinds.
    pub const fn only(mask: EventKind) -> Self {
        Self { mask }
    }

    /// Check whether an event passes this filter.
    #[inline]
    pub fn matches(&self, event: &SessionEvent) -> bool {
        event.kinds.intersects(self.mask)
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventController
// ─────────────────────────────────────────────────────────────────────────────

struct Subscriber {
    filter: EventFilter,
    sender: Sender<SessionEvent>,
    alive: Arc<AtomicBool>,
}

/// A live subscription to session events.
///
/// Wraps the receiving end of an `mpsc` channel; dropping it marks the
/// subscription dead so the controller can prune it on the next emit, even
/// when the filter never matches another event.
pub struct EventSubscription {
    receiver: Receiver<SessionEvent>,
    alive: Arc<AtomicBool>,
}

impl EventSubscription {
    pub fn try_recv(&self) -> Result<SessionEvent, TryRecvError> {
        self.receiver.try_recv()
    }

    pub fn recv(&self) -> Result<SessionEvent, RecvError> {
        self.receiver.recv()
    }

    pub fn iter(&self) -> std::sync::mpsc::Iter<'_, SessionEvent> {
        self.receiver.iter()
    }
}

impl Drop for EventSubscription {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Relaxed);
    }
}

/// Controller that collects and distributes session events to subscribers.
///
/// Attach it to [`CystoViewConfig`](crate::config::CystoViewConfig) before
/// launching the UI, then call [`subscribe`](Self::subscribe) (with an
/// optional filter) to receive events on an `mpsc` channel.
#[derive(Clone)]
pub struct EventController {
    inner: Arc<Mutex<EventCtrlInner>>,
}

struct EventCtrlInner {
    subscribers: Vec<Subscriber>,
    start_instant: std::time::Instant,
}

impl EventController {
    /// Create a new event controller.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(EventCtrlInner {
                subscribers: Vec::new(),
                start_instant: std::time::Instant::now(),
            })),
        }
    }

    /// Subscribe to events matching the given filter.
    ///
    /// Returns an [`EventSubscription`] that receives every [`SessionEvent`]
    /// whose `kinds` intersect with the filter mask.
    pub fn subscribe(&self, filter: EventFilter) -> EventSubscription {
        let (tx, rx) = std::sync::mpsc::channel();
        let alive = Arc::new(AtomicBool::new(true));
        let mut inner = self.inner.lock().unwrap();
        inner.subscribers.push(Subscriber {
            filter,
            sender: tx,
            alive: alive.clone(),
        });
        EventSubscription {
            receiver: rx,
            alive,
        }
    }

    /// Subscribe to *all* events (no filtering).
    pub fn subscribe_all(&self) -> EventSubscription {
        self.subscribe(EventFilter::all())
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().unwrap().subscribers.len()
    }

    /// Emit an event to all matching subscribers.
    ///
    /// Called internally by the UI; public so embedding code can inject
    /// synthetic events. Dropped subscriptions are pruned regardless of
    /// whether their filter matches this event.
    pub fn emit(&self, mut event: SessionEvent) {
        let mut inner = self.inner.lock().unwrap();
        event.timestamp = inner.start_instant.elapsed().as_secs_f64();
        inner
            .subscribers
            .retain(|sub| sub.alive.load(Ordering::Relaxed));
        for sub in &inner.subscribers {
            if sub.filter.matches(&event) {
                let _ = sub.sender.send(event.clone());
            }
        }
    }
}

impl Default for EventController {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────────────────────────

//! The eframe application shell.
//!
//! [`CystoViewApp`] owns the session state, the wizard position, and the API
//! client. Each frame it drains completed backend calls from the response
//! channel, renders the header and navigation chrome, and routes the central
//! panel to the current step (step UIs live in `panels/`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use eframe::egui;
use log::{error, info};

use crate::api::{ApiClient, ApiResponse, DeriveResponse};
use crate::config::CystoViewConfig;
use crate::data::peaks::PeakSource;
use crate::data::{Peak, PeakParams, SessionData};
use crate::error::ApiError;
use crate::events::{self, EventKind, SessionEvent};
use crate::session_state::{SegmentMarkers, SessionState};
use crate::wizard::{WizardState, WizardStep};

/// Result of the startup health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Unknown,
    Ok,
    Down,
}

/// Which backend calls are currently in flight. The control that triggered
/// a call stays disabled until its response arrives.
#[derive(Debug, Default)]
pub struct Busy {
    pub upload: bool,
    pub suggest: bool,
    pub run: bool,
    pub derive: bool,
    pub report: bool,
}

pub struct CystoViewApp {
    pub(crate) config: CystoViewConfig,
    pub(crate) state: SessionState,
    pub(crate) wizard: WizardState,
    pub(crate) api: Option<ApiClient>,
    rx: Receiver<ApiResponse>,
    health_cancel: Option<Arc<AtomicBool>>,

    pub(crate) health: HealthStatus,
    /// Config errors, pinned until the app is restarted.
    pub(crate) fatal_error: Option<String>,
    /// The last per-action error, cleared by the next action.
    pub(crate) action_error: Option<String>,
    pub(crate) busy: Busy,

    // ── Transient step-UI state ──────────────────────────────────────────
    pub(crate) pending_file: Option<(String, Vec<u8>)>,
    pub(crate) trim_draft: (f64, f64),
    pub(crate) expected_count: usize,
    pub(crate) search_budget: Option<usize>,
    pub(crate) suggest_candidates: Vec<crate::api::SuggestCandidate>,
    pub(crate) peak_params: PeakParams,
    pub(crate) drag_peak: Option<usize>,
    pub(crate) drag_last_x: Option<f64>,
    pub(crate) param_form: crate::data::SegmentParams,
    /// A params edit arrived while a derivation was in flight; re-run once
    /// the in-flight call completes.
    pub(crate) rederive_queued: bool,
    pub(crate) marker_edit: Option<crate::data::segments::MarkerKind>,
    pub(crate) selected_segment: Option<usize>,
    pub(crate) report: Option<crate::api::ReportResponse>,
    pub(crate) report_generated_at: Option<chrono::DateTime<chrono::Local>>,
}

impl CystoViewApp {
    pub fn new(config: CystoViewConfig) -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut fatal_error = None;
        let api = match ApiClient::new(&config.api_base, tx) {
            Ok(client) => Some(client),
            Err(err) => {
                error!("api client unavailable: {err}");
                fatal_error = Some(err.to_string());
                None
            }
        };
        let health_cancel = api.as_ref().map(|api| api.spawn_health_check());
        Self {
            config,
            state: SessionState::default(),
            wizard: WizardState::default(),
            api,
            rx,
            health_cancel,
            health: HealthStatus::Unknown,
            fatal_error,
            action_error: None,
            busy: Busy::default(),
            pending_file: None,
            trim_draft: (0.0, 0.0),
            expected_count: 8,
            search_budget: None,
            suggest_candidates: Vec::new(),
            peak_params: PeakParams::default(),
            drag_peak: None,
            drag_last_x: None,
            rederive_queued: false,
            param_form: Default::default(),
            marker_edit: None,
            selected_segment: None,
            report: None,
            report_generated_at: None,
        }
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        self.config.emit(event);
    }

    pub(crate) fn report_error(&mut self, err: &ApiError) {
        error!("{err}");
        if err.is_fatal() {
            self.fatal_error = Some(err.to_string());
        } else {
            self.action_error = Some(err.to_string());
        }
        let mut evt = SessionEvent::new(EventKind::API_ERROR);
        evt.error = Some(events::ErrorMeta {
            message: err.to_string(),
        });
        self.emit(evt);
    }

    // ── Response draining ────────────────────────────────────────────────

    fn drain_responses(&mut self) {
        while let Ok(response) = self.rx.try_recv() {
            match response {
                ApiResponse::Health(result) => {
                    self.health = match result {
                        Ok(true) => HealthStatus::Ok,
                        Ok(false) | Err(_) => HealthStatus::Down,
                    };
                }
                ApiResponse::Upload(result) => {
                    self.busy.upload = false;
                    match result {
                        Ok(data) => {
                            let name = self.pending_file.as_ref().map(|(n, _)| n.clone());
                            self.install_dataset(name, data);
                        }
                        Err(err) => self.report_error(&err),
                    }
                }
                ApiResponse::Suggest(result) => {
                    self.busy.suggest = false;
                    match result {
                        Ok(resp) => {
                            self.peak_params = resp.best.params.clone();
                            self.suggest_candidates = resp.candidates;
                            self.apply_detected_peaks(resp.best.peaks);
                        }
                        Err(err) => self.report_error(&err),
                    }
                }
                ApiResponse::Run(result) => {
                    self.busy.run = false;
                    match result {
                        Ok(resp) => {
                            self.peak_params = resp.params_used;
                            self.apply_detected_peaks(resp.peaks);
                        }
                        Err(err) => self.report_error(&err),
                    }
                }
                ApiResponse::Derive(result) => self.finish_derive(result),
                ApiResponse::Report(result) => {
                    self.busy.report = false;
                    match result {
                        Ok(resp) => {
                            let mut evt = SessionEvent::new(EventKind::REPORT_EXPORTED);
                            evt.report = Some(events::ReportMeta {
                                filename: resp.filename.clone(),
                                download_url: resp.download_url.clone(),
                            });
                            self.emit(evt);
                            self.report = Some(resp);
                            self.report_generated_at = Some(chrono::Local::now());
                        }
                        Err(err) => self.report_error(&err),
                    }
                }
            }
        }
    }

    /// Install a freshly parsed recording. Everything derived from the
    /// previous dataset is discarded, including suggestion candidates and
    /// the last report.
    fn install_dataset(&mut self, file_name: Option<String>, data: SessionData) {
        let counts = data.row_counts();
        info!(
            "dataset loaded: {} scale / {} volume / {} pressure rows",
            counts.0, counts.1, counts.2
        );
        self.state.load_dataset(data);
        self.suggest_candidates.clear();
        self.report = None;
        self.report_generated_at = None;
        let mut evt = SessionEvent::new(EventKind::DATASET_LOADED);
        evt.dataset = Some(events::DatasetMeta {
            file_name,
            row_counts: counts,
        });
        self.emit(evt);
    }

    fn finish_derive(&mut self, result: Result<DeriveResponse, ApiError>) {
        self.busy.derive = false;
        match result {
            Ok(resp) => {
                let markers = SegmentMarkers {
                    onset: resp.points.onset,
                    peak: resp.points.peak,
                    empty: resp.points.empty,
                };
                let count = resp.segments.len();
                info!("derived {count} segments");
                self.state.apply_segment_results(resp.segments, markers);
                let mut evt = SessionEvent::new(EventKind::SEGMENTS_DERIVED);
                evt.segments = Some(events::SegmentsMeta {
                    segment_count: count,
                    segment_index: None,
                });
                self.emit(evt);
                if self.rederive_queued {
                    self.rederive_queued = false;
                    self.spawn_derive();
                }
            }
            Err(err) => {
                self.rederive_queued = false;
                self.report_error(&err);
            }
        }
    }

    pub(crate) fn apply_detected_peaks(&mut self, mut detected: Vec<Peak>) {
        for peak in &mut detected {
            peak.source = PeakSource::Auto;
        }
        let count = detected.len();
        info!("detector returned {count} peaks");
        self.state.set_detected_peaks(detected);
        let mut evt = SessionEvent::new(EventKind::PEAKS_CHANGED);
        evt.peaks = Some(events::PeaksMeta {
            count,
            manual: false,
        });
        self.emit(evt);
    }

    /// Emit a peaks-changed event reflecting the current list; used by the
    /// manual-edit handlers in the refine panel.
    pub(crate) fn emit_peaks_changed(&mut self) {
        let mut evt = SessionEvent::new(EventKind::PEAKS_CHANGED);
        evt.peaks = Some(events::PeaksMeta {
            count: self.state.peaks().len(),
            manual: self
                .state
                .peaks()
                .iter()
                .any(|p| p.source == PeakSource::Manual),
        });
        self.emit(evt);
    }

    // ── Chrome ───────────────────────────────────────────────────────────

    fn show_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let step = self.wizard.step();
            ui.heading(format!(
                "Step {}/{}: {}",
                step.number(),
                WizardStep::ALL.len(),
                step.title()
            ));
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                match self.health {
                    HealthStatus::Unknown => ui.label("checking service…"),
                    HealthStatus::Ok => ui.colored_label(egui::Color32::DARK_GREEN, "service ok"),
                    HealthStatus::Down => {
                        ui.colored_label(egui::Color32::RED, "service unreachable")
                    }
                };
            });
        });
        if let Some(fatal) = &self.fatal_error {
            ui.colored_label(egui::Color32::RED, fatal);
        }
        if let Some(message) = &self.action_error {
            let message = message.clone();
            ui.horizontal(|ui| {
                ui.colored_label(egui::Color32::LIGHT_RED, message);
                if ui.small_button("dismiss").clicked() {
                    self.action_error = None;
                }
            });
        }
        ui.separator();
    }

    fn show_navigation(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.horizontal(|ui| {
            let from = self.wizard.step();
            if ui
                .add_enabled(self.wizard.can_go_back(), egui::Button::new("Back"))
                .clicked()
                && self.wizard.prev()
            {
                self.step_changed(from);
            }
            let can_advance = self
                .wizard
                .can_advance(&self.state, self.config.window_epsilon);
            if ui
                .add_enabled(can_advance, egui::Button::new("Next"))
                .clicked()
                && self.wizard.next(&self.state, self.config.window_epsilon)
            {
                self.step_changed(from);
            }
        });
    }

    fn step_changed(&mut self, from: WizardStep) {
        let to = self.wizard.step();
        info!("wizard: {} -> {}", from.title(), to.title());
        let mut evt = SessionEvent::new(EventKind::STEP_CHANGED);
        evt.step = Some(events::StepMeta { from, to });
        self.emit(evt);
    }
}

impl eframe::App for CystoViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_responses();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_header(ui);
            egui::ScrollArea::vertical()
                .auto_shrink([false, true])
                .show(ui, |ui| match self.wizard.step() {
                    WizardStep::Upload => self.show_upload_step(ui),
                    WizardStep::SelectRange => self.show_range_step(ui),
                    WizardStep::AutoPeaks => self.show_auto_peaks_step(ui),
                    WizardStep::RefinePeaks => self.show_refine_step(ui),
                    WizardStep::Segments => self.show_segments_step(ui),
                    WizardStep::Download => self.show_download_step(ui),
                });
            self.show_navigation(ui);
        });

        // Background threads may finish while no input arrives.
        if self.busy.upload
            || self.busy.suggest
            || self.busy.run
            || self.busy.derive
            || self.busy.report
            || self.health == HealthStatus::Unknown
        {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(cancel) = &self.health_cancel {
            cancel.store(true, Ordering::Relaxed);
        }
    }
}

/// Launch the application with the given configuration.
pub fn run(config: CystoViewConfig) -> eframe::Result<()> {
    let title = config.title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(title.clone())
            .with_inner_size([1100.0, 760.0]),
        ..Default::default()
    };
    eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| Ok(Box::new(CystoViewApp::new(config)))),
    )
}

/// Index of the peak whose time is closest to `time`.
pub(crate) fn nearest_peak_index(peaks: &[Peak], time: f64) -> Option<usize> {
    peaks
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            (a.time - time)
                .abs()
                .total_cmp(&(b.time - time).abs())
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DerivePoints, SuggestCandidate};

    /// An app with no API client and no background threads.
    fn offline_app() -> CystoViewApp {
        CystoViewApp::new(CystoViewConfig {
            api_base: String::new(),
            ..Default::default()
        })
    }

    #[test]
    fn new_dataset_discards_stale_suggestion_candidates() {
        let mut app = offline_app();
        app.suggest_candidates.push(SuggestCandidate {
            params: PeakParams::default(),
            peaks: vec![Peak {
                time: 12.0,
                value: 40.0,
                index: None,
                source: PeakSource::Auto,
            }],
            score: 0.5,
        });
        app.report_generated_at = Some(chrono::Local::now());

        app.install_dataset(Some("session2.csv".into()), SessionData::default());

        assert!(app.suggest_candidates.is_empty());
        assert!(app.report.is_none());
        assert!(app.report_generated_at.is_none());
    }

    #[test]
    fn queued_rederive_is_consumed_on_completion() {
        let mut app = offline_app();
        app.busy.derive = true;
        app.rederive_queued = true;
        app.finish_derive(Ok(DeriveResponse {
            points: DerivePoints {
                onset: Vec::new(),
                peak: Vec::new(),
                empty: Vec::new(),
            },
            segments: Vec::new(),
        }));
        assert!(!app.busy.derive);
        assert!(!app.rederive_queued);
        assert!(app.state.segments_derived());

        // A failed derivation drops the queued re-run with the error shown.
        app.busy.derive = true;
        app.rederive_queued = true;
        app.finish_derive(Err(ApiError::Validation("bad params".into())));
        assert!(!app.rederive_queued);
        assert!(app.action_error.is_some());
    }

    #[test]
    fn nearest_peak_index_picks_closest() {
        let peaks: Vec<Peak> = [1.0, 5.0, 9.0]
            .iter()
            .map(|&t| Peak {
                time: t,
                value: 0.0,
                index: None,
                source: PeakSource::Auto,
            })
            .collect();
        assert_eq!(nearest_peak_index(&peaks, 4.2), Some(1));
        assert_eq!(nearest_peak_index(&[], 4.2), None);
    }
}

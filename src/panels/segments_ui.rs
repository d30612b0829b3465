//! Segments step: derive per-void segments and refine onset/empty markers.

use eframe::egui;

use crate::api::DeriveRequest;
use crate::app::CystoViewApp;
use crate::data::segments::MarkerKind;
use crate::data::series::format_number;
use crate::events::{EventKind, SegmentsMeta, SessionEvent};
use crate::plot::PressureChart;

impl CystoViewApp {
    pub(crate) fn show_segments_step(&mut self, ui: &mut egui::Ui) {
        let points = self.state.pressure_points();
        let markers = self.state.markers();
        let interaction = PressureChart::new("segments_chart", &points)
            .peaks(self.state.peaks())
            .markers(&markers.onset, &markers.empty)
            .window(self.state.confirmed_window())
            .interactive(self.marker_edit.is_some())
            .show(ui);

        if let (Some(kind), Some(x), Some(i)) =
            (self.marker_edit, interaction.clicked_x, self.selected_segment)
        {
            if self.state.refine_segment_point(i, kind, x) {
                let mut evt = SessionEvent::new(EventKind::SEGMENT_POINT_EDITED);
                evt.segments = Some(SegmentsMeta {
                    segment_count: self.state.segments().len(),
                    segment_index: Some(i),
                });
                self.emit(evt);
            }
        }

        ui.add_space(8.0);
        self.show_param_form(ui);
        ui.add_space(8.0);
        self.show_segment_table(ui);
        ui.add_space(8.0);
        self.show_marker_tools(ui);
    }

    fn show_param_form(&mut self, ui: &mut egui::Ui) {
        ui.heading("Derivation parameters");
        ui.label("Blank fields use the service defaults.");

        let mut form = self.param_form.clone();
        egui::Grid::new("segment_params_grid")
            .num_columns(4)
            .show(ui, |ui| {
                param_field(ui, "onset gradient", &mut form.onset_gradient, 0.01);
                param_field(ui, "onset pressure drop", &mut form.onset_pressure_drop, 0.1);
                ui.end_row();
                param_field(ui, "empty pressure drop", &mut form.empty_pressure_drop, 0.1);
                param_field(ui, "min after peak (s)", &mut form.min_after_peak_sec, 0.5);
                ui.end_row();
                param_field(
                    ui,
                    "search after prev peak (s)",
                    &mut form.search_start_after_prev_peak_sec,
                    0.5,
                );
                param_field(ui, "fallback onset (s)", &mut form.fallback_onset_sec, 0.5);
                ui.end_row();
                param_field(ui, "fallback empty (s)", &mut form.fallback_empty_sec, 0.5);
                ui.end_row();
            });

        let params_changed = form != self.param_form;
        if params_changed {
            self.param_form = form.clone();
            // A convenience re-run, only once a first derivation succeeded.
            if self.state.set_segment_params(form) {
                if self.busy.derive {
                    // The in-flight result is for superseded params.
                    self.rederive_queued = true;
                } else {
                    self.spawn_derive();
                }
            }
        }

        ui.horizontal(|ui| {
            let can_send =
                self.api.is_some() && !self.busy.derive && !self.state.peaks().is_empty();
            if ui
                .add_enabled(can_send, egui::Button::new("Derive segments"))
                .clicked()
            {
                self.state.set_segment_params(self.param_form.clone());
                self.spawn_derive();
            }
            if self.busy.derive {
                ui.spinner();
                ui.label("deriving…");
            }
        });
    }

    pub(crate) fn spawn_derive(&mut self) {
        let Some(api) = &self.api else {
            return;
        };
        let Some(data) = self.state.effective() else {
            self.action_error = Some("no windowed dataset to derive from".to_string());
            return;
        };
        if self.state.peaks().is_empty() {
            self.action_error = Some("confirm at least one peak first".to_string());
            return;
        }
        let request = DeriveRequest {
            data: data.clone(),
            peaks: self.state.peaks().to_vec(),
            params: self.state.segment_params().clone(),
        };
        self.busy.derive = true;
        self.action_error = None;
        api.spawn_derive(request);
    }

    fn show_segment_table(&mut self, ui: &mut egui::Ui) {
        let segments = self.state.segments();
        if segments.is_empty() {
            ui.weak("No segments derived yet.");
            return;
        }
        ui.heading(format!("Segments ({})", segments.len()));
        egui::Grid::new("segment_table")
            .num_columns(8)
            .striped(true)
            .show(ui, |ui| {
                ui.strong("#");
                ui.strong("onset");
                ui.strong("peak");
                ui.strong("empty");
                ui.strong("IMI (s)");
                ui.strong("max p");
                ui.strong("avg p (gap)");
                ui.strong("Δ volume");
                ui.end_row();
                for segment in segments {
                    ui.label(format!("{}", segment.i + 1));
                    ui.label(format!("{:.1}", segment.onset_time));
                    ui.label(format!("{:.1}", segment.peak_time));
                    ui.label(format!("{:.1}", segment.empty_time));
                    let m = &segment.metrics;
                    ui.label(optional_metric(m.imi_sec));
                    ui.label(optional_metric(m.max_pressure));
                    ui.label(optional_metric(m.avg_pressure_between_empty_and_next_onset));
                    ui.label(optional_metric(m.delta_volume));
                    ui.end_row();
                }
            });
    }

    fn show_marker_tools(&mut self, ui: &mut egui::Ui) {
        if self.state.segments().is_empty() {
            return;
        }
        ui.heading("Refine markers");
        ui.label("Pick a segment and a marker kind, then click the chart to place it.");
        ui.horizontal(|ui| {
            let count = self.state.segments().len();
            let mut selected = self.selected_segment.unwrap_or(0).min(count - 1);
            egui::ComboBox::from_label("segment")
                .selected_text(format!("{}", selected + 1))
                .show_ui(ui, |ui| {
                    for i in 0..count {
                        ui.selectable_value(&mut selected, i, format!("{}", i + 1));
                    }
                });
            self.selected_segment = Some(selected);

            ui.selectable_value(&mut self.marker_edit, Some(MarkerKind::Onset), "onset");
            ui.selectable_value(&mut self.marker_edit, Some(MarkerKind::Empty), "empty");
            ui.selectable_value(&mut self.marker_edit, None, "off");

            if ui.button("Clear onset").clicked()
                && self.state.clear_segment_point(selected, MarkerKind::Onset)
            {
                self.emit(SessionEvent::new(EventKind::SEGMENT_POINT_EDITED));
            }
            if ui.button("Clear empty").clicked()
                && self.state.clear_segment_point(selected, MarkerKind::Empty)
            {
                self.emit(SessionEvent::new(EventKind::SEGMENT_POINT_EDITED));
            }
        });

        ui.horizontal(|ui| {
            let confirmable = self.state.segments_derived() && !self.state.markers_confirmed();
            if ui
                .add_enabled(confirmable, egui::Button::new("Confirm markers"))
                .clicked()
            {
                self.state.confirm_markers();
                self.emit(SessionEvent::new(EventKind::SEGMENTS_CONFIRMED));
            }
            if self.state.markers_confirmed() {
                ui.colored_label(egui::Color32::DARK_GREEN, "markers confirmed");
            }
        });
    }
}

fn optional_metric(value: Option<f64>) -> String {
    match value {
        Some(v) => format_number(v, 2),
        None => "N/A".to_string(),
    }
}

/// Label + nullable drag value, two grid cells.
fn param_field(ui: &mut egui::Ui, label: &str, value: &mut Option<f64>, speed: f64) {
    let mut enabled = value.is_some();
    ui.checkbox(&mut enabled, label);
    if enabled {
        let v = value.get_or_insert(0.0);
        ui.add(egui::DragValue::new(v).speed(speed));
    } else {
        *value = None;
        ui.weak("default");
    }
}

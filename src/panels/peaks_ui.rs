//! Auto-detect step: parameter sweep suggestion or an explicit detector run.

use eframe::egui;

use crate::api::{RunRequest, SuggestRequest};
use crate::app::CystoViewApp;
use crate::plot::PressureChart;

impl CystoViewApp {
    pub(crate) fn show_auto_peaks_step(&mut self, ui: &mut egui::Ui) {
        let points = self.state.pressure_points();
        PressureChart::new("auto_peaks_chart", &points)
            .peaks(self.state.peaks())
            .window(self.state.confirmed_window())
            .show(ui);

        ui.add_space(8.0);
        self.show_suggest_controls(ui);
        ui.add_space(8.0);
        self.show_run_controls(ui);
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            ui.label(format!("{} peaks detected", self.state.peaks().len()));
            if !self.state.peaks_acknowledged()
                && ui.button("Skip automatic detection").clicked()
            {
                self.state.skip_auto_detection();
            }
            if self.state.peaks_acknowledged() && self.state.peaks().is_empty() {
                ui.weak("detection skipped; add peaks manually in the next step");
            }
        });
    }

    fn show_suggest_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Suggest parameters");
        ui.label("Sweep detector parameters toward an expected number of voids.");
        ui.horizontal(|ui| {
            ui.label("expected peaks");
            ui.add(egui::DragValue::new(&mut self.expected_count).range(1..=64));

            let mut budgeted = self.search_budget.is_some();
            if ui.checkbox(&mut budgeted, "search budget").changed() {
                self.search_budget = budgeted.then_some(200);
            }
            if let Some(budget) = &mut self.search_budget {
                ui.add(egui::DragValue::new(budget).range(10..=5000));
            }

            let can_send = self.api.is_some() && !self.busy.suggest;
            if ui
                .add_enabled(can_send, egui::Button::new("Suggest"))
                .clicked()
            {
                if let (Some(api), Some(data)) = (&self.api, self.state.effective()) {
                    self.action_error = None;
                    self.busy.suggest = true;
                    api.spawn_suggest(SuggestRequest {
                        pressure: data.pressure.clone(),
                        expected_count: self.expected_count,
                        search_budget: self.search_budget,
                    });
                }
            }
            if self.busy.suggest {
                ui.spinner();
            }
        });

        if !self.suggest_candidates.is_empty() {
            ui.collapsing("Alternative candidates", |ui| {
                let mut chosen = None;
                for (i, candidate) in self.suggest_candidates.iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(format!(
                            "{} peaks, score {:.3}",
                            candidate.peaks.len(),
                            candidate.score
                        ));
                        if ui.small_button("apply").clicked() {
                            chosen = Some(i);
                        }
                    });
                }
                if let Some(i) = chosen {
                    let candidate = self.suggest_candidates[i].clone();
                    self.peak_params = candidate.params;
                    self.apply_detected_peaks(candidate.peaks);
                }
            });
        }
    }

    fn show_run_controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Run with explicit parameters");
        egui::Grid::new("peak_params_grid")
            .num_columns(2)
            .show(ui, |ui| {
                optional_param(ui, "height", &mut self.peak_params.height, 1.0);
                ui.end_row();
                optional_param(ui, "threshold", &mut self.peak_params.threshold, 0.1);
                ui.end_row();
                optional_param(ui, "distance", &mut self.peak_params.distance, 1.0);
                ui.end_row();
                optional_param(ui, "prominence", &mut self.peak_params.prominence, 0.1);
                ui.end_row();
                optional_param(ui, "width", &mut self.peak_params.width, 1.0);
                ui.end_row();
            });

        let can_send = self.api.is_some() && !self.busy.run;
        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_send, egui::Button::new("Run detection"))
                .clicked()
            {
                if let (Some(api), Some(data)) = (&self.api, self.state.effective()) {
                    self.action_error = None;
                    self.busy.run = true;
                    api.spawn_run(RunRequest {
                        pressure: data.pressure.clone(),
                        params: self.peak_params.clone(),
                    });
                }
            }
            if self.busy.run {
                ui.spinner();
            }
        });
    }
}

/// A nullable numeric parameter: checkbox toggles null, drag edits the value.
fn optional_param(ui: &mut egui::Ui, label: &str, value: &mut Option<f64>, speed: f64) {
    let mut enabled = value.is_some();
    ui.checkbox(&mut enabled, label);
    if enabled {
        let v = value.get_or_insert(0.0);
        ui.add(egui::DragValue::new(v).speed(speed));
    } else {
        *value = None;
        ui.weak("service default");
    }
}

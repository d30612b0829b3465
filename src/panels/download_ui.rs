//! Download step: session summary and report export.

use eframe::egui;

use crate::api::ReportRequest;
use crate::app::CystoViewApp;
use crate::data::series::{self, format_number};

impl CystoViewApp {
    pub(crate) fn show_download_step(&mut self, ui: &mut egui::Ui) {
        self.show_summary(ui);
        ui.add_space(12.0);

        let can_send = self.api.is_some() && !self.busy.report && self.state.original().is_some();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(can_send, egui::Button::new("Generate report"))
                .clicked()
            {
                if let (Some(api), Some(data)) = (&self.api, self.state.effective()) {
                    let request = ReportRequest {
                        data: data.clone(),
                        peaks: self.state.peaks().to_vec(),
                        kept_interval_count: (!self.state.trims().is_empty())
                            .then(|| self.state.trims().len()),
                    };
                    self.busy.report = true;
                    self.action_error = None;
                    api.spawn_report(request);
                }
            }
            if self.busy.report {
                ui.spinner();
                ui.label("generating…");
            }
        });

        if let Some(report) = &self.report {
            let url = format!("{}{}", self.config.api_base, report.download_url);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label(format!("Report ready: {}", report.filename));
                ui.hyperlink_to("download", url);
                if let Some(at) = self.report_generated_at {
                    ui.weak(format!("generated {}", at.format("%Y-%m-%d %H:%M:%S")));
                }
            });
        }
    }

    fn show_summary(&mut self, ui: &mut egui::Ui) {
        ui.heading("Session summary");
        let Some(data) = self.state.effective() else {
            ui.weak("Nothing analyzed yet.");
            return;
        };
        let pressure = series::to_points(&data.pressure);
        let volume = series::to_points(&data.volume);

        egui::Grid::new("summary_grid").num_columns(2).show(ui, |ui| {
            ui.label("Analyzed duration");
            ui.label(format!("{} s", format_number(series::duration(&pressure), 1)));
            ui.end_row();
            ui.label("Max bladder pressure");
            ui.label(format_number(series::max_y(&pressure), 2));
            ui.end_row();
            ui.label("Final infused volume");
            ui.label(format_number(series::final_y(&volume), 2));
            ui.end_row();
            ui.label("Peaks");
            ui.label(format!("{}", self.state.peaks().len()));
            ui.end_row();
            ui.label("Segments");
            ui.label(format!("{}", self.state.segments().len()));
            ui.end_row();
            ui.label("Trims applied");
            ui.label(format!("{}", self.state.trims().len()));
            ui.end_row();
        });
    }
}

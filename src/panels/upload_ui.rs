//! Upload step: pick a recording file and send it for parsing.

use eframe::egui;
use log::warn;

use crate::app::CystoViewApp;
use crate::data::series;

impl CystoViewApp {
    pub(crate) fn show_upload_step(&mut self, ui: &mut egui::Ui) {
        ui.label("Select a cystometry recording to analyze.");
        ui.add_space(8.0);

        ui.horizontal(|ui| {
            if ui.button("Choose file…").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Recordings", &["csv", "xlsx", "txt"])
                    .pick_file()
                {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| "recording".to_string());
                    match std::fs::read(&path) {
                        Ok(bytes) => {
                            self.pending_file = Some((name, bytes));
                            self.action_error = None;
                        }
                        Err(err) => {
                            warn!("could not read {}: {err}", path.display());
                            self.action_error = Some(format!("could not read file: {err}"));
                        }
                    }
                }
            }
            match &self.pending_file {
                Some((name, bytes)) => {
                    ui.label(format!("{name} ({} bytes)", bytes.len()));
                }
                None => {
                    ui.weak("no file selected");
                }
            }
        });

        ui.add_space(8.0);
        let can_upload =
            self.pending_file.is_some() && !self.busy.upload && self.api.is_some();
        if ui
            .add_enabled(can_upload, egui::Button::new("Upload"))
            .clicked()
        {
            if let (Some((name, bytes)), Some(api)) = (self.pending_file.clone(), &self.api) {
                self.action_error = None;
                self.busy.upload = true;
                api.spawn_upload(name, bytes);
            }
        }
        if self.busy.upload {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("parsing recording…");
            });
        }

        if let Some(data) = self.state.original() {
            let (scale, volume, pressure) = data.row_counts();
            ui.add_space(12.0);
            ui.separator();
            ui.label(format!(
                "Loaded: {scale} scale rows, {volume} volume rows, {pressure} pressure rows"
            ));
            let points = series::to_points(&data.pressure);
            ui.label(format!(
                "Recording duration: {} s",
                series::format_number(series::duration(&points), 1)
            ));
        }
    }
}

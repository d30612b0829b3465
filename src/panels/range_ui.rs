//! Range step: author keep-trims and commit the analysis window.

use eframe::egui;

use crate::app::CystoViewApp;
use crate::data::series;
use crate::data::Interval;
use crate::events::{EventKind, RangeMeta, SessionEvent};
use crate::plot;

impl CystoViewApp {
    pub(crate) fn show_range_step(&mut self, ui: &mut egui::Ui) {
        let Some(current) = self.state.current() else {
            ui.weak("Upload a recording first.");
            return;
        };
        let extent = self
            .state
            .original()
            .and_then(|d| d.observed_time_range())
            .unwrap_or((0.0, 0.0));

        let scale = series::to_points(&current.scale);
        let volume = series::to_points(&current.volume);
        let pressure = series::to_points(&current.pressure);
        let window = self.state.confirmed_window();
        plot::channel_overview(ui, "range_overview", &scale, &volume, &pressure, window);

        ui.add_space(8.0);
        self.show_trim_editor(ui, extent);
        ui.add_space(8.0);
        self.show_window_editor(ui);
    }

    fn show_trim_editor(&mut self, ui: &mut egui::Ui, extent: (f64, f64)) {
        ui.heading("Trims");
        ui.label("Add time ranges to keep; everything outside their union is dropped.");

        let mut removed = None;
        for (i, trim) in self.state.trims().iter().enumerate() {
            ui.horizontal(|ui| {
                let t = trim.normalized();
                ui.label(format!("{:.1} s – {:.1} s", t.start, t.end));
                if ui.small_button("remove").clicked() {
                    removed = Some(i);
                }
            });
        }
        if let Some(i) = removed {
            let mut trims = self.state.trims().to_vec();
            trims.remove(i);
            self.apply_trims(trims);
        }

        ui.horizontal(|ui| {
            ui.label("start");
            ui.add(
                egui::DragValue::new(&mut self.trim_draft.0)
                    .speed(1.0)
                    .range(extent.0..=extent.1)
                    .suffix(" s"),
            );
            ui.label("end");
            ui.add(
                egui::DragValue::new(&mut self.trim_draft.1)
                    .speed(1.0)
                    .range(extent.0..=extent.1)
                    .suffix(" s"),
            );
            if ui.button("Add trim").clicked() {
                let mut trims = self.state.trims().to_vec();
                trims.push(Interval::new(self.trim_draft.0, self.trim_draft.1));
                self.apply_trims(trims);
            }
            let has_trims = !self.state.trims().is_empty();
            if ui
                .add_enabled(has_trims, egui::Button::new("Restore full recording"))
                .clicked()
            {
                self.apply_trims(Vec::new());
            }
        });
    }

    fn apply_trims(&mut self, trims: Vec<Interval>) {
        let count = trims.len();
        self.state.set_trims(trims);
        // Candidates were computed against the previous dataset view.
        self.suggest_candidates.clear();
        let (start, end) = self
            .state
            .current()
            .and_then(|d| d.observed_time_range())
            .unwrap_or((0.0, 0.0));
        let mut evt = SessionEvent::new(EventKind::TRIMS_CHANGED);
        evt.range = Some(RangeMeta {
            start,
            end,
            interval_count: count,
        });
        self.emit(evt);
    }

    fn show_window_editor(&mut self, ui: &mut egui::Ui) {
        ui.heading("Analysis window");
        let Some((min, max)) = self.state.current().and_then(|d| d.observed_time_range()) else {
            ui.weak("The trimmed dataset is empty; adjust the trims.");
            return;
        };
        let (mut start, mut end) = self.state.draft_window().unwrap_or((min, max));

        ui.horizontal(|ui| {
            ui.label("start");
            let a = ui.add(
                egui::Slider::new(&mut start, min..=max)
                    .suffix(" s")
                    .fixed_decimals(1),
            );
            ui.label("end");
            let b = ui.add(
                egui::Slider::new(&mut end, min..=max)
                    .suffix(" s")
                    .fixed_decimals(1),
            );
            if a.changed() || b.changed() {
                self.state.set_draft_window(start, end);
            }
        });

        let confirmed = self.state.window_is_confirmed(self.config.window_epsilon);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(!confirmed, egui::Button::new("Confirm window"))
                .clicked()
                && self.state.confirm_window()
            {
                self.suggest_candidates.clear();
                if let Some(window) = self.state.confirmed_window() {
                    let mut evt = SessionEvent::new(EventKind::WINDOW_CHANGED);
                    evt.range = Some(RangeMeta {
                        start: window.start,
                        end: window.end,
                        interval_count: 1,
                    });
                    self.emit(evt);
                }
            }
            if confirmed {
                ui.colored_label(egui::Color32::DARK_GREEN, "window confirmed");
            } else if self.state.confirmed_window().is_some() {
                ui.colored_label(
                    egui::Color32::YELLOW,
                    "window changed since last confirmation",
                );
            }
        });
    }
}

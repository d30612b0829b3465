//! Refine step: manual peak placement with snap-to-local-max.
//!
//! Clicking the chart adds a peak near the pointer; dragging moves the
//! nearest peak, re-snapping against the live pointer position and
//! committing on release. Any edit flips the whole list to manual.

use eframe::egui;

use crate::app::{self, CystoViewApp};
use crate::data::peaks::PeakSource;
use crate::events::{EventKind, SessionEvent};
use crate::plot::PressureChart;

impl CystoViewApp {
    pub(crate) fn show_refine_step(&mut self, ui: &mut egui::Ui) {
        ui.label("Click to add a peak; drag a peak to move it. Edits snap to the nearest local maximum.");

        let points = self.state.pressure_points();
        let interaction = PressureChart::new("refine_chart", &points)
            .peaks(self.state.peaks())
            .window(self.state.confirmed_window())
            .interactive(true)
            .show(ui);

        let snap_window = self.config.snap_window_secs;
        if let Some(x) = interaction.clicked_x {
            if self
                .state
                .add_peak_near(x, snap_window, self.config.peak_dedupe_secs)
            {
                self.emit_peaks_changed();
            }
        }
        if let Some(x) = interaction.drag_x {
            if self.drag_peak.is_none() {
                self.drag_peak = app::nearest_peak_index(self.state.peaks(), x);
            }
            // The pointer position is gone by the release frame, so keep it.
            self.drag_last_x = Some(x);
        }
        if interaction.drag_released {
            if let (Some(i), Some(x)) = (self.drag_peak.take(), self.drag_last_x.take()) {
                if self.state.move_peak(i, x, snap_window) {
                    self.emit_peaks_changed();
                }
            }
        }

        ui.add_space(8.0);
        self.show_peak_list(ui);

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let confirmable = !self.state.peaks().is_empty() && !self.state.peaks_confirmed();
            if ui
                .add_enabled(confirmable, egui::Button::new("Confirm peaks"))
                .clicked()
            {
                self.state.confirm_peaks();
                self.emit(SessionEvent::new(EventKind::PEAKS_CONFIRMED));
            }
            if self.state.peaks_confirmed() {
                ui.colored_label(egui::Color32::DARK_GREEN, "peaks confirmed");
            } else if !self.state.peaks().is_empty() {
                ui.weak("confirm the list to continue");
            }
        });
    }

    fn show_peak_list(&mut self, ui: &mut egui::Ui) {
        let manual = self
            .state
            .peaks()
            .iter()
            .any(|p| p.source == PeakSource::Manual);
        ui.heading(format!(
            "Peaks ({}{})",
            self.state.peaks().len(),
            if manual { ", manually edited" } else { "" }
        ));

        let mut removed = None;
        egui::Grid::new("peak_list").num_columns(4).show(ui, |ui| {
            for (i, peak) in self.state.peaks().iter().enumerate() {
                ui.label(format!("{}", i + 1));
                ui.label(format!("t = {:.2} s", peak.time));
                ui.label(format!("p = {:.2}", peak.value));
                if ui.small_button("delete").clicked() {
                    removed = Some(i);
                }
                ui.end_row();
            }
        });
        if let Some(i) = removed {
            if self.state.remove_peak(i) {
                self.emit_peaks_changed();
            }
        }
    }
}

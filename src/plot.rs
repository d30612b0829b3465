//! Chart helpers shared by the wizard panels.
//!
//! This module encapsulates the pressure chart and related interactions:
//! - drawing the channel traces and the active window bounds
//! - drawing peak and onset/empty markers
//! - mapping pointer clicks and drags back to the time axis

use egui::Color32;
use egui_plot::{Legend, Line, Plot, Points, VLine};

use crate::data::series::Point;
use crate::data::windowing::ExperimentWindow;
use crate::data::{Peak, SegmentPoint};

pub const PRESSURE_COLOR: Color32 = Color32::from_rgb(0x1f, 0x77, 0xb4);
pub const VOLUME_COLOR: Color32 = Color32::from_rgb(0x2c, 0xa0, 0x2c);
pub const SCALE_COLOR: Color32 = Color32::from_rgb(0xff, 0x7f, 0x0e);
pub const PEAK_COLOR: Color32 = Color32::from_rgb(0xd6, 0x27, 0x28);
pub const ONSET_COLOR: Color32 = Color32::from_rgb(0x94, 0x67, 0xbd);
pub const EMPTY_COLOR: Color32 = Color32::from_rgb(0x8c, 0x56, 0x4b);

/// Pointer activity on a chart, already mapped to the time axis.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChartInteraction {
    /// X of a primary click inside the plot area.
    pub clicked_x: Option<f64>,
    /// X of the pointer while a primary drag is in progress.
    pub drag_x: Option<f64>,
    /// The drag ended this frame.
    pub drag_released: bool,
}

fn to_plot_points(points: &[Point]) -> Vec<[f64; 2]> {
    points.iter().map(|p| [p.x, p.y]).collect()
}

fn marker_points(markers: &[SegmentPoint]) -> Vec<[f64; 2]> {
    markers
        .iter()
        .filter_map(|m| Some([m.time?, m.value?]))
        .collect()
}

/// The pressure chart with peak and segment-marker overlays.
///
/// All overlays are optional; panels enable what their step needs.
pub struct PressureChart<'a> {
    id: &'a str,
    points: &'a [Point],
    peaks: &'a [Peak],
    onsets: &'a [SegmentPoint],
    empties: &'a [SegmentPoint],
    window: Option<ExperimentWindow>,
    height: f32,
    interactive: bool,
}

impl<'a> PressureChart<'a> {
    pub fn new(id: &'a str, points: &'a [Point]) -> Self {
        Self {
            id,
            points,
            peaks: &[],
            onsets: &[],
            empties: &[],
            window: None,
            height: 320.0,
            interactive: false,
        }
    }

    pub fn peaks(mut self, peaks: &'a [Peak]) -> Self {
        self.peaks = peaks;
        self
    }

    pub fn markers(mut self, onsets: &'a [SegmentPoint], empties: &'a [SegmentPoint]) -> Self {
        self.onsets = onsets;
        self.empties = empties;
        self
    }

    /// Draw the window bounds as vertical lines.
    pub fn window(mut self, window: Option<ExperimentWindow>) -> Self {
        self.window = window;
        self
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Report clicks and drags in [`ChartInteraction`].
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn show(self, ui: &mut egui::Ui) -> ChartInteraction {
        let mut plot = Plot::new(self.id)
            .height(self.height)
            .allow_scroll(false)
            .legend(Legend::default())
            .x_axis_formatter(|x, _range| format!("{:.0} s", x.value));
        if self.interactive {
            // Dragging moves markers, not the view.
            plot = plot.allow_drag(false).allow_boxed_zoom(false);
        }

        let response = plot.show(ui, |plot_ui| {
            if let Some(window) = self.window {
                plot_ui.vline(VLine::new("window start", window.start).color(Color32::GRAY));
                plot_ui.vline(VLine::new("window end", window.end).color(Color32::GRAY));
            }
            plot_ui.line(
                Line::new("Bladder pressure", to_plot_points(self.points))
                    .color(PRESSURE_COLOR)
                    .width(1.5),
            );
            if !self.peaks.is_empty() {
                let pts: Vec<[f64; 2]> = self.peaks.iter().map(|p| [p.time, p.value]).collect();
                plot_ui.points(
                    Points::new("Peaks", pts)
                        .radius(4.5)
                        .color(PEAK_COLOR)
                        .shape(egui_plot::MarkerShape::Diamond),
                );
            }
            let onsets = marker_points(self.onsets);
            if !onsets.is_empty() {
                plot_ui.points(Points::new("Onset", onsets).radius(4.0).color(ONSET_COLOR));
            }
            let empties = marker_points(self.empties);
            if !empties.is_empty() {
                plot_ui.points(Points::new("Empty", empties).radius(4.0).color(EMPTY_COLOR));
            }
        });

        let mut interaction = ChartInteraction::default();
        if self.interactive {
            let transform = response.transform;
            if response.response.clicked() {
                if let Some(pos) = response.response.interact_pointer_pos() {
                    interaction.clicked_x = Some(transform.value_from_position(pos).x);
                }
            }
            if response.response.dragged_by(egui::PointerButton::Primary) {
                if let Some(pos) = response.response.interact_pointer_pos() {
                    interaction.drag_x = Some(transform.value_from_position(pos).x);
                }
            }
            interaction.drag_released = response
                .response
                .drag_stopped_by(egui::PointerButton::Primary);
        }
        interaction
    }
}

/// Overview chart of all three channels, used while choosing trims and the
/// analysis window.
pub fn channel_overview(
    ui: &mut egui::Ui,
    id: &str,
    scale: &[Point],
    volume: &[Point],
    pressure: &[Point],
    window: Option<ExperimentWindow>,
) {
    Plot::new(id)
        .height(280.0)
        .allow_scroll(false)
        .legend(Legend::default())
        .x_axis_formatter(|x, _range| format!("{:.0} s", x.value))
        .show(ui, |plot_ui| {
            if let Some(window) = window {
                plot_ui.vline(VLine::new("window start", window.start).color(Color32::GRAY));
                plot_ui.vline(VLine::new("window end", window.end).color(Color32::GRAY));
            }
            plot_ui.line(
                Line::new("Scale", to_plot_points(scale))
                    .color(SCALE_COLOR)
                    .width(1.0),
            );
            plot_ui.line(
                Line::new("Infused volume", to_plot_points(volume))
                    .color(VOLUME_COLOR)
                    .width(1.0),
            );
            plot_ui.line(
                Line::new("Bladder pressure", to_plot_points(pressure))
                    .color(PRESSURE_COLOR)
                    .width(1.0),
            );
        });
}

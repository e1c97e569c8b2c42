// src/gui.rs
use std::time::Duration;

use eframe::egui;
use egui::Color32;
use egui_plot::{Line, Plot, PlotBounds, PlotPoints};

use crate::acquisition::{AcquisitionController, ConnectionState, BAUD_RATE, MAX_POINTS};

/// Thin UI shell: port selection, start/stop, and the live plot. All the
/// actual acquisition work happens inside [`AcquisitionController`].
pub struct LiveEcgApp {
    controller: AcquisitionController,
    ports: Vec<String>,
    selected_port: Option<String>,
    last_error: Option<String>,
}

impl Default for LiveEcgApp {
    fn default() -> Self {
        Self {
            controller: AcquisitionController::new(),
            ports: scan_ports(),
            selected_port: None,
            last_error: None,
        }
    }
}

fn scan_ports() -> Vec<String> {
    match serialport::available_ports() {
        Ok(ports) => ports.into_iter().map(|p| p.port_name).collect(),
        Err(err) => {
            log::warn!("failed to enumerate serial ports: {err}");
            Vec::new()
        }
    }
}

impl LiveEcgApp {
    fn start_plotting(&mut self) {
        let Some(port) = self.selected_port.clone() else {
            self.last_error = Some("select a serial port first".to_owned());
            return;
        };
        match self.controller.start(&port, BAUD_RATE) {
            Ok(()) => self.last_error = None,
            Err(err) => self.last_error = Some(err.to_string()),
        }
    }
}

impl eframe::App for LiveEcgApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let running = self.controller.state() == ConnectionState::Running;

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let selected = self.selected_port.as_deref().unwrap_or("Select COM Port");
                egui::ComboBox::from_id_source("port_combo")
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for port in &self.ports {
                            ui.selectable_value(&mut self.selected_port, Some(port.clone()), port);
                        }
                    });
                if ui.button("Rescan").clicked() {
                    self.ports = scan_ports();
                }
                ui.separator();
                if ui
                    .add_enabled(!running, egui::Button::new("Start Plotting"))
                    .clicked()
                {
                    self.start_plotting();
                }
                if ui
                    .add_enabled(running, egui::Button::new("Stop Plotting"))
                    .clicked()
                {
                    self.controller.stop();
                }
                ui.label(if running { "streaming" } else { "idle" });
            });
            if let Some(err) = &self.last_error {
                ui.colored_label(Color32::LIGHT_RED, err);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let samples = self.controller.snapshot();
            let points: Vec<[f64; 2]> = samples
                .iter()
                .enumerate()
                .map(|(i, &v)| [i as f64, v])
                .collect();
            Plot::new("ecg_plot")
                .allow_drag(false)
                .allow_zoom(false)
                .allow_scroll(false)
                .show(ui, |plot_ui| {
                    plot_ui.set_plot_bounds(plot_bounds(&samples));
                    plot_ui.line(Line::new(PlotPoints::new(points)).color(Color32::RED));
                });
        });

        // Keep redrawing while samples stream in; the controller has no
        // push channel to the UI, the plot just re-snapshots the buffer.
        ctx.request_repaint_after(Duration::from_millis(33));
    }
}

/// Fixed x range over the display window; y auto-scaled to the visible
/// samples with a 10% margin above and below.
fn plot_bounds(samples: &[f64]) -> PlotBounds {
    let x_max = (MAX_POINTS - 1) as f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &value in samples {
        min = min.min(value);
        max = max.max(value);
    }
    if samples.is_empty() {
        return PlotBounds::from_min_max([0.0, -1.0], [x_max, 1.0]);
    }
    let margin = match max - min {
        range if range > 0.0 => 0.1 * range,
        // Flat trace: give it some breathing room instead of a zero-height axis.
        _ => 1.0,
    };
    PlotBounds::from_min_max([0.0, min - margin], [x_max, max + margin])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_add_ten_percent_margin() {
        let bounds = plot_bounds(&[0.0, 100.0, 50.0]);
        assert_eq!(bounds.min()[1], -10.0);
        assert_eq!(bounds.max()[1], 110.0);
        assert_eq!(bounds.min()[0], 0.0);
        assert_eq!(bounds.max()[0], (MAX_POINTS - 1) as f64);
    }

    #[test]
    fn bounds_handle_empty_and_flat_snapshots() {
        let empty = plot_bounds(&[]);
        assert!(empty.min()[1] < empty.max()[1]);
        let flat = plot_bounds(&[42.0, 42.0]);
        assert_eq!(flat.min()[1], 41.0);
        assert_eq!(flat.max()[1], 43.0);
    }
}

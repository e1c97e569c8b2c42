// src/main.rs
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
mod acquisition;
mod gui;
use eframe::egui;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let viewport = egui::ViewportBuilder::default()
        .with_inner_size([800.0, 600.0])
        .with_min_inner_size([480.0, 360.0])
        .with_title("LiveECG");
    let options = eframe::NativeOptions {
        viewport,
        ..Default::default()
    };
    eframe::run_native(
        "LiveECG",
        options,
        Box::new(|_cc| Box::new(gui::LiveEcgApp::default())),
    )
}

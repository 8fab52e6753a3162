pub mod emulator;

use crate::gb::cartridge::Cartridge;
use crate::gb::{EmulatorConfig, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::gui::emulator::EmulatorFrontend;
use eframe::egui;
use egui::{CentralPanel, ViewportBuilder};

pub struct Dmgboy {
    frontend: EmulatorFrontend,
}

impl Dmgboy {
    pub fn new(cartridge: Cartridge, config: EmulatorConfig) -> Self {
        Self {
            frontend: EmulatorFrontend::start(cartridge, config),
        }
    }
}

impl eframe::App for Dmgboy {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        CentralPanel::default().show(ctx, |ui| {
            self.frontend.update(ctx, ui);
        });

        if ctx.input(|i| i.viewport().close_requested()) {
            self.frontend.shutdown();
        }
    }
}

/// Opens the main window and blocks until it is closed.
pub fn run(cartridge: Cartridge, config: EmulatorConfig) -> eframe::Result<()> {
    let upscale = config.upscale.max(1) as f32;
    let title = format!("dmgboy - {}", cartridge.header.title);
    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_title(title.as_str())
            .with_inner_size([
                f32::from(SCREEN_WIDTH) * upscale + 16.0,
                f32::from(SCREEN_HEIGHT) * upscale + 16.0,
            ])
            .with_resizable(false),
        ..Default::default()
    };
    eframe::run_native(
        &title,
        options,
        Box::new(move |_| Ok(Box::new(Dmgboy::new(cartridge, config)))),
    )
}

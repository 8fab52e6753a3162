use crate::gb::EmulatorConfig;
use crate::gb::cartridge::Cartridge;
use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

mod gb;
mod gui;

#[derive(Parser, Debug)]
#[command(version, about = "Game Boy (DMG) emulator")]
struct Args {
    /// Path of the ROM to load
    #[arg(value_name = "ROM", default_value = "roms/Tetris.gb")]
    rom: PathBuf,

    /// Scale factor of the window
    #[arg(long, default_value_t = 3)]
    upscale: usize,

    /// Disable fps limit for debugging purposes
    #[arg(long)]
    no_fps_limit: bool,
}

impl From<Args> for EmulatorConfig {
    fn from(args: Args) -> Self {
        Self {
            rom: args.rom,
            upscale: args.upscale,
            fps_limit: !args.no_fps_limit,
            headless: false,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let config = EmulatorConfig::from(Args::parse());

    println!("Loading cartridge {} ...", config.rom.display());
    let cartridge = Cartridge::try_from(config.rom.as_path())?;
    println!("  -> {cartridge}");

    gui::run(cartridge, config)?;
    Ok(())
}

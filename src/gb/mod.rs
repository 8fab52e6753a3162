use crate::gb::bus::{InterruptRegister, MemoryBus};
use crate::gb::cartridge::Cartridge;
use crate::gb::cpu::CPU;
use crate::gb::io::IoRegister;
use crate::gb::joypad::JoypadInput;
use crate::gb::ppu::PPU;
use crate::gb::ppu::buffer::FrameBuffer;
use crate::gb::ppu::display::Display;
use crate::gb::timer::Timer;
use log::{debug, error, info};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

pub mod bus;
pub mod cartridge;
pub mod constants;
pub mod cpu;
pub mod io;
pub mod joypad;
pub mod ppu;
#[cfg(test)]
mod tests;
pub mod timer;
mod utils;

pub const DISPLAY_REFRESH_RATE: f64 = 59.73;

pub const SCREEN_WIDTH: u8 = 160;
pub const SCREEN_HEIGHT: u8 = 144;

/// LY wraps to 0 when reaching this line, lines 144 to 153 are V-Blank.
pub const SCAN_LINES: u8 = 154;

pub type GBResult<T> = Result<T, GBError>;

/// All errors that can end an emulation session or prevent it from starting.
#[derive(Debug, thiserror::Error)]
pub enum GBError {
    #[error("unable to read ROM: {0}")]
    Io(#[from] std::io::Error),
    #[error("ROM image is too small ({0} bytes) to contain a cartridge header")]
    RomTooSmall(usize),
    #[error("cartridge type {0:#04x} is not supported")]
    UnsupportedCartridge(u8),
    #[error("unsupported ROM size code {0:#04x}")]
    UnsupportedRomSize(u8),
    #[error("unsupported RAM size code {0:#04x}")]
    UnsupportedRamSize(u8),
    #[error("unknown register name '{0}'")]
    UnknownRegister(String),
    #[error("write to unmapped register address {0:#06x}")]
    UnmappedRegister(u16),
    #[error("register {0} is not a counter")]
    NotACounter(IoRegister),
}

/// This trait defines a common interface for everything that is addressable by the CPU.
pub trait AddressSpace {
    /// Writes a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Reads a byte from the given address.
    fn read(&mut self, address: u16) -> u8;
}

/// The bus as seen by the CPU: plain memory access plus the interrupt registers.
pub trait Bus: AddressSpace {
    /// Indicates whether an enabled interrupt is pending.
    fn has_irq(&self) -> bool {
        (self.get_ie() & self.get_if()).intersects(InterruptRegister::all())
    }

    #[cfg(test)]
    fn set_ie(&mut self, r: InterruptRegister);
    fn get_ie(&self) -> InterruptRegister;
    fn set_if(&mut self, r: InterruptRegister);
    fn get_if(&self) -> InterruptRegister;
}

/// Messages sent from the emulator to the frontend.
pub enum EmulatorMessage {
    Frame(FrameBuffer),
    Aborted(String), // Fatal fault that ended the session
}

/// Messages sent from the frontend to the emulator.
pub enum FrontendMessage {
    Stop,
    Input(JoypadInput),
}

/// Holds the configuration for the emulator.
#[derive(Clone, Debug)]
pub struct EmulatorConfig {
    pub rom: PathBuf,     // Path to the ROM file
    pub upscale: usize,   // Scale factor for the frontend
    pub fps_limit: bool,  // Throttle to the display refresh rate
    pub headless: bool,   // Don't hand frames to a renderer
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            rom: PathBuf::from("roms/Tetris.gb"),
            upscale: 3,
            fps_limit: true,
            headless: false,
        }
    }
}

/// Holds and drives the CPU, the display controller and the timer in lockstep,
/// all of them sharing the same `MemoryBus`.
pub struct Emulator {
    cpu: CPU,
    ppu: PPU,
    timer: Timer,
    bus: MemoryBus,
    sender: Sender<EmulatorMessage>,
    receiver: Receiver<FrontendMessage>,
    is_running: bool,
}

impl Emulator {
    pub fn new(
        sender: Sender<EmulatorMessage>,
        receiver: Receiver<FrontendMessage>,
        cartridge: Cartridge,
        config: &EmulatorConfig,
    ) -> Self {
        let display = (!config.headless).then(|| Display::new(sender.clone(), config.fps_limit));
        Self {
            cpu: CPU::new(),
            ppu: PPU::new(display),
            timer: Timer::default(),
            bus: MemoryBus::new(cartridge),
            sender,
            receiver,
            is_running: true,
        }
    }

    /// Runs until the frontend asks to stop or a fatal fault occurs.
    pub fn run(&mut self) -> GBResult<()> {
        info!(target: "emulator", "Starting emulation of {}", self.bus.cartridge);
        while self.is_running {
            self.handle_message();
            if let Err(err) = self.step() {
                error!(target: "emulator", "Emulation aborted: {err}");
                self.send_message(EmulatorMessage::Aborted(err.to_string()));
                return Err(err);
            }
        }
        info!(target: "emulator", "Emulation stopped after {} frames", self.ppu.frames());
        Ok(())
    }

    /// Executes exactly one instruction and advances the timer and the display controller
    /// by its cycle cost. Returns the number of cycles consumed.
    pub fn step(&mut self) -> GBResult<u16> {
        let cycles = self.cpu.step(&mut self.bus);
        self.timer.step(&mut self.bus, cycles);
        self.ppu.step(&mut self.bus, cycles);
        match self.bus.take_fault() {
            Some(err) => Err(err),
            None => Ok(cycles),
        }
    }

    /// Sends a message to the frontend.
    #[inline]
    fn send_message(&self, message: EmulatorMessage) {
        if self.sender.send(message).is_err() {
            debug!(target: "emulator", "Frontend isn't listening");
        }
    }

    /// Checks for a new `FrontendMessage` and handles it.
    fn handle_message(&mut self) {
        match self.receiver.try_recv() {
            Ok(FrontendMessage::Stop) => self.is_running = false,
            Ok(FrontendMessage::Input(input)) => self.bus.handle_input(input),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => self.is_running = false,
            Err(std::sync::mpsc::TryRecvError::Empty) => {}
        }
    }
}

//! Peripheral register bank mapped to 0xFF00 - 0xFF4B and 0xFFFF.
//!
//! Every register is identified by an `IoRegister`. Name, address, access kind and power-on
//! value live in a single table indexed by that identifier, lookups by address and by name
//! both resolve through it.

use crate::gb::bus::InterruptRegister;
use crate::gb::constants::*;
use crate::gb::joypad::{Joypad, JoypadInput};
use crate::gb::{GBError, GBResult};
use log::{trace, warn};
use std::fmt;
use std::str::FromStr;

/// How the processor sees a register.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Access {
    /// Plain storage, reads return the last written byte.
    Storage,
    /// Peripheral is not emulated, reads return 0 and writes are dropped.
    Unimplemented,
    /// Advanced by hardware through `IoRegisters::increment`.
    Counter,
    /// Lower nibble reflects the button state.
    Joypad,
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum IoRegister {
    P1,
    SB,
    SC,
    DIV,
    TIMA,
    TMA,
    TAC,
    IF,
    NR10,
    NR11,
    NR12,
    NR13,
    NR14,
    NR21,
    NR22,
    NR23,
    NR24,
    NR30,
    NR31,
    NR32,
    NR33,
    NR34,
    NR41,
    NR42,
    NR43,
    NR44,
    NR50,
    NR51,
    NR52,
    LCDC,
    STAT,
    SCY,
    SCX,
    LY,
    LYC,
    DMA,
    BGP,
    OBP0,
    OBP1,
    WY,
    WX,
    IE,
}

struct RegisterInfo {
    name: &'static str,
    address: u16,
    access: Access,
    initial: u8,
}

const fn info(name: &'static str, address: u16, access: Access, initial: u8) -> RegisterInfo {
    RegisterInfo {
        name,
        address,
        access,
        initial,
    }
}

const IDENTITY_PALETTE: u8 = 0b1110_0100;

/// Dispatch table, ordered like `IoRegister`.
const REGISTERS: [RegisterInfo; IoRegister::COUNT] = [
    info("P1", JOYPAD, Access::Joypad, 0xFF),
    info("SB", SERIAL_TRANSFER_DATA, Access::Unimplemented, 0x00),
    info("SC", SERIAL_TRANSFER_CTRL, Access::Unimplemented, 0x00),
    info("DIV", TIMER_DIVIDER, Access::Counter, 0x00),
    info("TIMA", TIMER_COUNTER, Access::Storage, 0x00),
    info("TMA", TIMER_MODULO, Access::Storage, 0x00),
    info("TAC", TIMER_CTRL, Access::Storage, 0x00),
    info("IF", INTERRUPT_FLAG, Access::Storage, 0x00),
    info("NR10", AUDIO_NR10, Access::Unimplemented, 0x00),
    info("NR11", AUDIO_NR11, Access::Unimplemented, 0x00),
    info("NR12", AUDIO_NR12, Access::Unimplemented, 0x00),
    info("NR13", AUDIO_NR13, Access::Unimplemented, 0x00),
    info("NR14", AUDIO_NR14, Access::Unimplemented, 0x00),
    info("NR21", AUDIO_NR21, Access::Unimplemented, 0x00),
    info("NR22", AUDIO_NR22, Access::Unimplemented, 0x00),
    info("NR23", AUDIO_NR23, Access::Unimplemented, 0x00),
    info("NR24", AUDIO_NR24, Access::Unimplemented, 0x00),
    info("NR30", AUDIO_NR30, Access::Unimplemented, 0x00),
    info("NR31", AUDIO_NR31, Access::Unimplemented, 0x00),
    info("NR32", AUDIO_NR32, Access::Unimplemented, 0x00),
    info("NR33", AUDIO_NR33, Access::Unimplemented, 0x00),
    info("NR34", AUDIO_NR34, Access::Unimplemented, 0x00),
    info("NR41", AUDIO_NR41, Access::Unimplemented, 0x00),
    info("NR42", AUDIO_NR42, Access::Unimplemented, 0x00),
    info("NR43", AUDIO_NR43, Access::Unimplemented, 0x00),
    info("NR44", AUDIO_NR44, Access::Unimplemented, 0x00),
    info("NR50", AUDIO_NR50, Access::Unimplemented, 0x00),
    info("NR51", AUDIO_NR51, Access::Unimplemented, 0x00),
    info("NR52", AUDIO_NR52, Access::Unimplemented, 0x00),
    info("LCDC", PPU_LCDC, Access::Storage, 0x91),
    info("STAT", PPU_STAT, Access::Storage, 0x00),
    info("SCY", PPU_SCY, Access::Storage, 0x00),
    info("SCX", PPU_SCX, Access::Storage, 0x00),
    info("LY", PPU_LY, Access::Counter, 0x00),
    info("LYC", PPU_LYC, Access::Storage, 0x00),
    info("DMA", PPU_DMA, Access::Storage, 0x00),
    info("BGP", PPU_BGP, Access::Storage, IDENTITY_PALETTE),
    info("OBP0", PPU_OBP0, Access::Storage, IDENTITY_PALETTE),
    info("OBP1", PPU_OBP1, Access::Storage, IDENTITY_PALETTE),
    info("WY", PPU_WY, Access::Storage, 0x00),
    info("WX", PPU_WX, Access::Storage, 0x00),
    info("IE", INTERRUPT_ENABLE, Access::Storage, 0x00),
];

impl IoRegister {
    pub const COUNT: usize = 42;

    pub const ALL: [IoRegister; IoRegister::COUNT] = [
        IoRegister::P1,
        IoRegister::SB,
        IoRegister::SC,
        IoRegister::DIV,
        IoRegister::TIMA,
        IoRegister::TMA,
        IoRegister::TAC,
        IoRegister::IF,
        IoRegister::NR10,
        IoRegister::NR11,
        IoRegister::NR12,
        IoRegister::NR13,
        IoRegister::NR14,
        IoRegister::NR21,
        IoRegister::NR22,
        IoRegister::NR23,
        IoRegister::NR24,
        IoRegister::NR30,
        IoRegister::NR31,
        IoRegister::NR32,
        IoRegister::NR33,
        IoRegister::NR34,
        IoRegister::NR41,
        IoRegister::NR42,
        IoRegister::NR43,
        IoRegister::NR44,
        IoRegister::NR50,
        IoRegister::NR51,
        IoRegister::NR52,
        IoRegister::LCDC,
        IoRegister::STAT,
        IoRegister::SCY,
        IoRegister::SCX,
        IoRegister::LY,
        IoRegister::LYC,
        IoRegister::DMA,
        IoRegister::BGP,
        IoRegister::OBP0,
        IoRegister::OBP1,
        IoRegister::WY,
        IoRegister::WX,
        IoRegister::IE,
    ];

    #[inline]
    const fn info(self) -> &'static RegisterInfo {
        &REGISTERS[self as usize]
    }

    #[inline]
    pub const fn name(self) -> &'static str {
        self.info().name
    }

    #[inline]
    pub const fn address(self) -> u16 {
        self.info().address
    }

    #[inline]
    pub const fn access(self) -> Access {
        self.info().access
    }

    /// Resolves a memory mapped address to its register.
    pub fn from_address(address: u16) -> Option<IoRegister> {
        IoRegister::ALL
            .iter()
            .copied()
            .find(|reg| reg.address() == address)
    }
}

impl FromStr for IoRegister {
    type Err = GBError;

    /// Resolves a register by its name, ignoring case.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        IoRegister::ALL
            .iter()
            .copied()
            .find(|reg| reg.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| GBError::UnknownRegister(name.to_string()))
    }
}

impl fmt::Display for IoRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Holds the values of all peripheral registers.
#[derive(Clone)]
pub struct IoRegisters {
    values: [u8; IoRegister::COUNT],
    joypad: Joypad,
}

impl Default for IoRegisters {
    fn default() -> Self {
        let mut values = [0u8; IoRegister::COUNT];
        for reg in IoRegister::ALL {
            values[reg as usize] = reg.info().initial;
        }
        Self {
            values,
            joypad: Joypad::default(),
        }
    }
}

impl IoRegisters {
    /// Reads a register like the processor does.
    pub fn read(&self, reg: IoRegister) -> u8 {
        let value = match reg.access() {
            Access::Unimplemented => 0,
            Access::Joypad => self.joypad.read(),
            Access::Storage | Access::Counter => self.values[reg as usize],
        };
        trace!(target: "io", "read {reg}: {value:#04x}");
        value
    }

    /// Writes a register like the processor does.
    /// Writing DIV resets it, LY is read-only.
    pub fn write(&mut self, reg: IoRegister, value: u8) {
        trace!(target: "io", "write {reg}: {value:#04x}");
        match (reg.access(), reg) {
            (Access::Unimplemented, _) => {}
            (Access::Joypad, _) => self.joypad.write(value),
            (Access::Counter, IoRegister::DIV) => self.values[reg as usize] = 0,
            (Access::Counter, _) => {}
            (Access::Storage, _) => self.values[reg as usize] = value,
        }
    }

    /// Sets the raw value of a register without processor side effects.
    #[inline]
    pub fn set(&mut self, reg: IoRegister, value: u8) {
        self.values[reg as usize] = value;
    }

    /// Increments a counter register, wrapping at 256. Returns the new value.
    pub fn increment(&mut self, reg: IoRegister) -> GBResult<u8> {
        if reg.access() != Access::Counter {
            return Err(GBError::NotACounter(reg));
        }
        let value = self.values[reg as usize].wrapping_add(1);
        self.values[reg as usize] = value;
        Ok(value)
    }

    /// Reads a memory mapped register address.
    /// Addresses without a register read as `UNDEFINED_READ`.
    pub fn read_address(&self, address: u16) -> u8 {
        if let WAVE_PATTERN_BEGIN..=WAVE_PATTERN_END = address {
            return 0;
        }
        match IoRegister::from_address(address) {
            Some(reg) => self.read(reg),
            None => {
                warn!(target: "io", "read from unmapped register {address:#06x}");
                UNDEFINED_READ
            }
        }
    }

    /// Writes a memory mapped register address.
    /// Addresses without a register are an error.
    pub fn write_address(&mut self, address: u16, value: u8) -> GBResult<()> {
        if let WAVE_PATTERN_BEGIN..=WAVE_PATTERN_END = address {
            return Ok(());
        }
        match IoRegister::from_address(address) {
            Some(reg) => {
                self.write(reg, value);
                Ok(())
            }
            None => Err(GBError::UnmappedRegister(address)),
        }
    }

    #[inline]
    pub fn interrupt_flag(&self) -> InterruptRegister {
        InterruptRegister::from_bits_retain(self.values[IoRegister::IF as usize])
    }

    #[inline]
    pub fn set_interrupt_flag(&mut self, r: InterruptRegister) {
        self.values[IoRegister::IF as usize] = r.bits();
    }

    #[inline]
    pub fn interrupt_enable(&self) -> InterruptRegister {
        InterruptRegister::from_bits_retain(self.values[IoRegister::IE as usize])
    }

    #[cfg(test)]
    #[inline]
    pub fn set_interrupt_enable(&mut self, r: InterruptRegister) {
        self.values[IoRegister::IE as usize] = r.bits();
    }

    /// Sets the given interrupt request bit in IF.
    #[inline]
    pub fn request_interrupt(&mut self, irq: InterruptRegister) {
        self.set_interrupt_flag(self.interrupt_flag() | irq);
    }

    /// Updates the button state, a new press requests the joypad interrupt.
    pub fn handle_input(&mut self, input: JoypadInput) {
        if self.joypad.handle_input(input) {
            trace!(target: "joypad", "button pressed: {input:?}");
            self.request_interrupt(InterruptRegister::JOYPAD);
        }
    }
}

use crate::gb::cartridge::controller::BankController;
use crate::gb::cartridge::{CartridgeConfig, ControllerType};
use crate::gb::constants::*;
use std::sync::Arc;

/// Games of not more than 32 KiB ROM don't need a bank controller,
/// the ROM is mapped directly to 0x0000 - 0x7FFF.
/// Optionally up to 8 KiB of RAM is wired to 0xA000 - 0xBFFF.
#[derive(Clone)]
pub struct NoMBC {
    config: CartridgeConfig,
    rom: Arc<[u8]>,
    ram: Vec<u8>,
}

impl NoMBC {
    #[inline]
    pub fn new(config: CartridgeConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            rom,
            config,
        }
    }
}

impl BankController for NoMBC {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_HIGH_BANK_END => {
                self.rom.get(address as usize).copied().unwrap_or(UNDEFINED_READ)
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END => self
                .ram
                .get((address - CRAM_BANK_BEGIN) as usize)
                .copied()
                .unwrap_or(UNDEFINED_READ),
            _ => UNDEFINED_READ,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        if let CRAM_BANK_BEGIN..=CRAM_BANK_END = address {
            if let Some(cell) = self.ram.get_mut((address - CRAM_BANK_BEGIN) as usize) {
                *cell = value;
            }
        }
    }

    #[inline]
    fn controller_type(&self) -> ControllerType {
        self.config.controller
    }

    #[inline]
    fn has_ram(&self) -> bool {
        !self.ram.is_empty()
    }
}

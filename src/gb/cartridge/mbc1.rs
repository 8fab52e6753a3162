use crate::gb::cartridge::controller::BankController;
use crate::gb::cartridge::{CartridgeConfig, ControllerType, RAM_BANK_SIZE, ROM_BANK_SIZE};
use crate::gb::constants::*;
use log::trace;
use std::sync::Arc;

/// Writing a value with 0x0A in the lower 4 bits enables the external RAM,
/// any other value disables it.
const RAM_ENABLE_BEGIN: u16 = 0x0000;
const RAM_ENABLE_END: u16 = 0x1FFF;

/// Lower 5 bits of the ROM bank mapped to 0x4000 - 0x7FFF. Bank 0 behaves like bank 1.
const ROM_BANK_NUMBER_BEGIN: u16 = 0x2000;
const ROM_BANK_NUMBER_END: u16 = 0x3FFF;

/// 2-bit register, either the RAM bank or bits 5-6 of the ROM bank number.
const UPPER_BANK_NUMBER_BEGIN: u16 = 0x4000;
const UPPER_BANK_NUMBER_END: u16 = 0x5FFF;

/// Selects how the upper bank register is applied.
const BANKING_MODE_SELECT_BEGIN: u16 = 0x6000;
const BANKING_MODE_SELECT_END: u16 = 0x7FFF;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum BankingMode {
    /// 0x0000 - 0x3FFF and the external RAM are locked to bank 0.
    Simple,
    /// The upper bank register also applies to 0x0000 - 0x3FFF and the external RAM.
    Advanced,
}

/// MBC1 supports up to 2 MiB ROM and up to 32 KiB of banked RAM.
#[derive(Clone)]
pub struct MBC1 {
    config: CartridgeConfig,
    rom: Arc<[u8]>,
    ram: Vec<u8>,
    ram_enabled: bool,
    rom_bank: u8,
    upper_bank: u8,
    mode: BankingMode,
}

impl MBC1 {
    pub fn new(config: CartridgeConfig, rom: Arc<[u8]>) -> Self {
        Self {
            ram: vec![0; config.ram_size],
            ram_enabled: false,
            rom_bank: 1,
            upper_bank: 0,
            mode: BankingMode::Simple,
            rom,
            config,
        }
    }

    /// Offset of the bank currently mapped to 0x0000 - 0x3FFF.
    fn low_rom_offset(&self) -> usize {
        let bank = match self.mode {
            BankingMode::Simple => 0,
            BankingMode::Advanced => (self.upper_bank as usize) << 5,
        };
        (bank % self.config.rom_banks) * ROM_BANK_SIZE
    }

    /// Offset of the bank currently mapped to 0x4000 - 0x7FFF.
    fn high_rom_offset(&self) -> usize {
        let bank = ((self.upper_bank as usize) << 5) | self.rom_bank as usize;
        (bank % self.config.rom_banks) * ROM_BANK_SIZE
    }

    fn ram_offset(&self) -> usize {
        match self.mode {
            BankingMode::Advanced if self.config.ram_banks > 1 => {
                (self.upper_bank as usize % self.config.ram_banks) * RAM_BANK_SIZE
            }
            _ => 0,
        }
    }

    #[inline]
    fn rom_at(&self, offset: usize) -> u8 {
        self.rom.get(offset).copied().unwrap_or(UNDEFINED_READ)
    }
}

impl BankController for MBC1 {
    fn read(&mut self, address: u16) -> u8 {
        match address {
            ROM_LOW_BANK_BEGIN..=ROM_LOW_BANK_END => {
                self.rom_at(self.low_rom_offset() + address as usize)
            }
            ROM_HIGH_BANK_BEGIN..=ROM_HIGH_BANK_END => {
                self.rom_at(self.high_rom_offset() + (address - ROM_HIGH_BANK_BEGIN) as usize)
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END if self.ram_enabled => {
                let offset = self.ram_offset() + (address - CRAM_BANK_BEGIN) as usize;
                self.ram.get(offset).copied().unwrap_or(UNDEFINED_READ)
            }
            _ => UNDEFINED_READ,
        }
    }

    fn write(&mut self, address: u16, value: u8) {
        match address {
            RAM_ENABLE_BEGIN..=RAM_ENABLE_END => {
                self.ram_enabled = value & 0x0F == 0x0A;
            }
            ROM_BANK_NUMBER_BEGIN..=ROM_BANK_NUMBER_END => {
                self.rom_bank = match value & 0b0001_1111 {
                    0 => 1,
                    n => n,
                };
                trace!(target: "cartridge", "MBC1 ROM bank {:#04x}", self.rom_bank);
            }
            UPPER_BANK_NUMBER_BEGIN..=UPPER_BANK_NUMBER_END => {
                self.upper_bank = value & 0b11;
            }
            BANKING_MODE_SELECT_BEGIN..=BANKING_MODE_SELECT_END => {
                self.mode = match value & 0b1 {
                    0 => BankingMode::Simple,
                    _ => BankingMode::Advanced,
                };
            }
            CRAM_BANK_BEGIN..=CRAM_BANK_END if self.ram_enabled => {
                let offset = self.ram_offset() + (address - CRAM_BANK_BEGIN) as usize;
                if let Some(cell) = self.ram.get_mut(offset) {
                    *cell = value;
                }
            }
            _ => {}
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

#[cfg(test)]
mod tests {
    use super::*;

    fn banked_rom(banks: usize) -> Arc<[u8]> {
        let mut rom = vec![0u8; banks * ROM_BANK_SIZE];
        for (bank, chunk) in rom.chunks_mut(ROM_BANK_SIZE).enumerate() {
            chunk.fill(bank as u8);
        }
        Arc::from(rom.into_boxed_slice())
    }

    #[test]
    fn test_rom_bank_switching() {
        let config = CartridgeConfig::new(ControllerType::MBC1, 0x02, 0x00).unwrap();
        let mut mbc = MBC1::new(config, banked_rom(8));
        assert_eq!(mbc.read(0x0000), 0);
        assert_eq!(mbc.read(0x4000), 1, "Bank 1 is selected at power on");

        mbc.write(0x2000, 0x05);
        assert_eq!(mbc.read(0x4000), 5);
        assert_eq!(mbc.read(0x7FFF), 5);

        mbc.write(0x2000, 0x00);
        assert_eq!(mbc.read(0x4000), 1, "Bank 0 should be translated to bank 1");

        mbc.write(0x2000, 0x0A);
        assert_eq!(mbc.read(0x4000), 2, "Bank number wraps at the ROM size");
    }

    #[test]
    fn test_ram_enable_and_banking() {
        let config = CartridgeConfig::new(ControllerType::MBC1WithRAM, 0x02, 0x03).unwrap();
        let mut mbc = MBC1::new(config, banked_rom(8));

        mbc.write(0xA000, 0x42);
        assert_eq!(mbc.read(0xA000), UNDEFINED_READ, "RAM is disabled at power on");

        mbc.write(0x0000, 0x0A);
        mbc.write(0xA000, 0x42);
        assert_eq!(mbc.read(0xA000), 0x42);

        mbc.write(0x6000, 0x01);
        mbc.write(0x4000, 0x02);
        assert_eq!(mbc.read(0xA000), 0x00, "RAM bank 2 is still empty");
        mbc.write(0xA000, 0x24);

        mbc.write(0x4000, 0x00);
        assert_eq!(mbc.read(0xA000), 0x42);
        mbc.write(0x4000, 0x02);
        assert_eq!(mbc.read(0xA000), 0x24);

        mbc.write(0x0000, 0x00);
        assert_eq!(mbc.read(0xA000), UNDEFINED_READ);
    }
}

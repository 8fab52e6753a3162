use crate::gb::cartridge::controller::BankController;
use crate::gb::{AddressSpace, GBError, GBResult};
use log::warn;
use std::path::Path;
use std::sync::Arc;
use std::{fmt, fs};

mod controller;
mod mbc1;
mod nombc;

/// This area of memory contains the cartridge title
const CARTRIDGE_TITLE_BEGIN: u16 = 0x0134;
const CARTRIDGE_TITLE_END: u16 = 0x0142;

/// Bit 7 set means the game supports (0x80) or requires (0xC0) the colour model.
const CARTRIDGE_CGB_FLAG: u16 = 0x0143;

/// 0x03 means the game supports Super Game Boy functions.
const CARTRIDGE_SGB_FLAG: u16 = 0x0146;

/// This address contains the cartridge type and what kind of hardware is present.
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html#0147--cartridge-type
const CARTRIDGE_TYPE: u16 = 0x0147;

/// The ROM size is given by 32KiB * (1 << value).
const CARTRIDGE_ROM_SIZE: u16 = 0x0148;

/// This byte indicates how much RAM is present on the cartridge.
const CARTRIDGE_RAM_SIZE: u16 = 0x0149;

/// These bytes contain a 16-bit (big-endian) checksum simply computed as the sum of all
/// the bytes of the cartridge ROM (except these two checksum bytes).
const CARTRIDGE_GLOBAL_CHECKSUM1: u16 = 0x014E;
const CARTRIDGE_GLOBAL_CHECKSUM2: u16 = 0x014F;

/// Every valid image contains at least the complete header.
const CARTRIDGE_HEADER_END: usize = 0x0150;

const ROM_BANK_SIZE: usize = 16384;
const RAM_BANK_SIZE: usize = 8192;

/// The controller type of the cartridge.
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html#0147--cartridge-type
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum ControllerType {
    NoMBC,
    NoMBCWithRAM,
    MBC1,
    MBC1WithRAM,
}

impl ControllerType {
    /// Returns true if the cartridge remaps ROM banks on writes.
    #[inline]
    pub const fn is_bank_switching(&self) -> bool {
        matches!(self, ControllerType::MBC1 | ControllerType::MBC1WithRAM)
    }
}

impl TryFrom<u8> for ControllerType {
    type Error = GBError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ControllerType::NoMBC),
            0x01 => Ok(ControllerType::MBC1),
            0x02 | 0x03 => Ok(ControllerType::MBC1WithRAM),
            0x08 | 0x09 => Ok(ControllerType::NoMBCWithRAM),
            value => Err(GBError::UnsupportedCartridge(value)),
        }
    }
}

impl fmt::Display for ControllerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControllerType::NoMBC => "ROM Only",
            ControllerType::NoMBCWithRAM => "ROM + RAM",
            ControllerType::MBC1 => "MBC1",
            ControllerType::MBC1WithRAM => "MBC1 + RAM",
        };
        f.write_str(name)
    }
}

/// Size and banking layout of a cartridge.
#[derive(Copy, Clone, Debug)]
pub struct CartridgeConfig {
    pub controller: ControllerType,
    pub rom_size: usize,
    pub rom_banks: usize,
    pub ram_size: usize,
    pub ram_banks: usize,
}

impl CartridgeConfig {
    pub fn new(controller: ControllerType, rom_size: u8, ram_size: u8) -> GBResult<Self> {
        let ram_banks = match ram_size {
            0x00 | 0x01 => 0,
            0x02 => 1,
            0x03 => 4,
            0x04 => 16,
            0x05 => 8,
            value => return Err(GBError::UnsupportedRamSize(value)),
        };
        if rom_size > 0x08 {
            return Err(GBError::UnsupportedRomSize(rom_size));
        }
        let rom_banks = 2 << rom_size;

        Ok(Self {
            controller,
            rom_size: rom_banks * ROM_BANK_SIZE,
            rom_banks,
            ram_size: ram_banks * RAM_BANK_SIZE,
            ram_banks,
        })
    }
}

/// Contains the cartridge header information.
/// See https://gbdev.io/pandocs/The_Cartridge_Header.html
#[derive(Clone, Debug)]
pub struct CartridgeHeader {
    pub title: String,
    pub config: CartridgeConfig,
    pub cgb_flag: u8,
    pub sgb_flag: u8,
}

impl TryFrom<&[u8]> for CartridgeHeader {
    type Error = GBError;

    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        if buf.len() < CARTRIDGE_HEADER_END {
            return Err(GBError::RomTooSmall(buf.len()));
        }
        let controller = ControllerType::try_from(buf[CARTRIDGE_TYPE as usize])?;
        let config = CartridgeConfig::new(
            controller,
            buf[CARTRIDGE_ROM_SIZE as usize],
            buf[CARTRIDGE_RAM_SIZE as usize],
        )?;
        Ok(Self {
            title: CartridgeHeader::parse_title(buf),
            config,
            cgb_flag: buf[CARTRIDGE_CGB_FLAG as usize],
            sgb_flag: buf[CARTRIDGE_SGB_FLAG as usize],
        })
    }
}

impl CartridgeHeader {
    /// Returns the cartridge title from the cartridge header.
    fn parse_title(buf: &[u8]) -> String {
        let title = buf[CARTRIDGE_TITLE_BEGIN as usize..=CARTRIDGE_TITLE_END as usize]
            .iter()
            .take_while(|&&b| b != 0)
            .filter(|b| b.is_ascii_alphanumeric() || **b == b' ')
            .map(|&b| char::from(b))
            .collect::<String>();
        match title.trim().is_empty() {
            true => "Unnamed".to_string(),
            false => title.trim().to_string(),
        }
    }

    #[inline]
    pub const fn is_color_capable(&self) -> bool {
        self.cgb_flag & 0x80 != 0
    }

    #[inline]
    pub const fn is_super_capable(&self) -> bool {
        self.sgb_flag == 0x03
    }
}

impl fmt::Display for CartridgeHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, CGB: {}, SGB: {})",
            self.title,
            self.config.controller,
            self.is_color_capable(),
            self.is_super_capable()
        )
    }
}

/// A loaded cartridge: the parsed header plus the bank controller owning ROM and RAM.
#[derive(Clone)]
pub struct Cartridge {
    pub header: CartridgeHeader,
    controller: Box<dyn BankController>,
}

impl Cartridge {
    #[inline]
    pub fn controller_type(&self) -> ControllerType {
        self.controller.controller_type()
    }

    #[inline]
    pub fn is_bank_switching(&self) -> bool {
        self.controller_type().is_bank_switching()
    }

    /// Returns true if external RAM is wired to 0xA000-0xBFFF.
    #[inline]
    pub fn has_ram(&self) -> bool {
        self.controller.has_ram()
    }

    #[inline]
    pub const fn is_color_capable(&self) -> bool {
        self.header.is_color_capable()
    }

    #[inline]
    pub const fn is_super_capable(&self) -> bool {
        self.header.is_super_capable()
    }
}

impl TryFrom<Arc<[u8]>> for Cartridge {
    type Error = GBError;

    fn try_from(rom: Arc<[u8]>) -> Result<Self, Self::Error> {
        let header = CartridgeHeader::try_from(rom.as_ref())?;
        if let Err(msg) = verify_checksum(rom.as_ref()) {
            warn!(target: "cartridge", "{msg}");
        }
        if rom.len() < header.config.rom_size {
            warn!(
                target: "cartridge",
                "ROM image has {} bytes, header declares {}",
                rom.len(),
                header.config.rom_size
            );
        }
        let controller = controller::new(header.config, rom);
        Ok(Self { header, controller })
    }
}

impl TryFrom<&Path> for Cartridge {
    type Error = GBError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        let rom = fs::read(path)?;
        Cartridge::try_from(Arc::from(rom.into_boxed_slice()))
    }
}

impl fmt::Display for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)
    }
}

impl AddressSpace for Cartridge {
    #[inline]
    fn write(&mut self, address: u16, value: u8) {
        self.controller.write(address, value);
    }

    #[inline]
    fn read(&mut self, address: u16) -> u8 {
        self.controller.read(address)
    }
}

/// Validates the global checksum of the given buffer containing the whole cartridge.
fn verify_checksum(buf: &[u8]) -> Result<(), String> {
    let expected = u16::from_be_bytes([
        buf[CARTRIDGE_GLOBAL_CHECKSUM1 as usize],
        buf[CARTRIDGE_GLOBAL_CHECKSUM2 as usize],
    ]);
    let calculated = calculate_global_checksum(buf);
    match expected == calculated {
        true => Ok(()),
        false => Err(format!(
            "Global checksum mismatch! Expected: {expected:#06x} Got: {calculated:#06x}"
        )),
    }
}

/// Sums all bytes of the cartridge except the two checksum bytes.
fn calculate_global_checksum(buf: &[u8]) -> u16 {
    buf.iter()
        .enumerate()
        .filter(|&(address, _)| {
            address != CARTRIDGE_GLOBAL_CHECKSUM1 as usize
                && address != CARTRIDGE_GLOBAL_CHECKSUM2 as usize
        })
        .fold(0u16, |sum, (_, &byte)| sum.wrapping_add(u16::from(byte)))
}

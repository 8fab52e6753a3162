use crate::gb::constants::*;
use bitflags::bitflags;

bitflags! {
    /// Represents PPU_LCDC at 0xFF40
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct LCDControl: u8 {
        const BG_EN    = 0b00000001; // BG Enable
        const OBJ_EN   = 0b00000010; // OBJ Enable
        const OBJ_SIZE = 0b00000100; // OBJ Size
        const BG_MAP   = 0b00001000; // BG Tile Map Address
        const TILE_SEL = 0b00010000; // BG & Window Tile Data
        const WIN_EN   = 0b00100000; // Window Enable
        const WIN_MAP  = 0b01000000; // Window Tile Map Address
        const LCD_EN   = 0b10000000; // LCD Display Enable
    }

    /// Represents PPU_STAT at 0xFF41
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct LCDState: u8 {
        const PPU_MODE1   = 0b00000001; // PPU Mode
        const PPU_MODE2   = 0b00000010; // PPU Mode
        const LYC_STAT    = 0b00000100; // LY Flag
        const H_BLANK_INT = 0b00001000; // Mode 0 H-Blank Interrupt
        const V_BLANK_INT = 0b00010000; // Mode 1 V-Blank Interrupt
        const OAM_INT     = 0b00100000; // Mode 2 OAM Interrupt
        const LY_INT      = 0b01000000; // LY Interrupt
    }
}

impl LCDControl {
    /// Base address of the tile map used by the background.
    #[inline]
    pub fn bg_tile_map(&self) -> u16 {
        match self.contains(LCDControl::BG_MAP) {
            true => TILE_MAP1_BEGIN,
            false => TILE_MAP0_BEGIN,
        }
    }

    /// Base address of the tile map used by the window.
    #[inline]
    pub fn window_tile_map(&self) -> u16 {
        match self.contains(LCDControl::WIN_MAP) {
            true => TILE_MAP1_BEGIN,
            false => TILE_MAP0_BEGIN,
        }
    }

    /// Resolves a tile number from a tile map to the address of its first byte.
    /// With TILE_SEL set the number is an unsigned index from 0x8000,
    /// otherwise it is signed and offset by 128 from 0x8800.
    #[inline]
    pub fn tile_address(&self, tile_number: u8) -> u16 {
        match self.contains(LCDControl::TILE_SEL) {
            true => TILE_DATA_UNSIGNED + u16::from(tile_number) * TILE_SIZE,
            false => {
                let index = (i16::from(tile_number as i8) + 128) as u16;
                TILE_DATA_SIGNED + index * TILE_SIZE
            }
        }
    }

    /// Height of all sprites in pixels.
    #[inline]
    pub fn sprite_height(&self) -> u8 {
        match self.contains(LCDControl::OBJ_SIZE) {
            true => 16,
            false => 8,
        }
    }
}

impl LCDState {
    /// Returns the `PPUMode` based on the first two bits of PPU_STAT.
    #[cfg(test)]
    #[inline]
    pub fn mode(&self) -> PPUMode {
        PPUMode::from(self.bits())
    }

    /// Sets the first two bits of PPU_STAT to the given `PPUMode`.
    #[inline]
    pub fn set_mode(&mut self, mode: PPUMode) {
        *self = LCDState::from_bits_retain((self.bits() & 0b1111_1100) | mode as u8);
    }
}

/// Represents the first two bits in LCDState.
#[repr(u8)]
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PPUMode {
    HBlank = 0b00,
    VBlank = 0b01,
    AccessOAM = 0b10,
    AccessVRAM = 0b11,
}

impl PPUMode {
    /// Cycles spent in the mode before the next transition.
    /// V-Blank is entered once per line for the ten lines below the screen.
    #[inline]
    pub const fn duration(&self) -> u16 {
        match self {
            PPUMode::AccessOAM => 80,
            PPUMode::AccessVRAM => 172,
            PPUMode::HBlank => 204,
            PPUMode::VBlank => 456,
        }
    }
}

impl From<u8> for PPUMode {
    /// Only the lower two bits are considered.
    #[inline]
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => PPUMode::HBlank,
            0b01 => PPUMode::VBlank,
            0b10 => PPUMode::AccessOAM,
            _ => PPUMode::AccessVRAM,
        }
    }
}

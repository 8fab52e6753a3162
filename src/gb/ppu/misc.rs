use crate::gb::utils::plane_index;
use bitflags::bitflags;

/// Defines a Palette to colorize a Pixel
/// used by bgp, obp0 and obp1 registers.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub struct Palette {
    map: [Shade; 4],
}

impl Palette {
    #[inline]
    pub fn colorize(&self, pixel: Pixel) -> Shade {
        self.map[pixel as usize]
    }
}

impl From<u8> for Palette {
    /// Every two bits in the palette data byte represent a colour.
    /// Bits 7-6 maps to colour id 11, bits 5-4 map to colour id 10,
    /// bits 3-2 map to colour id 01 and bits 1-0 map to colour id 00
    #[inline]
    fn from(value: u8) -> Self {
        Self {
            map: [
                Shade::from(value),
                Shade::from(value >> 2),
                Shade::from(value >> 4),
                Shade::from(value >> 6),
            ],
        }
    }
}

/// Represents a non-colorized Pixel, the 2-bit colour index stored in tile data.
#[repr(u8)]
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Pixel {
    #[default]
    Zero,
    One,
    Two,
    Three,
}

impl From<u8> for Pixel {
    /// Only the lower two bits are considered.
    #[inline]
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Pixel::Zero,
            0b01 => Pixel::One,
            0b10 => Pixel::Two,
            _ => Pixel::Three,
        }
    }
}

/// One of the four shades of the screen, created from a `Pixel` with a `Palette`.
#[repr(u8)]
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub enum Shade {
    #[default]
    White,
    LightGrey,
    DarkGrey,
    Black,
}

impl From<u8> for Shade {
    /// Only the lower two bits are considered.
    #[inline]
    fn from(value: u8) -> Self {
        match value & 0b11 {
            0b00 => Shade::White,
            0b01 => Shade::LightGrey,
            0b10 => Shade::DarkGrey,
            _ => Shade::Black,
        }
    }
}

/// An 8x8 tile decoded from 16 bytes of tile data.
/// Each row is stored in two bytes, the first holds the low bit of every pixel
/// and the second the high bit. Bit 7 is the leftmost pixel.
#[derive(Default, Copy, Clone, PartialEq, Eq, Debug)]
pub struct Tile {
    pixels: [[Pixel; 8]; 8],
}

impl Tile {
    pub fn new(data: &[u8]) -> Self {
        let mut pixels = [[Pixel::Zero; 8]; 8];
        for (row, planes) in pixels.iter_mut().zip(data.chunks_exact(2)) {
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = Pixel::from(plane_index(planes[0], planes[1], 7 - x as u8));
            }
        }
        Self { pixels }
    }

    #[inline]
    pub fn get_pixel(&self, x: u8, y: u8) -> Pixel {
        self.pixels[usize::from(y & 7)][usize::from(x & 7)]
    }
}

bitflags! {
    /// Attribute byte of a sprite entry.
    #[derive(Copy, Clone, PartialEq, Eq, Debug)]
    pub struct SpriteAttributes: u8 {
        const DMG_PALETTE = 0b00010000; // Selects OBP1 instead of OBP0
        const X_FLIP      = 0b00100000; // Horizontally mirrored
        const Y_FLIP      = 0b01000000; // Vertically mirrored
        const PRIORITY    = 0b10000000; // Only drawn over background colour 0
    }
}

/// A sprite entry of the sprite attribute table.
/// Positions are stored as on hardware, offset by (8, 16) from the screen origin.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Sprite {
    pub y: u8,
    pub x: u8,
    pub tile_index: u8,
    pub attributes: SpriteAttributes,
}

impl Sprite {
    /// Decodes a 4-byte entry: Y, X, tile index and attributes.
    #[inline]
    pub fn new(entry: &[u8]) -> Self {
        Self {
            y: entry[0],
            x: entry[1],
            tile_index: entry[2],
            attributes: SpriteAttributes::from_bits_truncate(entry[3]),
        }
    }

    /// Screen coordinates of the upper left corner, may be negative.
    #[inline]
    pub fn origin(&self) -> (i16, i16) {
        (i16::from(self.x) - 8, i16::from(self.y) - 16)
    }
}

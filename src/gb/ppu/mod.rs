pub mod buffer;
pub mod display;
pub mod misc;
mod registers;
#[cfg(test)]
mod tests;

use crate::gb::bus::{InterruptRegister, MemoryBus};
use crate::gb::constants::*;
use crate::gb::io::IoRegister;
use crate::gb::ppu::buffer::FrameBuffer;
use crate::gb::ppu::misc::{Palette, Pixel, Shade, Sprite, SpriteAttributes, Tile};
use crate::gb::ppu::registers::{LCDControl, LCDState, PPUMode};
use crate::gb::utils::plane_index;
use crate::gb::{SCAN_LINES, SCREEN_HEIGHT, SCREEN_WIDTH};
use display::Display;
use log::{debug, error, trace};

/// Pixel Processing Unit
/// Advances through OAM search, pixel transfer and H-Blank for each visible line
/// followed by ten lines of V-Blank. Background and window are drawn per line,
/// sprites once per frame on top of the finished lines.
pub struct PPU {
    mode: PPUMode,
    clock: u16,
    buffer: FrameBuffer,
    bg_pixels: Vec<Pixel>,
    display: Option<Display>,
    frames: u64,
}

impl PPU {
    /// Creates a PPU in OAM search on line 0. Without a display frames are only counted.
    pub fn new(display: Option<Display>) -> Self {
        Self {
            mode: PPUMode::AccessOAM,
            clock: 0,
            buffer: FrameBuffer::default(),
            bg_pixels: vec![Pixel::Zero; SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize],
            display,
            frames: 0,
        }
    }

    #[cfg(test)]
    #[inline]
    pub fn mode(&self) -> PPUMode {
        self.mode
    }

    /// Number of completed frames.
    #[inline]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Steps the PPU for a given number of cycles.
    pub fn step(&mut self, bus: &mut MemoryBus, cycles: u16) {
        self.clock += cycles;
        self.update_stat(bus);
        while self.clock >= self.mode.duration() {
            self.clock -= self.mode.duration();
            self.advance(bus);
            self.update_stat(bus);
        }
    }

    /// Performs the transition at the end of the current mode.
    fn advance(&mut self, bus: &mut MemoryBus) {
        match self.mode {
            PPUMode::AccessOAM => self.switch_mode(PPUMode::AccessVRAM, bus),
            PPUMode::AccessVRAM => {
                let stat = LCDState::from_bits_retain(bus.io.read(IoRegister::STAT));
                if stat.contains(LCDState::LY_INT) && stat.contains(LCDState::LYC_STAT) {
                    bus.io.request_interrupt(InterruptRegister::STAT);
                }
                self.draw_line(bus);
                self.switch_mode(PPUMode::HBlank, bus);
            }
            PPUMode::HBlank => match next_line(bus) {
                SCREEN_HEIGHT => self.switch_mode(PPUMode::VBlank, bus),
                _ => self.switch_mode(PPUMode::AccessOAM, bus),
            },
            PPUMode::VBlank => {
                if next_line(bus) == SCAN_LINES {
                    self.finish_frame(bus);
                    bus.io.set(IoRegister::LY, 0);
                    self.switch_mode(PPUMode::AccessOAM, bus);
                }
            }
        }
    }

    /// Switches the mode and requests the interrupts enabled for it.
    fn switch_mode(&mut self, mode: PPUMode, bus: &mut MemoryBus) {
        trace!(target: "video", "Switching to {mode:?}");
        self.mode = mode;
        let stat = LCDState::from_bits_retain(bus.io.read(IoRegister::STAT));
        let stat_irq = match mode {
            PPUMode::HBlank => stat.contains(LCDState::H_BLANK_INT),
            PPUMode::AccessOAM => stat.contains(LCDState::OAM_INT),
            PPUMode::VBlank => {
                bus.io.request_interrupt(InterruptRegister::VBLANK);
                stat.contains(LCDState::V_BLANK_INT)
            }
            PPUMode::AccessVRAM => false,
        };
        if stat_irq {
            bus.io.request_interrupt(InterruptRegister::STAT);
        }
    }

    /// Writes the current mode and the coincidence flag to STAT.
    fn update_stat(&self, bus: &mut MemoryBus) {
        let mut stat = LCDState::from_bits_retain(bus.io.read(IoRegister::STAT));
        let coincidence = bus.io.read(IoRegister::LY) == bus.io.read(IoRegister::LYC);
        stat.set(LCDState::LYC_STAT, coincidence);
        stat.set_mode(self.mode);
        bus.io.set(IoRegister::STAT, stat.bits());
    }

    /// Completes the frame with the sprite layer, hands it to the display
    /// and starts over with a blank frame.
    fn finish_frame(&mut self, bus: &MemoryBus) {
        let lcdc = LCDControl::from_bits_retain(bus.io.read(IoRegister::LCDC));
        if lcdc.contains(LCDControl::LCD_EN) {
            if lcdc.contains(LCDControl::OBJ_EN) {
                self.draw_sprites(bus, lcdc);
            }
            if let Some(display) = self.display.as_mut() {
                display.send_frame(&self.buffer);
            }
        }
        self.frames += 1;
        debug!(target: "video", "Frame {} completed", self.frames);
        self.buffer.reset(Shade::White);
        self.bg_pixels.fill(Pixel::Zero);
    }

    /// Draws background and window of the current line.
    fn draw_line(&mut self, bus: &MemoryBus) {
        let lcdc = LCDControl::from_bits_retain(bus.io.read(IoRegister::LCDC));
        if !lcdc.contains(LCDControl::LCD_EN) {
            return;
        }
        let ly = bus.io.read(IoRegister::LY);
        if ly >= SCREEN_HEIGHT {
            return;
        }
        let palette = Palette::from(bus.io.read(IoRegister::BGP));

        if lcdc.contains(LCDControl::BG_EN) {
            let scx = bus.io.read(IoRegister::SCX);
            let y = ly.wrapping_add(bus.io.read(IoRegister::SCY));
            for x in 0..SCREEN_WIDTH {
                let bg_x = x.wrapping_add(scx);
                let pixel = map_pixel(bus.vram(), lcdc, lcdc.bg_tile_map(), bg_x, y);
                self.put_pixel(x, ly, pixel, palette);
            }
        }

        let wy = bus.io.read(IoRegister::WY);
        if lcdc.contains(LCDControl::WIN_EN) && ly >= wy {
            let origin = i16::from(bus.io.read(IoRegister::WX)) - 7;
            for x in 0..SCREEN_WIDTH {
                let window_x = i16::from(x) - origin;
                if window_x < 0 {
                    continue;
                }
                let pixel = map_pixel(
                    bus.vram(),
                    lcdc,
                    lcdc.window_tile_map(),
                    window_x as u8,
                    ly - wy,
                );
                self.put_pixel(x, ly, pixel, palette);
            }
        }
    }

    #[inline]
    fn put_pixel(&mut self, x: u8, y: u8, pixel: Pixel, palette: Palette) {
        self.bg_pixels[usize::from(y) * SCREEN_WIDTH as usize + usize::from(x)] = pixel;
        self.buffer.write_pixel(x, y, palette.colorize(pixel));
    }

    /// Background or window colour index drawn at the given position.
    #[inline]
    fn bg_pixel(&self, x: u8, y: u8) -> Pixel {
        self.bg_pixels[usize::from(y) * SCREEN_WIDTH as usize + usize::from(x)]
    }

    /// Draws all sprites in table order on top of the frame.
    /// Colour 0 is transparent, sprites with the priority flag are only drawn
    /// over background colour 0.
    fn draw_sprites(&mut self, bus: &MemoryBus, lcdc: LCDControl) {
        let height = lcdc.sprite_height();
        let palettes = [
            Palette::from(bus.io.read(IoRegister::OBP0)),
            Palette::from(bus.io.read(IoRegister::OBP1)),
        ];
        let vram = bus.vram();

        for (index, entry) in bus.oam().chunks_exact(OAM_ENTRY_SIZE as usize).enumerate() {
            let sprite = Sprite::new(entry);
            let (origin_x, origin_y) = sprite.origin();
            if origin_x <= -8
                || origin_x >= i16::from(SCREEN_WIDTH)
                || origin_y <= -i16::from(height)
                || origin_y >= i16::from(SCREEN_HEIGHT)
            {
                continue;
            }
            trace!(target: "video", "Drawing sprite {index} at ({origin_x}, {origin_y})");

            // Bit 0 of the tile index is ignored for 8x16 sprites
            let tile_index = match height {
                16 => sprite.tile_index & 0xFE,
                _ => sprite.tile_index,
            };
            let offset = usize::from(TILE_DATA_UNSIGNED - VRAM_BEGIN)
                + usize::from(tile_index) * TILE_SIZE as usize;
            let tiles = [
                Tile::new(&vram[offset..offset + TILE_SIZE as usize]),
                Tile::new(&vram[offset + TILE_SIZE as usize..offset + 2 * TILE_SIZE as usize]),
            ];
            let palette = match sprite.attributes.contains(SpriteAttributes::DMG_PALETTE) {
                true => palettes[1],
                false => palettes[0],
            };

            for row in 0..height {
                let tile_row = match sprite.attributes.contains(SpriteAttributes::Y_FLIP) {
                    true => height - 1 - row,
                    false => row,
                };
                let y = origin_y + i16::from(row);
                for col in 0..8u8 {
                    let tile_col = match sprite.attributes.contains(SpriteAttributes::X_FLIP) {
                        true => 7 - col,
                        false => col,
                    };
                    let x = origin_x + i16::from(col);
                    let pixel = tiles[usize::from(tile_row / 8)].get_pixel(tile_col, tile_row % 8);
                    if pixel == Pixel::Zero || !on_screen(x, y) {
                        continue;
                    }
                    let (x, y) = (x as u8, y as u8);
                    if sprite.attributes.contains(SpriteAttributes::PRIORITY)
                        && self.bg_pixel(x, y) != Pixel::Zero
                    {
                        continue;
                    }
                    self.buffer.write_pixel(x, y, palette.colorize(pixel));
                }
            }
        }
    }
}

/// Increments LY and returns the new line.
fn next_line(bus: &mut MemoryBus) -> u8 {
    match bus.io.increment(IoRegister::LY) {
        Ok(line) => line,
        Err(err) => {
            error!(target: "video", "{err}");
            bus.io.read(IoRegister::LY)
        }
    }
}

#[inline]
fn on_screen(x: i16, y: i16) -> bool {
    (0..i16::from(SCREEN_WIDTH)).contains(&x) && (0..i16::from(SCREEN_HEIGHT)).contains(&y)
}

/// Looks up the colour index at (x, y) of the 256x256 pixel area of a tile map.
fn map_pixel(vram: &[u8; VRAM_SIZE], lcdc: LCDControl, map: u16, x: u8, y: u8) -> Pixel {
    let entry = map + u16::from(y / 8) * 32 + u16::from(x / 8);
    let tile_number = vram[usize::from(entry - VRAM_BEGIN)];
    let row = usize::from(lcdc.tile_address(tile_number) - VRAM_BEGIN) + usize::from(y % 8) * 2;
    Pixel::from(plane_index(vram[row], vram[row + 1], 7 - x % 8))
}

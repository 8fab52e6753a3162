use crate::gb::ppu::misc::Shade;
use crate::gb::{SCREEN_HEIGHT, SCREEN_WIDTH};

const BUFFER_SIZE: usize = SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize;

/// Frame buffer holding the shade of every pixel on the screen.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct FrameBuffer {
    buffer: Vec<Shade>,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self {
            buffer: vec![Shade::White; BUFFER_SIZE],
        }
    }
}

impl FrameBuffer {
    /// Returns the width of the frame in pixels.
    #[inline(always)]
    pub const fn width(&self) -> usize {
        SCREEN_WIDTH as usize
    }

    /// Returns the height of the frame in pixels.
    #[inline(always)]
    pub const fn height(&self) -> usize {
        SCREEN_HEIGHT as usize
    }

    /// Writes a pixel, coordinates outside of the screen are ignored.
    #[inline]
    pub fn write_pixel(&mut self, x: u8, y: u8, shade: Shade) {
        if x < SCREEN_WIDTH && y < SCREEN_HEIGHT {
            let index = usize::from(y) * self.width() + usize::from(x);
            self.buffer[index] = shade;
        }
    }

    #[cfg(test)]
    #[inline]
    pub fn get_pixel(&self, x: u8, y: u8) -> Shade {
        self.buffer[usize::from(y) * self.width() + usize::from(x)]
    }

    /// Fills the whole frame with the given shade.
    #[inline]
    pub fn reset(&mut self, shade: Shade) {
        self.buffer.fill(shade);
    }

    /// Rows of the frame from top to bottom.
    #[inline]
    pub fn rows(&self) -> impl Iterator<Item = &[Shade]> {
        self.buffer.chunks_exact(self.width())
    }
}

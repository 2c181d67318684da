//! Monochrome frame buffer and the display it is presented on.

use anyhow::Result;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use pelikello_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use std::convert::Infallible;

const BUFFER_LEN: usize = (DISPLAY_WIDTH * DISPLAY_HEIGHT / 8) as usize;

/// 1 bit per pixel, row-major, most significant bit leftmost.
#[derive(Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    bytes: [u8; BUFFER_LEN],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FrameBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lit = self.bytes.iter().map(|b| b.count_ones()).sum::<u32>();
        write!(f, "FrameBuffer({}x{}, {} px lit)", DISPLAY_WIDTH, DISPLAY_HEIGHT, lit)
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            bytes: [0; BUFFER_LEN],
        }
    }

    pub fn width(&self) -> u32 {
        DISPLAY_WIDTH
    }

    pub fn height(&self) -> u32 {
        DISPLAY_HEIGHT
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn clear_all(&mut self) {
        self.bytes.fill(0);
    }

    pub fn pixel(&self, x: u32, y: u32) -> bool {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return false;
        }
        let (idx, mask) = Self::locate(x, y);
        self.bytes[idx] & mask != 0
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, on: bool) {
        if x >= DISPLAY_WIDTH || y >= DISPLAY_HEIGHT {
            return;
        }
        let (idx, mask) = Self::locate(x, y);
        if on {
            self.bytes[idx] |= mask;
        } else {
            self.bytes[idx] &= !mask;
        }
    }

    fn locate(x: u32, y: u32) -> (usize, u8) {
        let bit = (y * DISPLAY_WIDTH + x) as usize;
        (bit / 8, 0x80 >> (bit % 8))
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(DISPLAY_WIDTH, DISPLAY_HEIGHT)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            // Off-screen pixels are clipped
            if point.x >= 0 && point.y >= 0 {
                self.set_pixel(point.x as u32, point.y as u32, color.is_on());
            }
        }
        Ok(())
    }
}

/// Output device for rendered frames.
pub trait Display {
    fn present(&mut self, frame: &FrameBuffer) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_graphics::primitives::{Line, PrimitiveStyle};

    #[test]
    fn test_new_buffer_is_blank() {
        let fb = FrameBuffer::new();
        assert_eq!(fb.as_bytes().len(), 1024);
        assert!(fb.as_bytes().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_set_and_read_pixel() {
        let mut fb = FrameBuffer::new();
        fb.set_pixel(0, 0, true);
        fb.set_pixel(127, 63, true);
        assert!(fb.pixel(0, 0));
        assert!(fb.pixel(127, 63));
        assert!(!fb.pixel(1, 0));
        assert_eq!(fb.as_bytes()[0], 0x80);
        assert_eq!(fb.as_bytes()[1023], 0x01);

        fb.set_pixel(0, 0, false);
        assert!(!fb.pixel(0, 0));
    }

    #[test]
    fn test_out_of_bounds_is_clipped() {
        let mut fb = FrameBuffer::new();
        fb.set_pixel(128, 0, true);
        fb.set_pixel(0, 64, true);
        Line::new(Point::new(-10, -10), Point::new(-1, -1))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut fb)
            .unwrap();
        assert_eq!(fb, FrameBuffer::new());
    }

    #[test]
    fn test_draw_line_through_target() {
        let mut fb = FrameBuffer::new();
        Line::new(Point::new(0, 10), Point::new(127, 10))
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut fb)
            .unwrap();
        assert!((0..128).all(|x| fb.pixel(x, 10)));
        assert!(!fb.pixel(0, 11));
    }
}

use embedded_graphics::mono_font::ascii::{FONT_10X20, FONT_5X8, FONT_6X10};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Baseline, Text};

/// Where the piip indicator sits on every view.
pub const PIIP_POSITION: Point = Point::new(80, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Regular,
    Large,
}

impl TextSize {
    fn font(self) -> &'static MonoFont<'static> {
        match self {
            TextSize::Small => &FONT_5X8,
            TextSize::Regular => &FONT_6X10,
            TextSize::Large => &FONT_10X20,
        }
    }
}

/// Draws `text` with its top-left corner at `(x, y)`.
pub fn draw_text<D>(target: &mut D, text: &str, x: i32, y: i32, size: TextSize) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    let style = MonoTextStyle::new(size.font(), BinaryColor::On);
    Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(target)?;
    Ok(())
}

pub fn draw_line<D>(target: &mut D, from: Point, to: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Line::new(from, to)
        .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
        .draw(target)
}

/// Filled rectangle spanning both corners inclusive.
pub fn fill_rect<D>(target: &mut D, top_left: Point, bottom_right: Point) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    Rectangle::with_corners(top_left, bottom_right)
        .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
        .draw(target)
}

/// The "piip!" label shown while a detection is active.
pub fn draw_piip_indicator<D>(target: &mut D, active: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    if active {
        draw_text(
            target,
            "piip!",
            PIIP_POSITION.x,
            PIIP_POSITION.y,
            TextSize::Regular,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::FrameBuffer;

    #[test]
    fn test_indicator_only_when_active() {
        let mut fb = FrameBuffer::new();
        draw_piip_indicator(&mut fb, false).unwrap();
        assert_eq!(fb, FrameBuffer::new());

        draw_piip_indicator(&mut fb, true).unwrap();
        assert_ne!(fb, FrameBuffer::new());
        // Nothing left of the indicator's column
        assert!((0..80).all(|x| (0..64).all(|y| !fb.pixel(x, y))));
    }

    #[test]
    fn test_fill_rect_is_inclusive() {
        let mut fb = FrameBuffer::new();
        fill_rect(&mut fb, Point::new(2, 3), Point::new(3, 5)).unwrap();
        let lit = (0..128)
            .flat_map(|x| (0..64).map(move |y| (x, y)))
            .filter(|(x, y)| fb.pixel(*x, *y))
            .count();
        assert_eq!(lit, 6);
    }
}

//! Live spectrum view: bars, threshold line and monitored-band markers.

use crate::widgets::{draw_line, draw_piip_indicator, draw_text, fill_rect, TextSize};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use pelikello_core::constants::{BAR_SPACING, BAR_WIDTH, HEADER_HEIGHT};
use pelikello_core::{BandLayout, Settings};

/// Bar pitch in pixels.
const BAR_STEP: i32 = (BAR_WIDTH + BAR_SPACING) as i32;

/// Pixel column of the left edge of band `index`.
pub fn band_x(index: i64) -> i64 {
    index * BAR_STEP as i64
}

pub fn draw_spectrum<D>(
    target: &mut D,
    volumes: &[f32],
    settings: &Settings,
    layout: &BandLayout,
    piip_active: bool,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;

    let size = target.bounding_box().size;
    let width = size.width as i32;
    let height = size.height as i32;
    let max_height = (height - HEADER_HEIGHT as i32) as f32;

    let threshold_y = height - (settings.threshold * max_height) as i32;
    draw_line(
        target,
        Point::new(0, threshold_y),
        Point::new(width - 1, threshold_y),
    )?;

    for (i, volume) in volumes.iter().enumerate() {
        let x = i as i32 * BAR_STEP;
        if x + BAR_WIDTH as i32 > width {
            break;
        }
        let bar_height = (volume.clamp(0.0, 1.0) * max_height) as i32;
        if bar_height > 0 {
            fill_rect(
                target,
                Point::new(x, height - bar_height),
                Point::new(x + BAR_WIDTH as i32 - 1, height - 1),
            )?;
        }
    }

    let lower = layout.band_index(settings.monitor_freq as f32 - settings.tolerance as f32);
    let upper = layout.band_index(settings.monitor_freq as f32 + settings.tolerance as f32);
    for marker_x in [band_x(lower), band_x(upper)] {
        if (0..width as i64).contains(&marker_x) {
            let x = marker_x as i32;
            draw_line(
                target,
                Point::new(x, HEADER_HEIGHT as i32),
                Point::new(x, height - 1),
            )?;
        }
    }

    let mode: String = settings.eq_mode.name().chars().take(4).collect();
    draw_text(target, &format!("EQ: {}", mode), 0, 0, TextSize::Regular)?;
    draw_piip_indicator(target, piip_active)?;
    Ok(())
}

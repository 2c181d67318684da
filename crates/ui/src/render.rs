//! Per-view rendering with dirty checks.
//!
//! The spectrum view is presented every call. The timer view is presented
//! only when its text changes, the settings view only when its pixels do.
//! Entering a view always presents its first frame.

use crate::framebuffer::FrameBuffer;
use crate::visualizer::draw_spectrum;
use crate::widgets::{draw_piip_indicator, draw_text, TextSize};
use anyhow::Result;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use pelikello_core::{BandLayout, SettingId, Settings, View};

const SETTINGS_TOP: i32 = 9;
const SETTINGS_ROW_HEIGHT: i32 = 9;

/// Everything a view may show for one frame.
#[derive(Debug, Clone, Copy)]
pub struct RenderInput<'a> {
    pub volumes: &'a [f32],
    pub settings: &'a Settings,
    pub selected: usize,
    pub piip_active: bool,
    pub timer_text: &'a str,
}

pub struct Renderer {
    layout: BandLayout,
    frame: FrameBuffer,
    last_view: Option<View>,
    last_timer: Option<String>,
    last_settings: Option<FrameBuffer>,
}

impl Renderer {
    pub fn new(layout: BandLayout) -> Self {
        Self {
            layout,
            frame: FrameBuffer::new(),
            last_view: None,
            last_timer: None,
            last_settings: None,
        }
    }

    /// Renders `view`. Returns the frame to present, or `None` when the
    /// display already shows it.
    pub fn render(&mut self, view: View, input: &RenderInput<'_>) -> Result<Option<&FrameBuffer>> {
        if self.last_view != Some(view) {
            self.last_timer = None;
            self.last_settings = None;
            self.last_view = Some(view);
            log::debug!("Rendering {:?} view", view);
        }

        let dirty = match view {
            View::Spectrum => {
                draw_spectrum(
                    &mut self.frame,
                    input.volumes,
                    input.settings,
                    &self.layout,
                    input.piip_active,
                )?;
                true
            }
            View::Timer => self.render_timer(input)?,
            View::Settings => self.render_settings(input)?,
        };

        Ok(if dirty { Some(&self.frame) } else { None })
    }

    fn render_timer(&mut self, input: &RenderInput<'_>) -> Result<bool> {
        if self.last_timer.as_deref() == Some(input.timer_text) {
            return Ok(false);
        }

        draw_timer(&mut self.frame, input.timer_text, input.piip_active)?;
        self.last_timer = Some(input.timer_text.to_string());
        Ok(true)
    }

    fn render_settings(&mut self, input: &RenderInput<'_>) -> Result<bool> {
        draw_settings(
            &mut self.frame,
            input.settings,
            input.selected,
            input.piip_active,
        )?;
        if self.last_settings.as_ref() == Some(&self.frame) {
            return Ok(false);
        }
        self.last_settings = Some(self.frame.clone());
        Ok(true)
    }
}

pub fn draw_timer<D>(target: &mut D, text: &str, piip_active: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;
    draw_piip_indicator(target, piip_active)?;
    draw_text(target, "Game Clock", 0, 0, TextSize::Regular)?;
    draw_text(target, "Game Clock", 30, 20, TextSize::Regular)?;
    draw_text(target, text, 35, 40, TextSize::Large)?;
    Ok(())
}

pub fn draw_settings<D>(
    target: &mut D,
    settings: &Settings,
    selected: usize,
    piip_active: bool,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = BinaryColor>,
{
    target.clear(BinaryColor::Off)?;
    draw_piip_indicator(target, piip_active)?;
    for (idx, id) in SettingId::ALL.iter().enumerate() {
        let cursor = if idx == selected { ">" } else { " " };
        let row = format!("{} {}: {}", cursor, id.label(), settings.value(*id));
        let y = SETTINGS_TOP + idx as i32 * SETTINGS_ROW_HEIGHT;
        draw_text(target, &row, 0, y, TextSize::Small)?;
    }
    Ok(())
}

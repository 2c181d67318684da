//! Which screen is shown and which setting is being edited.

use crate::constants::{ADJUST_SETTLE, BUTTON_SETTLE, ENCODER_SETTLE};
use crate::input::{EncoderDirection, InputEdges};
use crate::settings::{SettingId, Settings};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Spectrum,
    Timer,
    Settings,
}

/// Outcome of one input poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Response {
    /// Total settle delay the loop should wait before polling again
    pub settle: Duration,
    pub settings_changed: bool,
}

/// View state machine driven by input edges.
#[derive(Debug)]
pub struct ViewController {
    view: View,
    selected: usize,
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            view: View::Spectrum,
            selected: 0,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_setting(&self) -> SettingId {
        SettingId::ALL[self.selected % SettingId::ALL.len()]
    }

    /// Spectrum and Timer swap; Settings falls back to Spectrum.
    pub fn on_view_button(&mut self) {
        self.view = match self.view {
            View::Spectrum => View::Timer,
            View::Timer => View::Spectrum,
            View::Settings => View::Spectrum,
        };
    }

    pub fn on_confirm_button(&mut self) {
        self.view = match self.view {
            View::Spectrum | View::Timer => View::Settings,
            View::Settings => View::Spectrum,
        };
    }

    /// Moves the settings cursor; ignored outside the settings view.
    pub fn on_encoder_rotated(&mut self, direction: EncoderDirection) {
        if self.view != View::Settings {
            return;
        }
        let count = SettingId::ALL.len();
        self.selected = match direction {
            EncoderDirection::Forward => (self.selected + 1) % count,
            EncoderDirection::Back => (self.selected + count - 1) % count,
        };
    }

    /// Steps the selected setting. Returns `true` when a value changed.
    pub fn on_encoder_button(&mut self, settings: &mut Settings) -> bool {
        if self.view != View::Settings {
            return false;
        }
        settings.step(self.selected_setting());
        true
    }

    /// Applies every edge of one poll in loop order (view, confirm, encoder,
    /// encoder button) and sums the settle delays they call for.
    pub fn handle(&mut self, edges: &InputEdges, settings: &mut Settings) -> Response {
        let mut response = Response::default();

        if edges.view_pressed {
            self.on_view_button();
            response.settle += BUTTON_SETTLE;
        }
        if edges.confirm_pressed {
            self.on_confirm_button();
            response.settle += BUTTON_SETTLE;
        }
        if let Some(direction) = edges.encoder_rotated {
            self.on_encoder_rotated(direction);
            response.settle += ENCODER_SETTLE;
        }
        if edges.encoder_button_held && self.on_encoder_button(settings) {
            response.settings_changed = true;
            response.settle += ADJUST_SETTLE;
        }

        log::trace!("view {:?}, selected {}", self.view, self.selected);
        response
    }
}

//! User-editable tunables and their step/wrap rules.

use crate::detector::DetectorParams;
use crate::spectrum::ScalingMode;
use std::fmt;
use std::time::Duration;

/// Live configuration edited from the settings view. Not persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub eq_mode: ScalingMode,
    pub sensitivity: f32,
    /// Continuous exceedance required before a piip is confirmed, in seconds
    pub confirmation_secs: f32,
    pub monitor_freq: u32,
    pub tolerance: u32,
    pub threshold: f32,
}

fn default_sensitivity() -> f32 {
    8.0
}

fn default_confirmation_secs() -> f32 {
    0.1
}

fn default_monitor_freq() -> u32 {
    19_000
}

fn default_tolerance() -> u32 {
    2_000
}

fn default_threshold() -> f32 {
    0.2
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            eq_mode: ScalingMode::Raw,
            sensitivity: default_sensitivity(),
            confirmation_secs: default_confirmation_secs(),
            monitor_freq: default_monitor_freq(),
            tolerance: default_tolerance(),
            threshold: default_threshold(),
        }
    }
}

/// Settings menu rows, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingId {
    EqMode,
    Sensitivity,
    Confirmation,
    MonitorFreq,
    Tolerance,
    Threshold,
}

impl SettingId {
    pub const ALL: [SettingId; 6] = [
        SettingId::EqMode,
        SettingId::Sensitivity,
        SettingId::Confirmation,
        SettingId::MonitorFreq,
        SettingId::Tolerance,
        SettingId::Threshold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SettingId::EqMode => "EQ Mode",
            SettingId::Sensitivity => "Sensitivity",
            SettingId::Confirmation => "Piip Duration",
            SettingId::MonitorFreq => "Monitor Freq",
            SettingId::Tolerance => "Tolerance",
            SettingId::Threshold => "Threshold",
        }
    }
}

/// Typed value of one setting, formatted the way the menu shows it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Mode(ScalingMode),
    Factor(f32),
    Seconds(f32),
    Hertz(u32),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Mode(mode) => write!(f, "{}", mode),
            SettingValue::Factor(v) => write!(f, "{:.2}", v),
            SettingValue::Seconds(v) => write!(f, "{:.2}s", v),
            SettingValue::Hertz(v) => write!(f, "{}Hz", v),
        }
    }
}

/// Adds `step`, or wraps to `min` once the result would pass `max`.
fn step_f32(value: f32, step: f32, max: f32, min: f32) -> f32 {
    let next = round_hundredths(value + step);
    if next > max {
        min
    } else {
        next
    }
}

fn step_u32(value: u32, step: u32, max: u32, min: u32) -> u32 {
    let next = value.saturating_add(step);
    if next > max {
        min
    } else {
        next
    }
}

fn round_hundredths(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

impl Settings {
    pub fn value(&self, id: SettingId) -> SettingValue {
        match id {
            SettingId::EqMode => SettingValue::Mode(self.eq_mode),
            SettingId::Sensitivity => SettingValue::Factor(self.sensitivity),
            SettingId::Confirmation => SettingValue::Seconds(self.confirmation_secs),
            SettingId::MonitorFreq => SettingValue::Hertz(self.monitor_freq),
            SettingId::Tolerance => SettingValue::Hertz(self.tolerance),
            SettingId::Threshold => SettingValue::Factor(self.threshold),
        }
    }

    /// Advances one setting by its step.
    pub fn step(&mut self, id: SettingId) {
        match id {
            SettingId::EqMode => self.eq_mode = self.eq_mode.next(),
            SettingId::Sensitivity => {
                self.sensitivity = step_f32(self.sensitivity, 0.1, 10.0, 0.1);
            }
            SettingId::Confirmation => {
                self.confirmation_secs = step_f32(self.confirmation_secs, 0.05, 2.0, 0.01);
            }
            SettingId::MonitorFreq => {
                self.monitor_freq = step_u32(self.monitor_freq, 50, 20_000, 100);
            }
            SettingId::Tolerance => {
                self.tolerance = step_u32(self.tolerance, 10, 1_000, 10);
            }
            SettingId::Threshold => {
                self.threshold = step_f32(self.threshold, 0.05, 1.0, 0.05);
            }
        }
    }

    pub fn confirmation(&self) -> Duration {
        Duration::from_millis((self.confirmation_secs.max(0.0) * 1000.0).round() as u64)
    }

    pub fn detector_params(&self) -> DetectorParams {
        DetectorParams {
            monitor_freq: self.monitor_freq as f32,
            tolerance: self.tolerance as f32,
            threshold: self.threshold,
            confirmation: self.confirmation(),
        }
    }
}

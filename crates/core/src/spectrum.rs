//! Band spectrum analysis and display scaling.
//!
//! Turns one audio block into `num_bars` linearly spaced band energies and
//! then into a `[0, 1]` volume vector under the active [`ScalingMode`].

use crate::constants::{
    FFT_SIZE, LOWER_FREQ_LIMIT, NUM_BARS, SAMPLE_RATE, SENSITIVITY_EPSILON, UPPER_FREQ_LIMIT,
};
use spectrum_analyzer::{samples_fft_to_spectrum, FrequencyLimit};
use std::fmt;
use std::ops::RangeInclusive;

/// How band energies are mapped to bar heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingMode {
    Normalized,
    Raw,
    Logarithmic,
}

impl ScalingMode {
    /// Cycle order used by the settings menu.
    pub const CYCLE: [ScalingMode; 3] = [
        ScalingMode::Normalized,
        ScalingMode::Raw,
        ScalingMode::Logarithmic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ScalingMode::Normalized => "normalized",
            ScalingMode::Raw => "raw",
            ScalingMode::Logarithmic => "logarithmic",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::CYCLE.iter().position(|m| *m == self).unwrap_or(0);
        Self::CYCLE[(idx + 1) % Self::CYCLE.len()]
    }

    pub(crate) fn to_u8(self) -> u8 {
        match self {
            ScalingMode::Normalized => 0,
            ScalingMode::Raw => 1,
            ScalingMode::Logarithmic => 2,
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => ScalingMode::Normalized,
            2 => ScalingMode::Logarithmic,
            _ => ScalingMode::Raw,
        }
    }
}

impl fmt::Display for ScalingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Linear partition of `[lower, upper)` into `num_bars` equal-width bands.
///
/// Shared by the analyzer, the detector and the spectrum view so a frequency
/// always lands in the same band everywhere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLayout {
    pub lower: f32,
    pub upper: f32,
    pub num_bars: usize,
}

impl Default for BandLayout {
    fn default() -> Self {
        Self {
            lower: LOWER_FREQ_LIMIT,
            upper: UPPER_FREQ_LIMIT,
            num_bars: NUM_BARS,
        }
    }
}

impl BandLayout {
    pub fn band_width(&self) -> f32 {
        (self.upper - self.lower) / self.num_bars as f32
    }

    /// Lower edge of band `i`. `edge(num_bars)` is the upper limit.
    pub fn edge(&self, i: usize) -> f32 {
        self.lower + self.band_width() * i as f32
    }

    /// Band index of `freq`, possibly negative or past the last band.
    pub fn band_index(&self, freq: f32) -> i64 {
        ((freq - self.lower) / self.band_width()).floor() as i64
    }

    /// Band indices covering `center ± tolerance`, or `None` when the range
    /// is empty or leaves the layout.
    pub fn monitor_range(&self, center: f32, tolerance: f32) -> Option<RangeInclusive<usize>> {
        let lo = self.band_index(center - tolerance);
        let hi = self.band_index(center + tolerance);
        if 0 <= lo && lo <= hi && hi < self.num_bars as i64 {
            Some(lo as usize..=hi as usize)
        } else {
            None
        }
    }
}

/// Computes band energies from raw audio blocks.
///
/// Owns its FFT input buffer so the audio callback does not allocate it per
/// block.
pub struct SpectrumAnalyzer {
    layout: BandLayout,
    sample_rate: u32,
    window: Vec<f32>,
    sums: Vec<f32>,
    counts: Vec<u32>,
}

impl Default for SpectrumAnalyzer {
    fn default() -> Self {
        Self::new(BandLayout::default(), SAMPLE_RATE, FFT_SIZE)
    }
}

impl SpectrumAnalyzer {
    pub fn new(layout: BandLayout, sample_rate: u32, fft_size: usize) -> Self {
        Self {
            layout,
            sample_rate,
            window: vec![0.0; fft_size],
            sums: vec![0.0; layout.num_bars],
            counts: vec![0; layout.num_bars],
        }
    }

    pub fn layout(&self) -> &BandLayout {
        &self.layout
    }

    /// Writes the band energies of `block` into `frame`.
    ///
    /// `frame` is resized to `num_bars`. Every value is finite and
    /// non-negative; a failed transform yields an all-zero frame.
    pub fn analyze(&mut self, block: &[f32], frame: &mut Vec<f32>) {
        frame.clear();
        frame.resize(self.layout.num_bars, 0.0);

        let n = block.len().min(self.window.len());
        self.window[..n].copy_from_slice(&block[..n]);
        self.window[n..].fill(0.0);

        let spectrum = match samples_fft_to_spectrum(
            &self.window,
            self.sample_rate,
            FrequencyLimit::All,
            None,
        ) {
            Ok(spectrum) => spectrum,
            Err(e) => {
                log::debug!("FFT failed, emitting silent frame: {:?}", e);
                return;
            }
        };

        self.sums.fill(0.0);
        self.counts.fill(0);
        for (freq, magnitude) in spectrum.data().iter() {
            let freq = freq.val();
            if freq < self.layout.lower || freq >= self.layout.upper {
                continue;
            }
            let idx = self.layout.band_index(freq);
            if idx < 0 || idx as usize >= self.layout.num_bars {
                continue;
            }
            // Float rounding at an edge can bin one step too high
            let mut idx = idx as usize;
            if freq < self.layout.edge(idx) && idx > 0 {
                idx -= 1;
            }
            self.sums[idx] += magnitude.val();
            self.counts[idx] += 1;
        }

        for (value, (sum, count)) in frame.iter_mut().zip(self.sums.iter().zip(&self.counts)) {
            *value = if *count > 0 {
                finite_or_zero(sum / *count as f32)
            } else {
                0.0
            };
        }
    }
}

fn finite_or_zero(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Maps band energies to bar heights in `[0, 1]`.
pub fn calculate_volumes(frame: &[f32], mode: ScalingMode, sensitivity: f32, volumes: &mut Vec<f32>) {
    let sensitivity = if sensitivity.is_finite() {
        sensitivity.max(SENSITIVITY_EPSILON)
    } else {
        SENSITIVITY_EPSILON
    };

    volumes.clear();
    match mode {
        ScalingMode::Normalized => {
            let max = frame.iter().copied().fold(0.0f32, f32::max);
            let divisor = if max == 0.0 || !max.is_finite() { 1.0 } else { max };
            let gain = sensitivity / 20.0 / divisor;
            volumes.extend(frame.iter().map(|v| clamp_unit(v * gain)));
        }
        ScalingMode::Raw => {
            volumes.extend(frame.iter().map(|v| clamp_unit(v * sensitivity)));
        }
        ScalingMode::Logarithmic => {
            let denom = (sensitivity + 1.0).log10();
            volumes.extend(
                frame
                    .iter()
                    .map(|v| clamp_unit((v.max(0.0) * sensitivity + 1.0).log10() / denom)),
            );
        }
    }
}

fn clamp_unit(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

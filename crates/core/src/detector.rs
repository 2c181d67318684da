//! Debounced detection of a sustained tone in the monitored band range.

use crate::spectrum::BandLayout;
use std::time::{Duration, Instant};

/// Debounce progress for the monitored band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    Idle,
    Confirming { since: Instant },
    Confirmed,
}

/// Parameters the detector reads for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorParams {
    pub monitor_freq: f32,
    pub tolerance: f32,
    pub threshold: f32,
    pub confirmation: Duration,
}

/// Turns per-block band levels into discrete piip events.
///
/// The monitored mean must stay strictly above the threshold for the whole
/// confirmation window; one block at or below it disarms the debounce.
pub struct ToneDetector {
    layout: BandLayout,
    state: DetectionState,
}

impl ToneDetector {
    pub fn new(layout: BandLayout) -> Self {
        Self {
            layout,
            state: DetectionState::Idle,
        }
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Mean volume over the monitored band range, or `None` when the range
    /// falls outside the layout.
    pub fn monitored_level(&self, volumes: &[f32], params: &DetectorParams) -> Option<f32> {
        let range = self
            .layout
            .monitor_range(params.monitor_freq, params.tolerance)?;
        let band = volumes.get(range)?;
        if band.is_empty() {
            return None;
        }
        Some(band.iter().sum::<f32>() / band.len() as f32)
    }

    /// Advances the debounce with this block's volumes. Returns `true` on the
    /// block that confirms a detection.
    pub fn update(&mut self, volumes: &[f32], params: &DetectorParams, now: Instant) -> bool {
        let Some(level) = self.monitored_level(volumes, params) else {
            return false;
        };

        if level <= params.threshold {
            self.state = DetectionState::Idle;
            return false;
        }

        match self.state {
            DetectionState::Idle | DetectionState::Confirmed => {
                self.state = DetectionState::Confirming { since: now };
                false
            }
            DetectionState::Confirming { since } => {
                if now.saturating_duration_since(since) >= params.confirmation {
                    self.state = DetectionState::Confirmed;
                    true
                } else {
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{BLOCK_DURATION, NUM_BARS};

    fn params() -> DetectorParams {
        DetectorParams {
            monitor_freq: 19_000.0,
            tolerance: 2_000.0,
            threshold: 0.2,
            confirmation: Duration::from_millis(100),
        }
    }

    fn volumes_at(level: f32) -> Vec<f32> {
        vec![level; NUM_BARS]
    }

    /// Feeds `level` every `step` from `start` while `elapsed <= hold`,
    /// returning how many times the detector fired.
    fn hold(detector: &mut ToneDetector, level: f32, hold: Duration, step: Duration) -> usize {
        let start = Instant::now();
        let volumes = volumes_at(level);
        let mut fired = 0;
        let mut t = Duration::ZERO;
        while t <= hold {
            if detector.update(&volumes, &params(), start + t) {
                fired += 1;
            }
            t += step;
        }
        fired
    }

    #[test]
    fn test_level_at_threshold_never_fires() {
        let mut detector = ToneDetector::new(BandLayout::default());
        let fired = hold(&mut detector, 0.2, Duration::from_secs(2), BLOCK_DURATION);
        assert_eq!(fired, 0);
        assert_eq!(detector.state(), DetectionState::Idle);
    }

    #[test]
    fn test_short_exceedance_does_not_fire() {
        let mut detector = ToneDetector::new(BandLayout::default());
        let fired = hold(
            &mut detector,
            0.2 + 1e-4,
            Duration::from_millis(99),
            Duration::from_millis(1),
        );
        assert_eq!(fired, 0);
        assert!(matches!(detector.state(), DetectionState::Confirming { .. }));
    }

    #[test]
    fn test_sustained_exceedance_fires_once() {
        let mut detector = ToneDetector::new(BandLayout::default());
        let fired = hold(
            &mut detector,
            0.2 + 1e-4,
            Duration::from_millis(101),
            Duration::from_millis(1),
        );
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_continued_tone_refires_after_full_window() {
        let mut detector = ToneDetector::new(BandLayout::default());
        let start = Instant::now();
        let loud = volumes_at(0.5);
        let p = params();
        let ms = |n: u64| start + Duration::from_millis(n);

        assert!(!detector.update(&loud, &p, ms(0)));
        assert!(detector.update(&loud, &p, ms(100)));
        assert_eq!(detector.state(), DetectionState::Confirmed);

        // The block after a detection starts a new window
        assert!(!detector.update(&loud, &p, ms(120)));
        assert!(!detector.update(&loud, &p, ms(200)));
        assert!(detector.update(&loud, &p, ms(220)));
    }

    #[test]
    fn test_dip_resets_debounce() {
        let mut detector = ToneDetector::new(BandLayout::default());
        let start = Instant::now();
        let loud = volumes_at(0.5);
        let quiet = volumes_at(0.1);
        let p = params();

        assert!(!detector.update(&loud, &p, start));
        assert!(!detector.update(&loud, &p, start + Duration::from_millis(80)));
        assert!(!detector.update(&quiet, &p, start + Duration::from_millis(90)));
        assert_eq!(detector.state(), DetectionState::Idle);
        // Re-armed here, so 120ms after the first loud block is not enough
        assert!(!detector.update(&loud, &p, start + Duration::from_millis(100)));
        assert!(!detector.update(&loud, &p, start + Duration::from_millis(120)));
        assert!(detector.update(&loud, &p, start + Duration::from_millis(200)));
    }

    #[test]
    fn test_out_of_range_band_is_inactive() {
        let mut detector = ToneDetector::new(BandLayout::default());
        let mut p = params();
        p.monitor_freq = 500.0;
        p.tolerance = 100.0;
        let start = Instant::now();
        let loud = volumes_at(1.0);
        assert!(detector.monitored_level(&loud, &p).is_none());
        for ms in 0..500 {
            assert!(!detector.update(&loud, &p, start + Duration::from_millis(ms)));
        }
        assert_eq!(detector.state(), DetectionState::Idle);
    }

    #[test]
    fn test_monitored_level_uses_range_mean() {
        let detector = ToneDetector::new(BandLayout::default());
        let mut volumes = vec![0.0f32; NUM_BARS];
        // Default range is bands 32..=40 (9 bands)
        for v in &mut volumes[32..=40] {
            *v = 0.9;
        }
        let level = detector.monitored_level(&volumes, &params()).unwrap();
        assert!((level - 0.9).abs() < 1e-6);

        volumes[36] = 0.0;
        let level = detector.monitored_level(&volumes, &params()).unwrap();
        assert!((level - 0.8).abs() < 1e-6);
    }
}

//! Per-block analysis run inside the audio callback.

use crate::detector::ToneDetector;
use crate::shared::SharedState;
use crate::spectrum::{calculate_volumes, SpectrumAnalyzer};
use std::sync::Arc;
use std::time::Instant;

/// Everything the capture callback needs, moved into it at registration.
///
/// Owns the analyzer, the detector and its scratch buffers; the only state it
/// exposes to the main loop goes through [`SharedState`].
pub struct AnalysisPipeline {
    analyzer: SpectrumAnalyzer,
    detector: ToneDetector,
    shared: Arc<SharedState>,
    frame: Vec<f32>,
    volumes: Vec<f32>,
}

impl AnalysisPipeline {
    pub fn new(analyzer: SpectrumAnalyzer, shared: Arc<SharedState>) -> Self {
        let layout = *analyzer.layout();
        Self {
            analyzer,
            detector: ToneDetector::new(layout),
            shared,
            frame: Vec::with_capacity(layout.num_bars),
            volumes: Vec::with_capacity(layout.num_bars),
        }
    }

    /// Analyzes one block and publishes the volumes. Returns `true` when this
    /// block confirmed a piip.
    pub fn process_block(&mut self, block: &[f32], now: Instant) -> bool {
        let params = self.shared.params.load();

        self.analyzer.analyze(block, &mut self.frame);
        calculate_volumes(
            &self.frame,
            params.eq_mode,
            params.sensitivity,
            &mut self.volumes,
        );

        let fired = self.detector.update(&self.volumes, &params.detector, now);
        self.shared
            .publish(&self.volumes, if fired { Some(now) } else { None });
        fired
    }
}

//! State shared between the audio callback and the main loop.
//!
//! The volume vector and piip event are written together under one mutex so
//! the main loop never sees a half-written vector or a flag without its
//! timestamp. Detection parameters flow the other way through atomics, which
//! the callback loads once per block.

use crate::detector::DetectorParams;
use crate::settings::Settings;
use crate::spectrum::ScalingMode;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Momentary detection flag with the time it was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PiipEvent {
    pub active: bool,
    pub at: Option<Instant>,
}

impl PiipEvent {
    /// `true` once an active event has been shown for `display` or longer.
    pub fn expired(&self, now: Instant, display: Duration) -> bool {
        match (self.active, self.at) {
            (true, Some(at)) => now.saturating_duration_since(at) >= display,
            (true, None) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct Snapshot {
    volumes: Vec<f32>,
    piip: PiipEvent,
}

/// Detection parameters published by the main loop for the callback.
#[derive(Debug)]
pub struct AnalysisParams {
    eq_mode: AtomicU8,
    sensitivity: AtomicU32,
    threshold: AtomicU32,
    confirmation_ms: AtomicU32,
    monitor_freq: AtomicU32,
    tolerance: AtomicU32,
}

/// Values the callback uses for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockParams {
    pub eq_mode: ScalingMode,
    pub sensitivity: f32,
    pub detector: DetectorParams,
}

impl AnalysisParams {
    pub fn new(settings: &Settings) -> Self {
        let params = Self {
            eq_mode: AtomicU8::new(0),
            sensitivity: AtomicU32::new(0),
            threshold: AtomicU32::new(0),
            confirmation_ms: AtomicU32::new(0),
            monitor_freq: AtomicU32::new(0),
            tolerance: AtomicU32::new(0),
        };
        params.publish(settings);
        params
    }

    pub fn publish(&self, settings: &Settings) {
        self.eq_mode
            .store(settings.eq_mode.to_u8(), Ordering::Relaxed);
        self.sensitivity
            .store(settings.sensitivity.to_bits(), Ordering::Relaxed);
        self.threshold
            .store(settings.threshold.to_bits(), Ordering::Relaxed);
        self.confirmation_ms.store(
            settings.confirmation().as_millis().min(u32::MAX as u128) as u32,
            Ordering::Relaxed,
        );
        self.monitor_freq
            .store(settings.monitor_freq, Ordering::Relaxed);
        self.tolerance.store(settings.tolerance, Ordering::Relaxed);
    }

    pub fn load(&self) -> BlockParams {
        BlockParams {
            eq_mode: ScalingMode::from_u8(self.eq_mode.load(Ordering::Relaxed)),
            sensitivity: f32::from_bits(self.sensitivity.load(Ordering::Relaxed)),
            detector: DetectorParams {
                monitor_freq: self.monitor_freq.load(Ordering::Relaxed) as f32,
                tolerance: self.tolerance.load(Ordering::Relaxed) as f32,
                threshold: f32::from_bits(self.threshold.load(Ordering::Relaxed)),
                confirmation: Duration::from_millis(
                    self.confirmation_ms.load(Ordering::Relaxed) as u64,
                ),
            },
        }
    }
}

/// Thread-safe cell between the capture callback and the main loop.
#[derive(Debug)]
pub struct SharedState {
    snapshot: Mutex<Snapshot>,
    pub params: AnalysisParams,
}

impl SharedState {
    pub fn new(settings: &Settings, num_bars: usize) -> Self {
        Self {
            snapshot: Mutex::new(Snapshot {
                volumes: vec![0.0; num_bars],
                piip: PiipEvent::default(),
            }),
            params: AnalysisParams::new(settings),
        }
    }

    // The snapshot holds plain values, so a panic mid-write leaves nothing
    // worse than one stale frame.
    fn lock(&self) -> MutexGuard<'_, Snapshot> {
        match self.snapshot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replaces the volume vector and, when `fired_at` is set, raises the
    /// piip event in the same critical section.
    pub fn publish(&self, volumes: &[f32], fired_at: Option<Instant>) {
        let mut snapshot = self.lock();
        snapshot.volumes.clear();
        snapshot.volumes.extend_from_slice(volumes);
        if let Some(at) = fired_at {
            snapshot.piip = PiipEvent {
                active: true,
                at: Some(at),
            };
        }
    }

    /// Copies the latest volume vector into `out` and returns the piip event
    /// read under the same lock.
    pub fn read(&self, out: &mut Vec<f32>) -> PiipEvent {
        let snapshot = self.lock();
        out.clear();
        out.extend_from_slice(&snapshot.volumes);
        snapshot.piip
    }

    pub fn piip(&self) -> PiipEvent {
        self.lock().piip
    }

    /// Clears the piip flag once it has been displayed long enough. Returns
    /// `true` when it was cleared.
    pub fn expire_piip(&self, now: Instant, display: Duration) -> bool {
        let mut snapshot = self.lock();
        if snapshot.piip.expired(now, display) {
            snapshot.piip.active = false;
            true
        } else {
            false
        }
    }
}

//! Shared constants for the audio pipeline, detection and main loop timing.

use std::time::Duration;

/// Capture sample rate (96kHz, so the 19kHz piip sits well below Nyquist)
pub const SAMPLE_RATE: u32 = 96_000;

/// Duration of one analysis block
pub const BLOCK_DURATION: Duration = Duration::from_millis(20);

/// Samples per analysis block (20ms at 96kHz = 1920 samples)
pub const BLOCK_SIZE: usize = SAMPLE_RATE as usize * BLOCK_DURATION.as_millis() as usize / 1000;

/// FFT length; blocks are zero-padded or truncated to this size
pub const FFT_SIZE: usize = 2048;

/// Lower edge of the first band in Hz
pub const LOWER_FREQ_LIMIT: f32 = 2_000.0;

/// Upper edge of the last band in Hz
pub const UPPER_FREQ_LIMIT: f32 = 30_000.0;

/// Number of spectrum bands (one bar each)
pub const NUM_BARS: usize = 60;

/// Smallest sensitivity used in scaling
pub const SENSITIVITY_EPSILON: f32 = 1e-3;

/// How long the piip indicator stays active after a detection
pub const PIIP_DISPLAY_DURATION: Duration = Duration::from_millis(500);

/// Game clock countdown length (15 minutes)
pub const COUNTDOWN_DURATION: Duration = Duration::from_secs(15 * 60);

// Main loop timing

/// Sleep at the end of every main loop iteration
pub const TICK: Duration = Duration::from_millis(5);

/// Pause after each render call
pub const RENDER_PACING: Duration = Duration::from_millis(50);

/// Settle delay after a view or confirm button press
pub const BUTTON_SETTLE: Duration = Duration::from_millis(200);

/// Settle delay after an encoder channel A level change
pub const ENCODER_SETTLE: Duration = Duration::from_millis(100);

/// Settle delay after the encoder button steps a setting
pub const ADJUST_SETTLE: Duration = Duration::from_millis(200);

// Display geometry

/// Display width in pixels
pub const DISPLAY_WIDTH: u32 = 128;

/// Display height in pixels
pub const DISPLAY_HEIGHT: u32 = 64;

/// Width of one spectrum bar in pixels
pub const BAR_WIDTH: u32 = 2;

/// Gap between spectrum bars in pixels
pub const BAR_SPACING: u32 = 1;

/// Rows reserved at the top of the spectrum view for labels
pub const HEADER_HEIGHT: u32 = 16;

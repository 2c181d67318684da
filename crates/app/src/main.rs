use anyhow::Result;
use log::{error, info};
use pelikello_core::constants::{BLOCK_SIZE, NUM_BARS, SAMPLE_RATE};
use pelikello_core::{AnalysisPipeline, BandLayout, Settings, SharedState, SpectrumAnalyzer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

mod app;
mod audio;
mod display;
mod gpio;

use app::App;
use audio::CaptureStream;
use display::TerminalDisplay;

fn main() {
    env_logger::init();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Interrupt received, shutting down");
        r.store(false, Ordering::Relaxed);
    }) {
        error!("Failed to install interrupt handler: {}", e);
        std::process::exit(1);
    }

    match run(&running) {
        Ok(()) => info!("Pelikello stopped"),
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(running: &AtomicBool) -> Result<()> {
    let settings = Settings::default();
    let layout = BandLayout::default();
    let shared = Arc::new(SharedState::new(&settings, NUM_BARS));

    let display = TerminalDisplay::stdout();
    let pins = gpio::open_default()?;
    let (faults_tx, faults_rx) = crossbeam_channel::bounded(4);
    let mut app = App::new(display, pins, shared.clone(), settings, layout, faults_rx)?;

    let mut pipeline = AnalysisPipeline::new(SpectrumAnalyzer::default(), shared);
    // Declared after `app` so the stream is released before the display and pins
    let mut stream = CaptureStream::open(
        SAMPLE_RATE,
        BLOCK_SIZE,
        move |block| {
            pipeline.process_block(block, Instant::now());
        },
        faults_tx,
    )?;
    stream.start()?;
    info!("Pelikello running, press Ctrl+C to stop");

    let result = app.run(running);
    let closed = stream.close();
    result.and(closed)
}

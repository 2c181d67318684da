use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use log::{info, warn};
use pelikello_core::BlockAssembler;

/// Mono input stream that calls `on_block` once per fixed-size block.
///
/// The callback runs on the host's audio thread. It must not block; stream
/// errors are forwarded to `faults` for the main loop to act on.
pub struct CaptureStream {
    stream: cpal::Stream,
    playing: bool,
}

impl CaptureStream {
    /// Opens the default input device. The stream starts paused.
    pub fn open<F>(
        sample_rate: u32,
        block_size: usize,
        mut on_block: F,
        faults: Sender<anyhow::Error>,
    ) -> Result<Self>
    where
        F: FnMut(&[f32]) + Send + 'static,
    {
        let host = cpal::default_host();
        info!("Audio host: {}", host.id().name());

        let device = host
            .default_input_device()
            .context("No default input found")?;
        info!(
            "Using input device: {}",
            device.name().unwrap_or_default()
        );

        let config = cpal::StreamConfig {
            channels: 1,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let mut assembler = BlockAssembler::new(block_size);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _| {
                    assembler.push(data, &mut on_block);
                },
                move |err| {
                    let fault = anyhow::Error::new(err).context("Audio input stream failed");
                    if faults.try_send(fault).is_err() {
                        warn!("Dropping audio stream error, main loop is not listening");
                    }
                },
                None,
            )
            .with_context(|| {
                format!(
                    "Failed to open {} Hz mono input stream ({} samples per block)",
                    sample_rate, block_size
                )
            })?;

        Ok(Self {
            stream,
            playing: false,
        })
    }

    pub fn start(&mut self) -> Result<()> {
        self.stream
            .play()
            .context("Failed to start audio input stream")?;
        self.playing = true;
        info!("Audio capture started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.playing {
            self.stream
                .pause()
                .context("Failed to stop audio input stream")?;
            self.playing = false;
            info!("Audio capture stopped");
        }
        Ok(())
    }

    /// Stops the stream and releases the device.
    pub fn close(mut self) -> Result<()> {
        self.stop()
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        if self.playing {
            if let Err(e) = self.stream.pause() {
                warn!("Failed to stop audio input stream on drop: {}", e);
            }
        }
    }
}

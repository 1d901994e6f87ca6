//! Audible alert playback.
//!
//! Decodes the alert WAV once at startup and loops it on a cpal output
//! stream while a detection is active. A missing file or missing output
//! device degrades to visual-only alerts; never fatal.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

/// Loads and plays the alert sound.
pub struct AlertPlayer {
    /// Decoded mono samples, normalized to [-1, 1]
    samples: Arc<Vec<f32>>,
    /// Sample rate of the decoded WAV
    wav_rate: u32,
    /// Active output stream while the alert is sounding
    stream: Option<cpal::Stream>,
}

impl std::fmt::Debug for AlertPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlertPlayer")
            .field("samples", &self.samples.len())
            .field("wav_rate", &self.wav_rate)
            .field("playing", &self.stream.is_some())
            .finish()
    }
}

impl AlertPlayer {
    /// Decode an alert WAV into memory.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened, is not a valid WAV, or
    /// contains no samples.
    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = hound::WavReader::open(path)
            .with_context(|| format!("failed to open alert sound {}", path.display()))?;
        let spec = reader.spec();

        log::info!("Loaded alert sound {}:", path.display());
        log::info!("  Sample rate: {} Hz", spec.sample_rate);
        log::info!("  Channels: {}", spec.channels);
        log::info!("  Bits per sample: {}", spec.bits_per_sample);

        let raw: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Int => {
                // Normalize int samples: -2^(bits-1)..2^(bits-1)-1 -> -1.0..1.0
                #[allow(clippy::cast_precision_loss, reason = "full-scale value to float")]
                let full_scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .filter_map(Result::ok)
                    .map(|s| {
                        #[allow(clippy::cast_precision_loss, reason = "sample to float")]
                        let v = s as f32;
                        v / full_scale
                    })
                    .collect()
            }
            hound::SampleFormat::Float => {
                reader.samples::<f32>().filter_map(Result::ok).collect()
            }
        };

        let channels = usize::from(spec.channels.max(1));
        #[allow(clippy::cast_precision_loss, reason = "channel count to float")]
        let samples: Vec<f32> = raw
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();

        if samples.is_empty() {
            anyhow::bail!("alert sound {} contains no samples", path.display());
        }

        Ok(Self {
            samples: Arc::new(samples),
            wav_rate: spec.sample_rate,
            stream: None,
        })
    }

    #[allow(dead_code, reason = "state inspection, used in tests")]
    pub fn is_playing(&self) -> bool {
        self.stream.is_some()
    }

    /// Start looping the alert. No-op if already playing.
    pub fn start(&mut self) {
        if self.stream.is_some() {
            return;
        }
        match self.build_stream() {
            Ok(stream) => {
                if let Err(e) = stream.play() {
                    log::warn!("failed to start alert playback: {e}");
                    return;
                }
                self.stream = Some(stream);
            }
            Err(e) => log::warn!("alert sound unavailable: {e:#}"),
        }
    }

    /// Stop the alert by dropping the output stream.
    pub fn stop(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("alert sound stopped");
        }
    }

    fn build_stream(&self) -> Result<cpal::Stream> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .context("no audio output device found")?;
        let config = device
            .default_output_config()
            .context("failed to get audio output config")?;

        log::debug!(
            "alert output: {} @ {} Hz",
            device.name().unwrap_or_else(|_| String::from("unknown")),
            config.sample_rate().0
        );

        let out_channels = usize::from(config.channels());
        let step = f64::from(self.wav_rate) / f64::from(config.sample_rate().0);
        let samples = Arc::clone(&self.samples);
        let mut cursor = 0.0f64;

        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    for frame in data.chunks_mut(out_channels) {
                        #[allow(
                            clippy::cast_possible_truncation,
                            clippy::cast_sign_loss,
                            reason = "cursor is kept within samples.len()"
                        )]
                        let value = samples[cursor as usize];
                        for out in frame.iter_mut() {
                            *out = value;
                        }
                        cursor += step;
                        #[allow(clippy::cast_precision_loss, reason = "length to float")]
                        if cursor >= samples.len() as f64 {
                            cursor = 0.0; // loop
                        }
                    }
                },
                |err| log::warn!("audio output error: {err}"),
                None,
            )
            .context("failed to build audio output stream")?;

        Ok(stream)
    }
}

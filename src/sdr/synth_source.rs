//! Synthetic IQ source for running without radio hardware.
//!
//! Generates a fixed baseband tone over a white noise floor so the spectrum
//! display and threshold detector have something realistic to chew on.

use num_complex::Complex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::sdr::{DeviceConfig, SampleSource};

/// Baseband offset of the synthetic tone in Hz.
const TONE_OFFSET_HZ: f64 = 1.0e6;
/// Tone amplitude (full scale = 1.0).
const TONE_AMPLITUDE: f32 = 0.05;
/// Peak amplitude of the uniform noise floor.
const NOISE_AMPLITUDE: f32 = 1e-3;

/// Tone-plus-noise sample generator.
#[derive(Debug)]
pub struct SynthSource {
    config: DeviceConfig,
    phase: f64,
    rng: StdRng,
    closed: bool,
}

impl SynthSource {
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic variant with a fixed noise seed.
    pub fn seeded(config: &DeviceConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &DeviceConfig, rng: StdRng) -> Self {
        Self {
            config: *config,
            phase: 0.0,
            rng,
            closed: false,
        }
    }
}

impl SampleSource for SynthSource {
    fn configure(&mut self, config: &DeviceConfig) -> anyhow::Result<()> {
        self.config = *config;
        log::info!(
            "Synthetic source configured: {:.3} MHz center, {:.3} MHz rate",
            config.center_frequency / 1e6,
            config.sample_rate / 1e6
        );
        Ok(())
    }

    fn read_samples(&mut self, count: usize) -> Option<Vec<Complex<f32>>> {
        if self.closed {
            return None;
        }

        let phase_step = 2.0 * std::f64::consts::PI * TONE_OFFSET_HZ / self.config.sample_rate;
        let mut samples = Vec::with_capacity(count);
        for _ in 0..count {
            #[allow(clippy::cast_possible_truncation, reason = "phase fits in f32 range")]
            let tone = Complex::new(
                TONE_AMPLITUDE * self.phase.cos() as f32,
                TONE_AMPLITUDE * self.phase.sin() as f32,
            );
            let noise = Complex::new(
                self.rng.gen_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE),
                self.rng.gen_range(-NOISE_AMPLITUDE..NOISE_AMPLITUDE),
            );
            samples.push(tone + noise);

            self.phase += phase_step;
            if self.phase > 2.0 * std::f64::consts::PI {
                self.phase -= 2.0 * std::f64::consts::PI;
            }
        }
        Some(samples)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            log::info!("Synthetic source closed");
        }
    }

    fn name(&self) -> &'static str {
        "Synthetic"
    }
}

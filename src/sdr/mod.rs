//! Sample acquisition from radio devices.
//!
//! `SampleSource` abstracts the radio: a HackRF behind the `hardware`
//! feature, or a synthetic tone-plus-noise generator for running without one.

pub mod hackrf_source;
pub mod synth_source;

use num_complex::Complex;
use serde::{Deserialize, Serialize};

pub use hackrf_source::HackRfSource;
pub use synth_source::SynthSource;

/// Radio settings applied to a source before acquisition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Center frequency in Hz
    pub center_frequency: f64,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Low noise amplifier gain in dB
    pub lna_gain: u32,
    /// Variable gain amplifier gain in dB
    pub vga_gain: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            center_frequency: 2.4e9, // 2.4 GHz ISM band
            sample_rate: 10e6,
            lna_gain: 40,
            vga_gain: 20,
        }
    }
}

/// A source of complex IQ sample buffers.
///
/// `read_samples` returning `None` means "device not ready this tick"; the
/// caller skips analysis for that tick and treats it as non-detection.
/// `close` is best-effort and safe to call more than once.
pub trait SampleSource {
    /// Apply device settings.
    fn configure(&mut self, config: &DeviceConfig) -> anyhow::Result<()>;

    /// Read exactly `count` samples, or `None` if the device has no data.
    fn read_samples(&mut self, count: usize) -> Option<Vec<Complex<f32>>>;

    /// Release the device. Idempotent.
    fn close(&mut self);

    /// Short human-readable source name for the UI.
    fn name(&self) -> &'static str;
}

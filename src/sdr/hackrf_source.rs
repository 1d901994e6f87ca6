//! HackRF sample source via SoapySDR.
//!
//! Compiled with the `hardware` feature; a stub that fails construction is
//! provided otherwise so callers can fall back to the synthetic source.

#[cfg(feature = "hardware")]
use anyhow::Context;
#[cfg(feature = "hardware")]
use num_complex::Complex;

#[cfg(feature = "hardware")]
use crate::sdr::{DeviceConfig, SampleSource};

/// Stream read timeout in microseconds. Acquisition may block up to this
/// long per read; accepted as a latency source, not mitigated.
#[cfg(feature = "hardware")]
const READ_TIMEOUT_US: i64 = 500_000;

/// HackRF device handle with an active RX stream.
#[cfg(feature = "hardware")]
pub struct HackRfSource {
    device: soapysdr::Device,
    stream: Option<soapysdr::RxStream<Complex<f32>>>,
    closed: bool,
}

#[cfg(feature = "hardware")]
impl std::fmt::Debug for HackRfSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HackRfSource")
            .field("streaming", &self.stream.is_some())
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "hardware")]
impl HackRfSource {
    /// Open the first HackRF, apply `config`, and start streaming.
    ///
    /// # Errors
    /// Returns error if no device is present or configuration fails.
    pub fn open(config: &DeviceConfig) -> anyhow::Result<Self> {
        log::info!("Opening HackRF via SoapySDR...");
        let device =
            soapysdr::Device::new("driver=hackrf").context("failed to open HackRF device")?;

        let mut source = Self {
            device,
            stream: None,
            closed: false,
        };
        source.configure(config)?;

        let mut stream = source
            .device
            .rx_stream::<Complex<f32>>(&[0])
            .context("failed to create RX stream")?;
        stream.activate(None).context("failed to activate RX stream")?;
        source.stream = Some(stream);

        log::info!("HackRF streaming");
        Ok(source)
    }
}

#[cfg(feature = "hardware")]
impl SampleSource for HackRfSource {
    fn configure(&mut self, config: &DeviceConfig) -> anyhow::Result<()> {
        use soapysdr::Direction::Rx;

        self.device
            .set_frequency(Rx, 0, config.center_frequency, "")
            .context("failed to set center frequency")?;
        self.device
            .set_sample_rate(Rx, 0, config.sample_rate)
            .context("failed to set sample rate")?;
        self.device
            .set_gain_element(Rx, 0, "LNA", f64::from(config.lna_gain))
            .context("failed to set LNA gain")?;
        self.device
            .set_gain_element(Rx, 0, "VGA", f64::from(config.vga_gain))
            .context("failed to set VGA gain")?;

        log::info!(
            "HackRF configured: {:.3} MHz center, {:.3} MHz rate, LNA {} dB, VGA {} dB",
            config.center_frequency / 1e6,
            config.sample_rate / 1e6,
            config.lna_gain,
            config.vga_gain
        );
        Ok(())
    }

    fn read_samples(&mut self, count: usize) -> Option<Vec<Complex<f32>>> {
        let stream = self.stream.as_mut()?;
        let mut buf = vec![Complex::new(0.0f32, 0.0); count];
        let mut filled = 0;

        while filled < count {
            match stream.read(&mut [&mut buf[filled..]], READ_TIMEOUT_US) {
                Ok(0) => {
                    log::debug!("HackRF returned no samples this tick");
                    return None;
                }
                Ok(n) => filled += n,
                Err(e) => {
                    log::debug!("HackRF read failed: {e}");
                    return None;
                }
            }
        }
        Some(buf)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.deactivate(None) {
                log::warn!("failed to deactivate RX stream: {e}");
            }
        }
        log::info!("HackRF device released");
    }

    fn name(&self) -> &'static str {
        "HackRF"
    }
}

#[cfg(feature = "hardware")]
impl Drop for HackRfSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// Stub when the `hardware` feature is disabled.
#[cfg(not(feature = "hardware"))]
#[derive(Debug)]
pub struct HackRfSource;

#[cfg(not(feature = "hardware"))]
impl HackRfSource {
    /// Always fails; enable the `hardware` feature for HackRF support.
    pub fn open(_config: &crate::sdr::DeviceConfig) -> anyhow::Result<Self> {
        anyhow::bail!("HackRF support not compiled (enable the 'hardware' feature)")
    }
}

#[cfg(not(feature = "hardware"))]
impl crate::sdr::SampleSource for HackRfSource {
    fn configure(&mut self, _config: &crate::sdr::DeviceConfig) -> anyhow::Result<()> {
        Ok(())
    }

    fn read_samples(&mut self, _count: usize) -> Option<Vec<num_complex::Complex<f32>>> {
        None
    }

    fn close(&mut self) {}

    fn name(&self) -> &'static str {
        "HackRF (unavailable)"
    }
}

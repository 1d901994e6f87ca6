//! Application configuration management.
//!
//! Persists user preferences (threshold, detection band, device settings,
//! alert sound path) in TOML via confy.

use serde::{Deserialize, Serialize};

use crate::sdr::DeviceConfig;

const APP_NAME: &str = "dronewatch";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Radio device settings
    #[serde(default)]
    pub device: DeviceConfig,

    /// Samples acquired per tick
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Welch segment length
    #[serde(default = "default_segment_len")]
    pub segment_len: usize,

    /// Detection threshold in dB, [-120, 0]
    #[serde(default = "default_threshold_db")]
    pub threshold_db: i32,

    /// Lower edge of the detection band in baseband Hz
    #[serde(default)]
    pub band_min_hz: f64,

    /// Upper edge of the detection band in baseband Hz
    #[serde(default = "default_band_max_hz")]
    pub band_max_hz: f64,

    /// Path to the alert sound WAV
    #[serde(default = "default_alert_sound")]
    pub alert_sound: String,
}

fn default_buffer_size() -> usize {
    8192
}

fn default_segment_len() -> usize {
    8192
}

fn default_threshold_db() -> i32 {
    -50
}

fn default_band_max_hz() -> f64 {
    // Nyquist at the fixed 10 MHz sample rate
    5e6
}

fn default_alert_sound() -> String {
    String::from("alert.wav")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            buffer_size: default_buffer_size(),
            segment_len: default_segment_len(),
            threshold_db: default_threshold_db(),
            band_min_hz: 0.0,
            band_max_hz: default_band_max_hz(),
            alert_sound: default_alert_sound(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, "config")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, "config", self)
    }

    /// Nyquist frequency for the configured sample rate
    pub fn nyquist_hz(&self) -> f64 {
        self.device.sample_rate / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.buffer_size, 8192);
        assert_eq!(config.segment_len, 8192);
        assert_eq!(config.threshold_db, -50);
        assert!((config.device.sample_rate - 10e6).abs() < f64::EPSILON);
        assert!((config.device.center_frequency - 2.4e9).abs() < f64::EPSILON);
        assert_eq!(config.device.lna_gain, 40);
        assert_eq!(config.device.vga_gain, 20);
        assert!((config.nyquist_hz() - 5e6).abs() < f64::EPSILON);
    }

    #[test]
    fn band_defaults_cover_full_baseband() {
        let config = AppConfig::default();
        assert!(config.band_min_hz.abs() < f64::EPSILON);
        assert!((config.band_max_hz - config.nyquist_hz()).abs() < f64::EPSILON);
    }
}

//! Application controller: owns the device, runs the tick loop, draws the UI.

use std::path::Path;
use std::time::{Duration, Instant};

use eframe::egui;

use crate::audio::AlertPlayer;
use crate::config::AppConfig;
use crate::detect::{self, DetectionState};
use crate::dsp::{Spectrum, SpectrumAnalyzer};
use crate::sdr::{DeviceConfig, SampleSource};
use crate::ui::spectrum_plot;

/// Tick interval for the acquire → analyze → render loop (~30 Hz).
const TICK_INTERVAL: Duration = Duration::from_millis(33);

pub struct DroneWatchApp {
    source: Box<dyn SampleSource>,
    analyzer: SpectrumAnalyzer,
    alert: Option<AlertPlayer>,
    config: AppConfig,
    /// Runtime device state. Starts as `config.device` but may carry a
    /// session-only command line override; only `config.device` is persisted.
    device: DeviceConfig,
    /// Most recent spectrum; kept on screen across ticks with no data
    spectrum: Option<Spectrum>,
    detection: DetectionState,
    max_power_db: f64,
    last_tick: Instant,
}

impl DroneWatchApp {
    pub fn new(config: AppConfig, device: DeviceConfig, source: Box<dyn SampleSource>) -> Self {
        let alert = match AlertPlayer::load(Path::new(&config.alert_sound)) {
            Ok(player) => Some(player),
            Err(e) => {
                log::warn!("alerts will be visual only: {e:#}");
                None
            }
        };

        let analyzer = SpectrumAnalyzer::new(device.sample_rate, config.segment_len);
        log::info!(
            "DroneWatch started: source={}, buffer={}, threshold={} dB",
            source.name(),
            config.buffer_size,
            config.threshold_db
        );

        Self {
            source,
            analyzer,
            alert,
            config,
            device,
            spectrum: None,
            detection: DetectionState::NotDetected,
            max_power_db: f64::NEG_INFINITY,
            last_tick: Instant::now(),
        }
    }

    /// One tick: acquire → analyze → compare. No data means non-detection.
    fn tick(&mut self) {
        self.max_power_db = match self.source.read_samples(self.config.buffer_size) {
            Some(samples) => {
                let spectrum = self.analyzer.analyze(&samples);
                let max =
                    spectrum.max_power_in_band(self.config.band_min_hz, self.config.band_max_hz);
                log::debug!(
                    "tick: max {:.1} dB overall, {max:.1} dB in band",
                    spectrum.max_power()
                );
                self.spectrum = Some(spectrum);
                max
            }
            None => {
                log::debug!("no samples from {} this tick", self.source.name());
                f64::NEG_INFINITY
            }
        };

        let next = detect::evaluate(self.max_power_db, f64::from(self.config.threshold_db));
        self.transition(next);
    }

    /// Apply a detection state, sounding or silencing the alert on edges.
    fn transition(&mut self, next: DetectionState) {
        if next == self.detection {
            return;
        }
        match next {
            DetectionState::Detected => {
                log::info!(
                    "signal detected: {:.1} dB above {} dB threshold band [{:.2}, {:.2}] MHz",
                    self.max_power_db - f64::from(self.config.threshold_db),
                    self.config.threshold_db,
                    self.config.band_min_hz / 1e6,
                    self.config.band_max_hz / 1e6
                );
                if let Some(alert) = &mut self.alert {
                    alert.start();
                }
            }
            DetectionState::NotDetected => {
                log::info!("signal cleared");
                if let Some(alert) = &mut self.alert {
                    alert.stop();
                }
            }
        }
        self.detection = next;
    }

    /// Retune the device and record the new frequency as a preference.
    fn retune(&mut self, frequency_hz: f64) {
        self.device.center_frequency = frequency_hz;
        self.config.device.center_frequency = frequency_hz;
        if let Err(e) = self.source.configure(&self.device) {
            log::error!("failed to retune device: {e:#}");
        }
    }

    fn draw_controls(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Center frequency:");
            let mut freq_mhz = self.device.center_frequency / 1e6;
            let response = ui.add(
                egui::DragValue::new(&mut freq_mhz)
                    .speed(1.0)
                    .range(1.0..=6000.0)
                    .suffix(" MHz"),
            );
            if response.changed() {
                self.retune(freq_mhz * 1e6);
            }

            if ui.button("2.4 GHz").clicked() {
                self.retune(2.4e9);
            }

            ui.separator();
            ui.label(format!("Source: {}", self.source.name()));
        });

        ui.add(
            egui::Slider::new(&mut self.config.threshold_db, -120..=0)
                .suffix(" dB")
                .text("Power threshold"),
        );

        let nyquist_mhz = self.config.nyquist_hz() / 1e6;

        let mut band_min_mhz = self.config.band_min_hz / 1e6;
        if ui
            .add(
                egui::Slider::new(&mut band_min_mhz, 0.0..=nyquist_mhz)
                    .suffix(" MHz")
                    .text("Band min"),
            )
            .changed()
        {
            self.config.band_min_hz = (band_min_mhz * 1e6).min(self.config.band_max_hz);
        }

        let mut band_max_mhz = self.config.band_max_hz / 1e6;
        if ui
            .add(
                egui::Slider::new(&mut band_max_mhz, 0.0..=nyquist_mhz)
                    .suffix(" MHz")
                    .text("Band max"),
            )
            .changed()
        {
            self.config.band_max_hz = (band_max_mhz * 1e6).max(self.config.band_min_hz);
        }
    }

    fn draw_status(&self, ui: &mut egui::Ui) {
        let color = if self.detection.is_detected() {
            egui::Color32::from_rgb(80, 160, 255)
        } else {
            egui::Color32::from_rgb(100, 220, 100)
        };
        ui.label(
            egui::RichText::new(format!("Signal status: {}", self.detection))
                .size(26.0)
                .color(color)
                .strong(),
        );

        let max = if self.max_power_db.is_finite() {
            format!("{:.1} dB", self.max_power_db)
        } else {
            String::from("no signal")
        };
        ui.label(
            egui::RichText::new(format!("Max in-band power: {max}"))
                .color(egui::Color32::from_rgb(180, 180, 180))
                .monospace(),
        );
    }
}

impl eframe::App for DroneWatchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Fixed-interval scheduling: ticks serialize, never overlap.
        if self.last_tick.elapsed() >= TICK_INTERVAL {
            self.tick();
            self.last_tick = Instant::now();
        }
        ctx.request_repaint_after(TICK_INTERVAL);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("DroneWatch");
            ui.add_space(4.0);

            self.draw_controls(ui);
            ui.separator();
            self.draw_status(ui);

            if ui.button("Check now").clicked() {
                self.tick();
                self.last_tick = Instant::now();
            }

            ui.separator();
            spectrum_plot::draw(
                ui,
                self.spectrum.as_ref(),
                f64::from(self.config.threshold_db),
                (self.config.band_min_hz, self.config.band_max_hz),
            );
        });
    }

    /// Persist preferences only when the windowed app actually exits, so
    /// constructing and dropping an app elsewhere never writes the config.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Err(e) = self.config.save() {
            log::warn!("failed to save config: {e}");
        }
    }
}

impl Drop for DroneWatchApp {
    fn drop(&mut self) {
        // Scoped shutdown: silence the alert, release the device exactly
        // once. Failures are logged, not surfaced.
        if let Some(alert) = &mut self.alert {
            alert.stop();
        }
        self.source.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdr::{DeviceConfig, SampleSource, SynthSource};

    fn test_app(source: Box<dyn SampleSource>) -> DroneWatchApp {
        let config = AppConfig {
            alert_sound: String::from("/nonexistent/alert.wav"),
            ..AppConfig::default()
        };
        let device = config.device;
        DroneWatchApp::new(config, device, source)
    }

    #[test]
    fn closed_source_yields_non_detection() {
        let mut source = SynthSource::seeded(&DeviceConfig::default(), 1);
        source.close();

        let mut app = test_app(Box::new(source));
        app.config.threshold_db = -120;
        app.tick();

        assert_eq!(app.detection, DetectionState::NotDetected);
        assert_eq!(app.max_power_db, f64::NEG_INFINITY);
        assert!(app.spectrum.is_none());
    }

    #[test]
    fn synthetic_tone_trips_a_low_threshold() {
        let source = SynthSource::seeded(&DeviceConfig::default(), 2);
        let mut app = test_app(Box::new(source));
        app.config.threshold_db = -120;
        app.tick();

        assert_eq!(app.detection, DetectionState::Detected);
        assert!(app.spectrum.is_some());
    }

    #[test]
    fn impossible_threshold_never_detects() {
        let source = SynthSource::seeded(&DeviceConfig::default(), 3);
        let mut app = test_app(Box::new(source));
        app.config.threshold_db = 0;
        app.tick();

        assert_eq!(app.detection, DetectionState::NotDetected);
    }

    #[test]
    fn band_excluding_tone_does_not_detect() {
        // Synthetic tone sits at 1 MHz baseband; restrict the band above it.
        let source = SynthSource::seeded(&DeviceConfig::default(), 4);
        let mut app = test_app(Box::new(source));
        app.config.band_min_hz = 3e6;
        app.config.band_max_hz = 5e6;
        app.config.threshold_db = -60;
        app.tick();

        assert_eq!(app.detection, DetectionState::NotDetected);
    }

    #[test]
    fn detection_state_recovers_when_signal_drops() {
        let source = SynthSource::seeded(&DeviceConfig::default(), 5);
        let mut app = test_app(Box::new(source));
        app.config.threshold_db = -120;
        app.tick();
        assert_eq!(app.detection, DetectionState::Detected);

        app.source.close();
        app.tick();
        assert_eq!(app.detection, DetectionState::NotDetected);
    }

    #[test]
    fn dropping_the_app_does_not_write_preferences() {
        let path = confy::get_configuration_file_path("dronewatch", "config").unwrap();
        let before = std::fs::read(&path).ok();

        let mut app = test_app(Box::new(SynthSource::seeded(&DeviceConfig::default(), 6)));
        app.config.threshold_db = -33;
        drop(app);

        assert_eq!(std::fs::read(&path).ok(), before);
    }

    #[test]
    fn frequency_override_stays_out_of_preferences() {
        let config = AppConfig {
            alert_sound: String::from("/nonexistent/alert.wav"),
            ..AppConfig::default()
        };
        let device = DeviceConfig {
            center_frequency: 5.8e9,
            ..config.device
        };
        let app = DroneWatchApp::new(config, device, Box::new(SynthSource::seeded(&device, 7)));

        assert!((app.device.center_frequency - 5.8e9).abs() < f64::EPSILON);
        assert!((app.config.device.center_frequency - 2.4e9).abs() < f64::EPSILON);
    }
}

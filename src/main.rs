mod app;
mod audio;
mod config;
mod detect;
mod dsp;
mod sdr;
mod ui;

use clap::Parser;
use eframe::egui;

use app::DroneWatchApp;
use config::AppConfig;
use sdr::{DeviceConfig, HackRfSource, SampleSource, SynthSource};

/// SDR spectrum monitor with band-limited threshold alerting.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Use the synthetic signal source instead of SDR hardware
    #[arg(long)]
    demo: bool,

    /// Center frequency override in MHz
    #[arg(long)]
    frequency_mhz: Option<f64>,
}

fn open_source(demo: bool, device: &DeviceConfig) -> Box<dyn SampleSource> {
    if demo {
        log::info!("Using synthetic signal source");
        return Box::new(SynthSource::new(device));
    }
    match HackRfSource::open(device) {
        Ok(source) => Box::new(source),
        Err(e) => {
            log::warn!("HackRF unavailable ({e:#}), falling back to synthetic source");
            Box::new(SynthSource::new(device))
        }
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::init();
    let args = Args::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        log::warn!("failed to load config ({e}), using defaults");
        AppConfig::default()
    });

    // Session-only override; the saved preference is left alone.
    let mut device = config.device;
    if let Some(mhz) = args.frequency_mhz {
        log::info!("center frequency override: {mhz:.3} MHz");
        device.center_frequency = mhz * 1e6;
    }

    let source = open_source(args.demo, &device);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 700.0])
            .with_title("DroneWatch"),
        ..Default::default()
    };

    eframe::run_native(
        "DroneWatch",
        options,
        Box::new(move |_cc| Ok(Box::new(DroneWatchApp::new(config, device, source)))),
    )
}

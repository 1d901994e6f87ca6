//! UI components for DroneWatch.

pub mod spectrum_plot;

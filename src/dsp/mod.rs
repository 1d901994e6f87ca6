//! Signal processing: Welch power spectra and the spectrum analyzer.

pub mod spectrum;
pub mod welch;

pub use spectrum::{Spectrum, SpectrumAnalyzer};

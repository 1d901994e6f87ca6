//! Spectrum type and the sample-buffer-to-spectrum analyzer.

use num_complex::Complex;
use rustfft::FftPlanner;

use crate::dsp::welch::welch;

/// One-sided power spectrum in dB.
///
/// Frequencies are non-negative and ascending. Power values may be `-inf` or
/// NaN where the underlying linear power was zero or negative; callers treat
/// those bins as "no usable signal".
#[derive(Debug, Clone, Default)]
pub struct Spectrum {
    freqs: Vec<f64>,
    power_db: Vec<f64>,
}

impl Spectrum {
    pub fn is_empty(&self) -> bool {
        self.freqs.is_empty()
    }

    #[allow(dead_code, reason = "raw accessor, used in tests")]
    pub fn freqs(&self) -> &[f64] {
        &self.freqs
    }

    #[allow(dead_code, reason = "raw accessor, used in tests")]
    pub fn power_db(&self) -> &[f64] {
        &self.power_db
    }

    /// `(frequency, power_db)` pairs for plotting.
    pub fn points(&self) -> impl Iterator<Item = [f64; 2]> + '_ {
        self.freqs
            .iter()
            .zip(&self.power_db)
            .map(|(&f, &p)| [f, p])
    }

    /// Maximum power over all bins. NaN bins are skipped; an empty spectrum
    /// reports `-inf` (guaranteed non-detection).
    pub fn max_power(&self) -> f64 {
        self.power_db.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Maximum power over bins whose frequency lies in `[min_hz, max_hz]`.
    pub fn max_power_in_band(&self, min_hz: f64, max_hz: f64) -> f64 {
        self.freqs
            .iter()
            .zip(&self.power_db)
            .filter(|(&f, _)| f >= min_hz && f <= max_hz)
            .map(|(_, &p)| p)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Maps sample buffers to power spectra via Welch's method.
pub struct SpectrumAnalyzer {
    sample_rate: f64,
    segment_len: usize,
    planner: FftPlanner<f64>,
}

impl std::fmt::Debug for SpectrumAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpectrumAnalyzer")
            .field("sample_rate", &self.sample_rate)
            .field("segment_len", &self.segment_len)
            .finish_non_exhaustive()
    }
}

impl SpectrumAnalyzer {
    pub fn new(sample_rate: f64, segment_len: usize) -> Self {
        Self {
            sample_rate,
            segment_len,
            planner: FftPlanner::new(),
        }
    }

    /// Analyze a complex IQ buffer.
    ///
    /// Power is estimated independently on the real and imaginary components,
    /// summed, and converted as `10*log10(power/2)`.
    pub fn analyze(&mut self, samples: &[Complex<f32>]) -> Spectrum {
        let re: Vec<f64> = samples.iter().map(|s| f64::from(s.re)).collect();
        let im: Vec<f64> = samples.iter().map(|s| f64::from(s.im)).collect();

        let (freqs, p_re) = welch(&mut self.planner, &re, self.sample_rate, self.segment_len);
        let (_, p_im) = welch(&mut self.planner, &im, self.sample_rate, self.segment_len);

        let power_db = p_re
            .iter()
            .zip(&p_im)
            .map(|(&a, &b)| 10.0 * ((a + b) / 2.0).log10())
            .collect();

        Spectrum { freqs, power_db }
    }

    /// Analyze a real-valued buffer, converting as `10*log10(power)`.
    pub fn analyze_real(&mut self, samples: &[f32]) -> Spectrum {
        let signal: Vec<f64> = samples.iter().map(|&s| f64::from(s)).collect();
        let (freqs, power) = welch(&mut self.planner, &signal, self.sample_rate, self.segment_len);
        let power_db = power.iter().map(|&p| 10.0 * p.log10()).collect();
        Spectrum { freqs, power_db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[allow(clippy::cast_precision_loss)]
    fn real_tone(n: usize, bin: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * bin as f32 * i as f32 / n as f32).sin())
            .collect()
    }

    #[test]
    fn real_tone_peak_lands_on_tone_frequency() {
        let n = 8192;
        let bin = 820; // ~1 MHz at 10 MHz sample rate
        let mut analyzer = SpectrumAnalyzer::new(10e6, n);
        let spectrum = analyzer.analyze_real(&real_tone(n, bin));

        let peak = spectrum
            .points()
            .max_by(|a, b| a[1].total_cmp(&b[1]))
            .unwrap();
        let expected_hz = 820.0 * 10e6 / 8192.0;
        assert!((peak[0] - expected_hz).abs() < 10e6 / 8192.0 / 2.0);
    }

    #[test]
    fn complex_path_matches_real_path_up_to_halving() {
        // A zero imaginary part contributes zero power, so the complex path
        // reads exactly 10*log10(2) below the real path (the /2 averages the
        // two component spectra).
        let n = 2048;
        let tone = real_tone(n, 200);
        let complex: Vec<Complex<f32>> = tone.iter().map(|&s| Complex::new(s, 0.0)).collect();

        let mut analyzer = SpectrumAnalyzer::new(10e6, n);
        let from_real = analyzer.analyze_real(&tone);
        let from_complex = analyzer.analyze(&complex);

        let offset = 10.0 * 2.0f64.log10();
        for (r, c) in from_real.power_db().iter().zip(from_complex.power_db()) {
            if r.is_finite() && c.is_finite() {
                assert!((r - c - offset).abs() < 1e-6, "r={r} c={c}");
            }
        }
    }

    #[test]
    fn spectrum_frequencies_are_nonnegative_ascending() {
        let mut analyzer = SpectrumAnalyzer::new(10e6, 1024);
        let spectrum = analyzer.analyze_real(&real_tone(4096, 37));
        assert!(spectrum.freqs()[0] >= 0.0);
        assert!(spectrum.freqs().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn zero_buffer_reports_negative_infinity() {
        let mut analyzer = SpectrumAnalyzer::new(10e6, 512);
        let spectrum = analyzer.analyze(&vec![Complex::new(0.0, 0.0); 512]);
        assert!(spectrum.power_db().iter().all(|p| *p == f64::NEG_INFINITY));
        assert_eq!(spectrum.max_power(), f64::NEG_INFINITY);
    }

    #[test]
    fn band_restricted_max_ignores_out_of_band_peaks() {
        let n = 4096;
        let bin = 1000;
        let mut analyzer = SpectrumAnalyzer::new(10e6, n);
        let spectrum = analyzer.analyze_real(&real_tone(n, bin));

        let tone_hz = 1000.0 * 10e6 / 4096.0;
        let below = spectrum.max_power_in_band(0.0, tone_hz - 100e3);
        let around = spectrum.max_power_in_band(tone_hz - 100e3, tone_hz + 100e3);
        assert!(around > below + 20.0, "around={around} below={below}");
    }

    #[test]
    fn empty_spectrum_max_is_negative_infinity() {
        let spectrum = Spectrum::default();
        assert_eq!(spectrum.max_power(), f64::NEG_INFINITY);
        assert_eq!(spectrum.max_power_in_band(0.0, 1e6), f64::NEG_INFINITY);
    }
}

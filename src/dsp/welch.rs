//! Welch averaged-periodogram power spectrum estimation.
//!
//! Matches scipy's `welch(..., scaling="spectrum")`: periodic Hann window,
//! 50% segment overlap, per-segment mean removal, one-sided output.

use num_complex::Complex;
use rustfft::FftPlanner;

/// Periodic Hann window of length `n`.
#[allow(clippy::cast_precision_loss, reason = "window index to float")]
fn hann_window(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f64::consts::PI * i as f64 / n as f64).cos()))
        .collect()
}

/// Estimate the one-sided power spectrum of a real-valued signal.
///
/// # Arguments
/// * `planner` - FFT planner, reused across calls
/// * `signal` - Real input samples
/// * `sample_rate` - Sample rate in Hz
/// * `segment_len` - Welch segment length (clamped to the signal length)
///
/// # Returns
/// `(frequencies, power)` with frequencies in Hz, non-negative and ascending,
/// and power in linear units ("spectrum" scaling). Empty input yields empty
/// vectors.
pub fn welch(
    planner: &mut FftPlanner<f64>,
    signal: &[f64],
    sample_rate: f64,
    segment_len: usize,
) -> (Vec<f64>, Vec<f64>) {
    if signal.is_empty() || segment_len == 0 {
        return (Vec::new(), Vec::new());
    }

    let nperseg = if segment_len > signal.len() {
        log::warn!(
            "segment length {} exceeds buffer length {}, clamping",
            segment_len,
            signal.len()
        );
        signal.len()
    } else {
        segment_len
    };

    let window = hann_window(nperseg);
    let win_sum: f64 = window.iter().sum();
    let scale = 1.0 / (win_sum * win_sum);
    let step = nperseg - nperseg / 2;
    let n_bins = nperseg / 2 + 1;

    let fft = planner.plan_fft_forward(nperseg);
    let mut power = vec![0.0f64; n_bins];
    let mut buf = vec![Complex::new(0.0f64, 0.0); nperseg];
    let mut n_segments = 0usize;

    let mut start = 0;
    while start + nperseg <= signal.len() {
        let segment = &signal[start..start + nperseg];

        // Constant detrend: remove the segment mean before windowing.
        #[allow(clippy::cast_precision_loss, reason = "segment length to float")]
        let mean = segment.iter().sum::<f64>() / nperseg as f64;
        for ((out, &s), &w) in buf.iter_mut().zip(segment).zip(&window) {
            *out = Complex::new((s - mean) * w, 0.0);
        }

        fft.process(&mut buf);
        for (acc, value) in power.iter_mut().zip(&buf) {
            *acc += value.norm_sqr();
        }

        n_segments += 1;
        start += step;
    }

    #[allow(clippy::cast_precision_loss, reason = "segment count to float")]
    let seg_norm = n_segments as f64;
    for (k, value) in power.iter_mut().enumerate() {
        *value *= scale / seg_norm;
        // One-sided doubling, except DC and (for even lengths) Nyquist.
        let is_nyquist = nperseg % 2 == 0 && k == n_bins - 1;
        if k != 0 && !is_nyquist {
            *value *= 2.0;
        }
    }

    #[allow(clippy::cast_precision_loss, reason = "bin index to float")]
    let freqs = (0..n_bins)
        .map(|k| k as f64 * sample_rate / nperseg as f64)
        .collect();

    (freqs, power)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[allow(clippy::cast_precision_loss)]
    fn tone(n: usize, bin: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * bin as f64 * i as f64 / n as f64).sin())
            .collect()
    }

    #[test]
    fn tone_peaks_at_its_bin() {
        let n = 1024;
        let target = 100;
        let mut planner = FftPlanner::new();
        let (freqs, power) = welch(&mut planner, &tone(n, target), 1000.0, n);

        let peak = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert_eq!(peak, target);
        assert!((freqs[peak] - 100.0 * 1000.0 / 1024.0).abs() < 1e-9);
    }

    #[test]
    fn frequencies_are_nonnegative_and_ascending() {
        let mut planner = FftPlanner::new();
        let (freqs, _) = welch(&mut planner, &tone(512, 10), 10e6, 256);
        assert!(freqs[0] >= 0.0);
        assert!(freqs.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn segment_longer_than_buffer_is_clamped() {
        let mut planner = FftPlanner::new();
        let (freqs, power) = welch(&mut planner, &tone(256, 8), 1000.0, 8192);
        assert_eq!(freqs.len(), 256 / 2 + 1);
        assert_eq!(freqs.len(), power.len());
    }

    #[test]
    fn empty_input_gives_empty_spectrum() {
        let mut planner = FftPlanner::new();
        let (freqs, power) = welch(&mut planner, &[], 1000.0, 1024);
        assert!(freqs.is_empty());
        assert!(power.is_empty());
    }

    #[test]
    fn zero_signal_power_is_zero() {
        let mut planner = FftPlanner::new();
        let (_, power) = welch(&mut planner, &vec![0.0; 512], 1000.0, 512);
        assert!(power.iter().all(|&p| p == 0.0));
    }
}

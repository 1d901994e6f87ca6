//! Live spectrum plot: frequency (Hz) vs amplitude (dB).

use egui::Color32;
use egui_plot::{HLine, Line, Plot, PlotPoints, VLine};

use crate::dsp::Spectrum;

/// Fixed display range matching the detector's threshold range.
pub const PLOT_MIN_DB: f64 = -120.0;
pub const PLOT_MAX_DB: f64 = 0.0;

/// Draw the spectrum with the threshold line and the detection band edges.
///
/// `spectrum` may be `None` before the first successful acquisition; the
/// axes and reference lines are still drawn so the display doesn't jump.
pub fn draw(
    ui: &mut egui::Ui,
    spectrum: Option<&Spectrum>,
    threshold_db: f64,
    band: (f64, f64),
) {
    Plot::new("spectrum_plot")
        .include_y(PLOT_MIN_DB)
        .include_y(PLOT_MAX_DB)
        .x_axis_label("Frequency (Hz)")
        .y_axis_label("Amplitude (dB)")
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            if let Some(spectrum) = spectrum.filter(|s| !s.is_empty()) {
                // Non-finite bins (log of zero power) render at the plot floor.
                let points: Vec<[f64; 2]> = spectrum
                    .points()
                    .map(|[f, p]| [f, if p.is_finite() { p } else { PLOT_MIN_DB }])
                    .collect();
                plot_ui.line(
                    Line::new("spectrum", PlotPoints::from(points))
                        .color(Color32::WHITE)
                        .width(2.0),
                );
            }

            plot_ui.hline(
                HLine::new("threshold", threshold_db).color(Color32::from_rgb(255, 150, 50)),
            );
            plot_ui.vline(VLine::new("band min", band.0).color(Color32::from_rgb(100, 200, 100)));
            plot_ui.vline(VLine::new("band max", band.1).color(Color32::from_rgb(100, 200, 100)));
        });
}

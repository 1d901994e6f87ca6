//! Threshold detection.
//!
//! Stateless: each tick compares the maximum in-band power against the
//! threshold. No debounce and no minimum dwell time; a known limitation
//! carried over deliberately.

/// Detection state for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    Detected,
    NotDetected,
}

impl DetectionState {
    pub fn is_detected(self) -> bool {
        matches!(self, Self::Detected)
    }
}

impl std::fmt::Display for DetectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detected => write!(f, "Detected"),
            Self::NotDetected => write!(f, "Not Detected"),
        }
    }
}

/// Strict greater-than comparison. `-inf` and NaN never detect, so a missing
/// sample buffer (reported as `-inf` max power) is guaranteed non-detection.
pub fn evaluate(max_power_db: f64, threshold_db: f64) -> DetectionState {
    if max_power_db > threshold_db {
        DetectionState::Detected
    } else {
        DetectionState::NotDetected
    }
}

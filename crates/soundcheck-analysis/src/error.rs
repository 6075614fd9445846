//! Error types for spectral analysis setup.

use thiserror::Error;

/// Errors raised when an analyzer is configured with unusable settings.
///
/// All of these are caught at construction; nothing on the tick path
/// returns an `AnalysisError`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Transform size too small to hold a single non-DC bin.
    #[error("transform size must be at least 2, got {0}")]
    InvalidSize(usize),

    /// Sample rate or frame rate is zero, negative or not finite.
    #[error("{what} must be positive and finite, got {value}")]
    InvalidRate {
        /// Which rate was rejected.
        what: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Frequency band is empty, inverted or above Nyquist.
    #[error("invalid band {low} Hz .. {high} Hz at sample rate {sample_rate} Hz")]
    InvalidBand {
        /// Low cutoff.
        low: f64,
        /// High cutoff.
        high: f64,
        /// Sample rate the band was checked against.
        sample_rate: f64,
    },

    /// Smoothing factor outside `(0, 1]`.
    #[error("smoothing factor must be in (0, 1], got {0}")]
    InvalidSmoothing(f64),

    /// Chart has no columns or no rows.
    #[error("chart must have non-zero size, got {width}x{height} with {points_per_pixel} points per pixel")]
    InvalidChart {
        /// Chart width in pixels.
        width: usize,
        /// Chart height in pixels.
        height: usize,
        /// Slots per pixel column.
        points_per_pixel: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            AnalysisError::InvalidSize(1).to_string(),
            "transform size must be at least 2, got 1"
        );
        let err = AnalysisError::InvalidRate {
            what: "frame rate",
            value: 0.0,
        };
        assert_eq!(err.to_string(), "frame rate must be positive and finite, got 0");
        let err = AnalysisError::InvalidBand {
            low: 100.0,
            high: 50.0,
            sample_rate: 44100.0,
        };
        assert!(err.to_string().contains("100 Hz .. 50 Hz"));
    }
}

//! Error types for propagation predictions

use thiserror::Error;

/// Result type for propagation predictions
pub type PredictionResult<T> = Result<T, PredictionError>;

/// Errors that can occur during a prediction.
///
/// Inputs that are merely outside the validated range of the empirical
/// curves do not error; they produce a best-effort result with a warning
/// bit set. Only nonsensical inputs and internal invariant violations
/// are fatal.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// A terminal height is negative
    #[error("terminal height must be non-negative, got {h_m} m")]
    InvalidTerminalHeight {
        /// The offending height, in meters
        h_m: f64,
    },

    /// Frequency is zero or negative
    #[error("frequency must be positive, got {f_mhz} MHz")]
    InvalidFrequency {
        /// The offending frequency, in MHz
        f_mhz: f64,
    },

    /// Path distance is negative
    #[error("path distance must be non-negative, got {d_km} km")]
    InvalidDistance {
        /// The offending distance, in km
        d_km: f64,
    },

    /// Time availability is outside (0, 1) exclusive
    #[error("time availability must lie in (0, 1) exclusive, got {fraction}")]
    InvalidTimeAvailability {
        /// The offending fraction
        fraction: f64,
    },

    /// An input is NaN or infinite
    #[error("inputs must be finite")]
    NonFiniteInput,

    /// The reference atmosphere was queried outside its valid height range
    #[error("reference atmosphere error: {0}")]
    Atmosphere(#[from] p835::HeightError),

    /// The two terminals were solved against different effective earth
    /// radii. This is an internal defect, not a user input error.
    #[error(
        "effective earth radius mismatch between terminals: {a_e_low_km} km vs {a_e_high_km} km"
    )]
    GeometryInconsistency {
        /// Radius recorded by the low terminal, in km
        a_e_low_km: f64,
        /// Radius recorded by the high terminal, in km
        a_e_high_km: f64,
    },
}

//! Type definitions for prediction inputs, results and diagnostic geometry.

/// Polarization of the radio signal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(i32)]
pub enum Polarization {
    /// Horizontal polarization
    Horizontal = 0,
    /// Vertical polarization
    Vertical = 1,
}

/// Mode of propagation principally responsible for the predicted loss
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropagationMode {
    /// No mode determined (only on degenerate inputs)
    #[default]
    NotSet,
    /// Line of sight propagation
    LineOfSight,
    /// Smooth earth diffraction
    Diffraction,
    /// Tropospheric scatter
    Troposcatter,
}

/// Warning flags accumulated during a prediction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Warnings {
    bits: i32,
}

impl Warnings {
    /// The transhorizon search ran out of sample points; the result in
    /// the diffraction/troposcatter region is the diffraction line alone.
    pub const TRANSHORIZON_BLEND_REGION: i32 = 0x01;
    /// Low terminal height was outside the validated range and was limited.
    pub const LOW_TERMINAL_HEIGHT: i32 = 0x02;
    /// High terminal height was outside the validated range and was limited.
    pub const HIGH_TERMINAL_HEIGHT: i32 = 0x04;
    /// Frequency is outside the band the empirical curves were fitted for.
    pub const FREQUENCY_OUT_OF_BAND: i32 = 0x08;
    /// Time availability was outside [1, 99] percent and was clamped.
    pub const TIME_PERCENT_CLAMPED: i32 = 0x10;
    /// An iterative ray/grazing-angle solution did not converge and a
    /// geometric estimate was substituted.
    pub const RAY_TRACE_FALLBACK: i32 = 0x20;

    /// Create warnings from raw bits
    pub fn from_bits(bits: i32) -> Self {
        Self { bits }
    }

    /// Get the raw warning bits
    pub fn bits(&self) -> i32 {
        self.bits
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        self.bits != 0
    }

    /// Warning: transhorizon search exhausted, blended region uncertain
    pub fn transhorizon_blend_region(&self) -> bool {
        self.bits & Self::TRANSHORIZON_BLEND_REGION != 0
    }

    /// Warning: low terminal height limited internally
    pub fn low_terminal_height_limited(&self) -> bool {
        self.bits & Self::LOW_TERMINAL_HEIGHT != 0
    }

    /// Warning: high terminal height limited internally
    pub fn high_terminal_height_limited(&self) -> bool {
        self.bits & Self::HIGH_TERMINAL_HEIGHT != 0
    }

    /// Warning: frequency outside the validated band
    pub fn frequency_out_of_band(&self) -> bool {
        self.bits & Self::FREQUENCY_OUT_OF_BAND != 0
    }

    /// Warning: time availability clamped to the supported range
    pub fn time_percent_clamped(&self) -> bool {
        self.bits & Self::TIME_PERCENT_CLAMPED != 0
    }

    /// Warning: iterative ray solution replaced by a geometric estimate
    pub fn ray_trace_fallback(&self) -> bool {
        self.bits & Self::RAY_TRACE_FALLBACK != 0
    }

    pub(crate) fn set(&mut self, bits: i32) {
        self.bits |= bits;
    }
}

/// Per-terminal geometry solved against the reference atmosphere.
///
/// Computed once per call and immutable afterward.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Terminal {
    /// Real terminal height above the smooth earth, in km
    pub h_km: f64,
    /// Effective height above the effective-earth reference surface, in km
    pub h_e_km: f64,
    /// Difference between real and effective height, in km
    pub delta_h_km: f64,
    /// Arc distance to the terminal's smooth-earth horizon, in km
    pub d_km: f64,
    /// Ray length from the terminal to its horizon point, in km
    pub a_km: f64,
    /// Central angle between the terminal and its horizon point, in radians
    pub phi_rad: f64,
    /// Incidence angle of the horizon ray at the terminal, in radians
    pub theta_rad: f64,
    /// Effective earth radius the terminal was solved against, in km
    pub a_e_km: f64,
    /// Atmospheric absorption along the terminal's horizon leg, in dB
    pub absorption_db: f64,
}

/// Path quantities derived from both terminals.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    /// Maximum line-of-sight distance, in km
    pub d_ml_km: f64,
    /// Distance of the line-of-sight interpolation anchor, in km
    pub d_0_km: f64,
    /// Distance at which the fitted diffraction loss crosses zero, in km
    pub d_d_km: f64,
    /// Effective earth radius shared by both terminals, in km
    pub a_e_km: f64,
}

/// Two-ray geometry of the line-of-sight region.
///
/// Valid only when the queried distance does not exceed the maximum
/// line-of-sight distance.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineOfSightGeometry {
    /// Direct ray length, in km
    pub r_0_km: f64,
    /// Reflected (indirect) ray length, in km
    pub r_12_km: f64,
    /// Take-off angle of the direct ray at the low terminal, in radians
    pub theta_h1_rad: f64,
    /// Take-off angle of the direct ray at the high terminal, in radians
    pub theta_h2_rad: f64,
    /// Adjusted earth radius of the reflection geometry, in km
    pub a_a_km: f64,
    /// Path length difference between direct and reflected rays, in km
    pub delta_r_km: f64,
    /// Loss relative to free space from two-ray interference, in dB
    pub loss_db: f64,
}

/// Common-volume geometry of the troposcatter region.
///
/// Valid only beyond the near edge of the troposcatter region.
#[derive(Debug, Clone, Copy, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TroposcatterGeometry {
    /// Scattering distance (path distance beyond both horizons), in km
    pub d_s_km: f64,
    /// Half scattering distance, in km
    pub d_z_km: f64,
    /// Height of the common scattering volume, in km
    pub h_v_km: f64,
    /// Scattering angle, in radians
    pub theta_s_rad: f64,
    /// Cross-over angle of the scatter formulation, in radians
    pub theta_a_rad: f64,
    /// Scatter loss relative to free space, in dB
    pub loss_db: f64,
    /// Slope of scatter loss with distance, in dB/km
    pub slope_db_per_km: f64,
}

/// Result of a propagation prediction
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Prediction {
    /// Mode of propagation principally responsible for the loss
    pub mode: PropagationMode,
    /// Path distance the prediction applies to, in km
    pub distance_km: f64,
    /// Basic transmission loss, in dB
    pub loss_db: f64,
    /// Free space basic transmission loss, in dB
    pub free_space_loss_db: f64,
    /// Atmospheric absorption loss, in dB
    pub absorption_loss_db: f64,
    /// Elevation angle of the ray at the low terminal, in radians
    pub low_terminal_elevation_rad: f64,
    /// Warning flags
    pub warnings: Warnings,
}

/// Extended prediction result carrying the diagnostic geometry records
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PredictionEx {
    /// The prediction itself
    pub prediction: Prediction,
    /// Low terminal geometry
    pub low_terminal: Terminal,
    /// High terminal geometry
    pub high_terminal: Terminal,
    /// Shared path geometry
    pub path: Path,
    /// Two-ray line-of-sight geometry
    pub line_of_sight: LineOfSightGeometry,
    /// Troposcatter common-volume geometry
    pub troposcatter: TroposcatterGeometry,
}

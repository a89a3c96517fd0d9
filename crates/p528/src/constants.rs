//! Physical and model constants shared across the engine.

/// Actual earth radius, in km.
pub const A_0_KM: f64 = 6371.0;

/// Effective earth radius for the reference atmosphere, in km.
pub const A_E_KM: f64 = 9257.0;

/// Surface refractivity of the reference atmosphere, in N-Units.
pub const N_S: f64 = 341.0;

/// Relative permittivity of average ground.
pub const EPSILON_R: f64 = 15.0;

/// Conductivity of average ground, in S/m.
pub const SIGMA: f64 = 0.005;

/// Speed of light, in Gm/s; `C / f_mhz` is the wavelength in km.
pub const C: f64 = 0.2997925;

/// Ground-level water vapour density of the reference atmosphere, in g/m^3.
pub const RHO_0_G_M3: f64 = 7.5;

pub const THIRD: f64 = 1.0 / 3.0;

/// Scattering angle below which the line-of-sight fading statistics
/// still contribute, in radians (1.5 degrees).
pub const SCATTERING_ANGLE_BLEND_RAD: f64 = 0.026_179_938_78;

/// Thickness of the absorbing oxygen layer, in km.
pub const T_EO_KM: f64 = 3.25;

/// Thickness of the absorbing water vapour layer, in km.
pub const T_EW_KM: f64 = 1.36;

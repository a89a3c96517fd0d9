//! ITU-R P.835 mean annual global reference atmosphere.
//!
//! Provides temperature, dry-air pressure and water vapour profiles as a
//! function of geometric height, valid from the surface to 100 km. The
//! profiles below 86 km are the piecewise standard-atmosphere fits over
//! geopotential height; above 86 km the second-regime expressions apply.

use thiserror::Error;

/// Scale height of the water vapour density profile, in km.
const WATER_VAPOUR_SCALE_HEIGHT_KM: f64 = 2.0;

/// Boundary between the two height regimes, in km.
const REGIME_BOUNDARY_KM: f64 = 86.0;

/// Errors returned when a profile is queried outside its valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeightError {
    /// Height is below the surface.
    #[error("height is below 0 km")]
    BelowSurface,

    /// Height is above the 100 km ceiling of the reference atmosphere.
    #[error("height is above 100 km")]
    AboveCeiling,
}

fn check_height(h_km: f64) -> Result<(), HeightError> {
    if h_km < 0.0 {
        Err(HeightError::BelowSurface)
    } else if h_km > 100.0 {
        Err(HeightError::AboveCeiling)
    } else {
        Ok(())
    }
}

/// Converts geometric height, in km, to geopotential height, in km'.
pub fn to_geopotential_height(h_km: f64) -> f64 {
    (6356.766 * h_km) / (6356.766 + h_km)
}

/// Converts geopotential height, in km', to geometric height, in km.
pub fn to_geometric_height(h_prime_km: f64) -> f64 {
    (6356.766 * h_prime_km) / (6356.766 - h_prime_km)
}

/// Converts water vapour density, in g/m^3, to water vapour pressure, in hPa.
pub fn water_vapour_density_to_pressure(rho_g_m3: f64, t_kelvin: f64) -> f64 {
    (rho_g_m3 * t_kelvin) / 216.7
}

/// Atmospheric temperature at a geometric height, in Kelvin.
pub fn temperature(h_km: f64) -> Result<f64, HeightError> {
    check_height(h_km)?;

    if h_km < REGIME_BOUNDARY_KM {
        Ok(temperature_regime_1(to_geopotential_height(h_km)))
    } else {
        Ok(temperature_regime_2(h_km))
    }
}

// First height regime, over geopotential height up to 84.852 km'.
fn temperature_regime_1(h_prime_km: f64) -> f64 {
    if h_prime_km <= 11.0 {
        288.15 - 6.5 * h_prime_km
    } else if h_prime_km <= 20.0 {
        216.65
    } else if h_prime_km <= 32.0 {
        216.65 + (h_prime_km - 20.0)
    } else if h_prime_km <= 47.0 {
        228.65 + 2.8 * (h_prime_km - 32.0)
    } else if h_prime_km <= 51.0 {
        270.65
    } else if h_prime_km <= 71.0 {
        270.65 - 2.8 * (h_prime_km - 51.0)
    } else {
        214.65 - 2.0 * (h_prime_km - 71.0)
    }
}

// Second height regime, 86 to 100 km geometric.
fn temperature_regime_2(h_km: f64) -> f64 {
    if h_km <= 91.0 {
        186.8673
    } else {
        263.1905 - 76.3232 * (1.0 - ((h_km - 91.0) / 19.9429).powi(2)).sqrt()
    }
}

/// Dry-air pressure at a geometric height, in hPa.
pub fn pressure(h_km: f64) -> Result<f64, HeightError> {
    check_height(h_km)?;

    if h_km < REGIME_BOUNDARY_KM {
        Ok(pressure_regime_1(to_geopotential_height(h_km)))
    } else {
        Ok(pressure_regime_2(h_km))
    }
}

fn pressure_regime_1(h_prime_km: f64) -> f64 {
    if h_prime_km <= 11.0 {
        1013.25 * (288.15 / (288.15 - 6.5 * h_prime_km)).powf(-34.1632 / 6.5)
    } else if h_prime_km <= 20.0 {
        226.3226 * (-34.1632 * (h_prime_km - 11.0) / 216.65).exp()
    } else if h_prime_km <= 32.0 {
        54.74980 * (216.65 / (216.65 + (h_prime_km - 20.0))).powf(34.1632)
    } else if h_prime_km <= 47.0 {
        8.680422 * (228.65 / (228.65 + 2.8 * (h_prime_km - 32.0))).powf(34.1632 / 2.8)
    } else if h_prime_km <= 51.0 {
        1.109106 * (-34.1632 * (h_prime_km - 47.0) / 270.65).exp()
    } else if h_prime_km <= 71.0 {
        0.6694167 * (270.65 / (270.65 - 2.8 * (h_prime_km - 51.0))).powf(-34.1632 / 2.8)
    } else {
        0.03956649 * (214.65 / (214.65 - 2.0 * (h_prime_km - 71.0))).powf(-34.1632 / 2.0)
    }
}

fn pressure_regime_2(h_km: f64) -> f64 {
    let a_0 = 95.571899;
    let a_1 = -4.011801;
    let a_2 = 6.424731e-2;
    let a_3 = -4.789660e-4;
    let a_4 = 1.340543e-6;

    (a_0 + a_1 * h_km + a_2 * h_km.powi(2) + a_3 * h_km.powi(3) + a_4 * h_km.powi(4)).exp()
}

/// Water vapour density at a geometric height, in g/m^3, from the
/// ground-level density `rho_0_g_m3`.
pub fn water_vapour_density(h_km: f64, rho_0_g_m3: f64) -> Result<f64, HeightError> {
    check_height(h_km)?;

    Ok(rho_0_g_m3 * (-h_km / WATER_VAPOUR_SCALE_HEIGHT_KM).exp())
}

/// Water vapour pressure at a geometric height, in hPa, from the
/// ground-level density `rho_0_g_m3`.
pub fn water_vapour_pressure(h_km: f64, rho_0_g_m3: f64) -> Result<f64, HeightError> {
    let rho = water_vapour_density(h_km, rho_0_g_m3)?;
    let t_kelvin = temperature(h_km)?;

    Ok(water_vapour_density_to_pressure(rho, t_kelvin))
}

//! Ray tracing through the layered reference atmosphere.
//!
//! The atmosphere between two heights is divided into exponentially
//! thickening layers; the ray is refracted at each layer interface by
//! Snell's law for a spherically stratified medium. The trace accumulates
//! the ray length, the bending angle, and the arc distance covered, and
//! reports the ray's incidence angle at the upper height.

use crate::constants::{A_0_KM, RHO_0_G_M3};
use crate::error::PredictionResult;

/// Outcome of tracing a ray between two heights.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RayTraceResult {
    /// Total ray length, in km
    pub a_km: f64,
    /// Total ray bending, in radians
    pub bending_rad: f64,
    /// Incidence angle at the upper height, measured from the local
    /// vertical, in radians
    pub angle_rad: f64,
}

/// Refractive index of air at a geometric height in the mean annual
/// global reference atmosphere.
pub(crate) fn refractive_index(h_km: f64) -> PredictionResult<f64> {
    let t_kelvin = p835::temperature(h_km)?;
    let p_hpa = p835::pressure(h_km)?;

    // water vapour pressure with the dry-air mixing-ratio floor
    let rho_g_m3 = p835::water_vapour_density(h_km, RHO_0_G_M3)?
        .max(2e-6 * 216.7 * p_hpa / t_kelvin);
    let e_hpa = p835::water_vapour_density_to_pressure(rho_g_m3, t_kelvin);

    let n_dry = 77.6 * p_hpa / t_kelvin;
    let n_wet = 72.0 * e_hpa / t_kelvin + 3.75e5 * e_hpa / t_kelvin.powi(2);

    Ok(1.0 + (n_dry + n_wet) * 1e-6)
}

// Thickness of the i-th layer for base thickness m, in km.
fn layer_thickness(m: f64, i: i32) -> f64 {
    m * (f64::from(i - 1) / 100.0).exp()
}

/// Traces a ray from `h_1_km` up to `h_2_km`, launched at `beta_1_rad`
/// from the local vertical at the lower height.
pub(crate) fn trace(
    h_1_km: f64,
    h_2_km: f64,
    beta_1_rad: f64,
) -> PredictionResult<RayTraceResult> {
    let mut result = RayTraceResult::default();

    if h_2_km - h_1_km < 1e-9 {
        result.angle_rad = beta_1_rad;
        return Ok(result);
    }

    // layer index bounds and base thickness for the exponential grid
    let e_01 = (1.0_f64 / 100.0).exp();
    let i_lower = (100.0 * (1e4 * h_1_km * (e_01 - 1.0) + 1.0).ln() + 1.0).floor() as i32;
    let i_upper = (100.0 * (1e4 * h_2_km * (e_01 - 1.0) + 1.0).ln() + 1.0).ceil() as i32;
    let m = (((2.0_f64 / 100.0).exp() - e_01)
        / ((f64::from(i_upper) / 100.0).exp() - (f64::from(i_lower) / 100.0).exp()))
        * (h_2_km - h_1_km);

    // The exponential grid's layer midpoints can overshoot the top height
    // slightly; profile queries are clamped to the traced span.
    let mut n_i = refractive_index((h_1_km + layer_thickness(m, i_lower) / 2.0).min(h_2_km))?;
    let mut r_i_km = A_0_KM + h_1_km;

    // bottom layer properties anchor the Snell invariant
    let r_1_km = r_i_km;
    let n_1 = n_i;

    let mut alpha_i_rad = beta_1_rad;

    for i in i_lower..i_upper {
        let delta_ii_km = layer_thickness(m, i + 1);
        let h_ii_km = h_1_km
            + m * (((f64::from(i) / 100.0).exp() - (f64::from(i_lower - 1) / 100.0).exp())
                / (e_01 - 1.0));

        let n_ii = refractive_index((h_ii_km + delta_ii_km / 2.0).min(h_2_km))?;
        let r_ii_km = A_0_KM + h_ii_km;

        let delta_i_km = layer_thickness(m, i);

        // Snell's law for a spherically stratified atmosphere
        let beta_i_rad = ((n_1 * r_1_km) / (n_i * r_i_km) * beta_1_rad.sin())
            .min(1.0)
            .asin();
        alpha_i_rad = ((n_1 * r_1_km) / (n_i * r_ii_km) * beta_1_rad.sin())
            .min(1.0)
            .asin();

        // ray length through the layer
        let a_i_km = -r_i_km * beta_i_rad.cos()
            + (r_i_km.powi(2) * beta_i_rad.cos().powi(2)
                + 2.0 * r_i_km * delta_i_km
                + delta_i_km.powi(2))
            .sqrt();

        result.a_km += a_i_km;

        let beta_ii_rad = (n_i / n_ii * alpha_i_rad.sin()).asin();
        if i != i_upper - 1 {
            result.bending_rad += beta_ii_rad - alpha_i_rad;
        }

        n_i = n_ii;
        r_i_km = r_ii_km;
    }

    result.angle_rad = alpha_i_rad;

    Ok(result)
}

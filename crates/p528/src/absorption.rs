//! Atmospheric absorption from effective ray lengths.
//!
//! Oxygen and water vapour specific attenuations come from a tabulated
//! frequency sweep; the path absorption is the product of those rates with
//! the effective length the ray spends inside each absorbing layer (oxygen
//! layer 3.25 km thick, water vapour layer 1.36 km thick).

use std::f64::consts::PI;

use crate::constants::{T_EO_KM, T_EW_KM};
use crate::types::{Path, Terminal, TroposcatterGeometry};

/// Specific attenuation rates at a frequency, in dB/km.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpecificAttenuation {
    /// Oxygen absorption rate, in dB/km
    pub gamma_oo: f64,
    /// Water vapour absorption rate, in dB/km
    pub gamma_ow: f64,
}

const FREQS_MHZ: [f64; 20] = [
    100.0, 150.0, 205.0, 300.0, 325.0, 350.0, 400.0, 550.0, 700.0, 1000.0, 1520.0, 2000.0,
    3000.0, 3400.0, 4000.0, 4900.0, 8300.0, 10200.0, 15000.0, 17000.0,
];

// Oxygen absorption rates, in dB/km, matching FREQS_MHZ
const OXYGEN_DATA: [f64; 20] = [
    0.00019, 0.00042, 0.00070, 0.00096, 0.0013, 0.0015, 0.0018, 0.0024, 0.003, 0.0042, 0.005,
    0.007, 0.0088, 0.0092, 0.010, 0.011, 0.014, 0.015, 0.017, 0.018,
];

// Water vapour absorption rates, in dB/km, matching FREQS_MHZ. Zero below
// the first tabulated onset at 3400 MHz.
const WATER_DATA: [f64; 20] = [
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0001, 0.00017, 0.00034,
    0.0021, 0.009, 0.025, 0.045,
];

// Index of the first frequency with a non-zero water vapour rate.
const WATER_ONSET: usize = 13;

fn log_interp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    let s = (x.log10() - x0.log10()) / (x1.log10() - x0.log10());
    10f64.powf(s * (y1.log10() - y0.log10()) + y0.log10())
}

/// Specific attenuation rates at `f_mhz`, log-log interpolated between the
/// tabulated frequencies and extrapolated beyond the table ends.
pub(crate) fn specific_attenuation(f_mhz: f64) -> SpecificAttenuation {
    let n = FREQS_MHZ.len();

    if f_mhz <= FREQS_MHZ[0] {
        return SpecificAttenuation {
            gamma_oo: log_interp(f_mhz, FREQS_MHZ[0], FREQS_MHZ[1], OXYGEN_DATA[0], OXYGEN_DATA[1]),
            gamma_ow: 0.0,
        };
    }
    if f_mhz >= FREQS_MHZ[n - 1] {
        return SpecificAttenuation {
            gamma_oo: log_interp(
                f_mhz,
                FREQS_MHZ[n - 2],
                FREQS_MHZ[n - 1],
                OXYGEN_DATA[n - 2],
                OXYGEN_DATA[n - 1],
            ),
            gamma_ow: log_interp(
                f_mhz,
                FREQS_MHZ[n - 2],
                FREQS_MHZ[n - 1],
                WATER_DATA[n - 2],
                WATER_DATA[n - 1],
            ),
        };
    }

    let mut i = 1;
    while f_mhz > FREQS_MHZ[i] {
        i += 1;
    }

    let gamma_oo = log_interp(
        f_mhz,
        FREQS_MHZ[i - 1],
        FREQS_MHZ[i],
        OXYGEN_DATA[i - 1],
        OXYGEN_DATA[i],
    );

    // below the water vapour onset the lower table entry is zero and the
    // log interpolation is undefined
    let gamma_ow = if i <= WATER_ONSET {
        0.0
    } else {
        log_interp(
            f_mhz,
            FREQS_MHZ[i - 1],
            FREQS_MHZ[i],
            WATER_DATA[i - 1],
            WATER_DATA[i],
        )
    };

    SpecificAttenuation { gamma_oo, gamma_ow }
}

/// Effective length of the ray inside an absorbing layer of thickness
/// `t_e_km` above the surface. Heights `z_1_km <= z_2_km` are radii from
/// the effective earth center, `a_km` the effective earth radius,
/// `d_arc_km` the arc distance between the ray endpoints and `beta_rad`
/// the ray's take-off angle at the lower endpoint.
pub(crate) fn effective_ray_length(
    z_1_km: f64,
    z_2_km: f64,
    a_km: f64,
    d_arc_km: f64,
    beta_rad: f64,
    t_e_km: f64,
) -> f64 {
    let alpha_rad = PI / 2.0 + beta_rad;
    let z_t_km = a_km + t_e_km;

    if z_2_km <= z_t_km {
        // both endpoints inside the layer
        d_arc_km
    } else if z_t_km < z_1_km {
        // both endpoints above the layer
        if beta_rad > 0.0 {
            0.0
        } else {
            let z_c_km = z_1_km * alpha_rad.sin();
            if z_t_km <= z_c_km {
                0.0
            } else {
                2.0 * z_t_km * (z_c_km / z_t_km).acos().sin()
            }
        }
    } else {
        // ray crosses the layer boundary
        let a_q_rad = (z_1_km * alpha_rad.sin() / z_t_km).asin();
        let a_e_rad = PI - (alpha_rad + a_q_rad);

        if a_e_rad == 0.0 {
            z_t_km - z_1_km
        } else {
            (z_1_km * a_e_rad.sin()) / a_q_rad.sin()
        }
    }
}

/// Absorption along a terminal's horizon leg, in dB: the ray from the
/// grazing point at the surface up to the terminal height.
pub(crate) fn terminal_leg_absorption(
    h_km: f64,
    d_arc_km: f64,
    a_e_km: f64,
    gamma: SpecificAttenuation,
) -> f64 {
    let z_1_km = a_e_km;
    let z_2_km = a_e_km + h_km;

    let r_eo_km = effective_ray_length(z_1_km, z_2_km, a_e_km, d_arc_km, 0.0, T_EO_KM);
    let r_ew_km = effective_ray_length(z_1_km, z_2_km, a_e_km, d_arc_km, 0.0, T_EW_KM);

    gamma.gamma_oo * r_eo_km + gamma.gamma_ow * r_ew_km
}

/// Effective oxygen and water vapour ray lengths of a line-of-sight path
/// between the two terminals, in km.
pub(crate) fn los_effective_ray_lengths(
    z_1_km: f64,
    z_2_km: f64,
    a_a_km: f64,
    r_0_km: f64,
    theta_h1_rad: f64,
) -> (f64, f64) {
    let r_eo_km = effective_ray_length(z_1_km, z_2_km, a_a_km, r_0_km, theta_h1_rad, T_EO_KM);
    let r_ew_km = effective_ray_length(z_1_km, z_2_km, a_a_km, r_0_km, theta_h1_rad, T_EW_KM);
    (r_eo_km, r_ew_km)
}

/// Total absorption of a transhorizon path, in dB: each terminal's ray to
/// the common scattering volume, evaluated against both absorbing layers.
pub(crate) fn transhorizon_absorption(
    low: &Terminal,
    high: &Terminal,
    path: &Path,
    tropo: &TroposcatterGeometry,
    gamma: SpecificAttenuation,
) -> f64 {
    let z_1_km = low.h_km + path.a_e_km;
    let z_2_km = high.h_km + path.a_e_km;
    let z_v_km = tropo.h_v_km + path.a_e_km;

    let (z_low1, z_high1, beta_1) = if z_1_km > z_v_km {
        (z_v_km, z_1_km, -tropo.theta_a_rad.atan())
    } else {
        (z_1_km, z_v_km, -low.theta_rad)
    };

    let (z_low2, z_high2, beta_2) = if z_2_km > z_v_km {
        (z_v_km, z_2_km, -tropo.theta_a_rad.atan())
    } else {
        (z_2_km, z_v_km, -high.theta_rad)
    };

    let d_arc1_km = low.d_km + tropo.d_z_km;
    let d_arc2_km = high.d_km + tropo.d_z_km;

    let r_eo_km = effective_ray_length(z_low1, z_high1, path.a_e_km, d_arc1_km, beta_1, T_EO_KM)
        + effective_ray_length(z_low2, z_high2, path.a_e_km, d_arc2_km, beta_2, T_EO_KM);
    let r_ew_km = effective_ray_length(z_low1, z_high1, path.a_e_km, d_arc1_km, beta_1, T_EW_KM)
        + effective_ray_length(z_low2, z_high2, path.a_e_km, d_arc2_km, beta_2, T_EW_KM);

    gamma.gamma_oo * r_eo_km + gamma.gamma_ow * r_ew_km
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn table_points_are_reproduced() {
        let g = specific_attenuation(1000.0);
        assert_relative_eq!(g.gamma_oo, 0.0042, epsilon = 1e-10);
        assert_eq!(g.gamma_ow, 0.0);

        let g = specific_attenuation(17000.0);
        assert_relative_eq!(g.gamma_oo, 0.018, epsilon = 1e-10);
        assert_relative_eq!(g.gamma_ow, 0.045, epsilon = 1e-10);
    }

    #[test]
    fn interpolation_is_bracketed_and_monotone() {
        let lo = specific_attenuation(700.0);
        let mid = specific_attenuation(850.0);
        let hi = specific_attenuation(1000.0);
        assert!(mid.gamma_oo > lo.gamma_oo && mid.gamma_oo < hi.gamma_oo);
    }

    #[test]
    fn water_vapour_is_zero_below_onset() {
        for f in [100.0, 500.0, 2500.0, 3200.0] {
            assert_eq!(specific_attenuation(f).gamma_ow, 0.0);
        }
        assert!(specific_attenuation(3700.0).gamma_ow > 0.0);
    }

    #[test]
    fn extrapolation_beyond_table_is_finite_and_increasing() {
        let edge = specific_attenuation(17000.0);
        let beyond = specific_attenuation(22000.0);
        assert!(beyond.gamma_oo > edge.gamma_oo);
        assert!(beyond.gamma_ow > edge.gamma_ow);
        assert!(beyond.gamma_ow.is_finite());
    }

    #[test]
    fn ray_inside_layer_uses_arc_distance() {
        // both endpoints below the oxygen layer top
        let a = 9257.0;
        let r = effective_ray_length(a, a + 1.0, a, 120.0, 0.0, T_EO_KM);
        assert_relative_eq!(r, 120.0);
    }

    #[test]
    fn high_ray_misses_thin_layer() {
        // both endpoints far above the water vapour layer, ray pointing up
        let a = 9257.0;
        let r = effective_ray_length(a + 10.0, a + 20.0, a, 200.0, 0.1, T_EW_KM);
        assert_eq!(r, 0.0);
    }

    #[test]
    fn crossing_ray_length_is_bounded_by_geometry() {
        let a = 9257.0;
        // steep ray from the surface through the oxygen layer: the length
        // inside the layer is close to thickness over the elevation sine
        let beta = 1.0_f64;
        let r = effective_ray_length(a, a + 10.0, a, 4.0, beta, T_EO_KM);
        assert!(r > T_EO_KM && r < 1.1 * T_EO_KM / beta.sin());
    }
}

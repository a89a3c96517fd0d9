//! Smooth-earth diffraction loss.

use crate::constants::{EPSILON_R, SIGMA, THIRD};
use crate::types::Polarization;

fn distance_function(x_km: f64) -> f64 {
    0.05751 * x_km - 10.0 * x_km.log10()
}

fn height_function(x_km: f64, k: f64) -> f64 {
    let y_db = 40.0 * x_km.log10() - 117.0;
    let g_x_db = distance_function(x_km);

    if x_km <= 200.0 {
        let x_t_km = 450.0 / -(k.log10().powi(3));
        if x_km >= x_t_km {
            if y_db.abs() < 117.0 {
                y_db
            } else {
                -117.0
            }
        } else {
            20.0 * k.log10() - 15.0 + (0.000025 * x_km * x_km / k)
        }
    } else if x_km > 2000.0 {
        g_x_db
    } else {
        // Blend the height gain into the distance function over the
        // 200 to 2000 span.
        let w = 0.0134 * x_km * (-0.005 * x_km).exp();
        w * y_db + (1.0 - w) * g_x_db
    }
}

/// Smooth-earth diffraction loss for a path whose terminals have horizon
/// distances `d_1_km` and `d_2_km`, evaluated at distance `d_0_km`.
pub(crate) fn smooth_earth_diffraction(
    d_1_km: f64,
    d_2_km: f64,
    f_mhz: f64,
    d_0_km: f64,
    polarization: Polarization,
) -> f64 {
    let s = 18000.0 * SIGMA / f_mhz;

    let k = match polarization {
        Polarization::Horizontal => {
            0.01778 * f_mhz.powf(-THIRD) * ((EPSILON_R - 1.0).powi(2) + s * s).powf(-0.25)
        }
        Polarization::Vertical => {
            0.01778
                * f_mhz.powf(-THIRD)
                * ((EPSILON_R * EPSILON_R + s * s)
                    / ((EPSILON_R - 1.0).powi(2) + s * s).sqrt())
                .sqrt()
        }
    };

    let b_0 = 1.607;
    let x_0_km = (b_0 - k) * f_mhz.powf(THIRD) * d_0_km;
    let x_1_km = (b_0 - k) * f_mhz.powf(THIRD) * d_1_km;
    let x_2_km = (b_0 - k) * f_mhz.powf(THIRD) * d_2_km;

    distance_function(x_0_km) - height_function(x_1_km, k) - height_function(x_2_km, k) - 20.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_grows_with_distance() {
        let a = smooth_earth_diffraction(15.0, 100.0, 300.0, 150.0, Polarization::Horizontal);
        let b = smooth_earth_diffraction(15.0, 100.0, 300.0, 250.0, Polarization::Horizontal);
        assert!(b > a);
    }

    #[test]
    fn loss_grows_with_frequency_beyond_horizon() {
        let a = smooth_earth_diffraction(15.0, 100.0, 125.0, 200.0, Polarization::Horizontal);
        let b = smooth_earth_diffraction(15.0, 100.0, 3000.0, 200.0, Polarization::Horizontal);
        assert!(b > a);
    }

    #[test]
    fn polarizations_agree_at_high_frequency() {
        // The ground constants matter less as frequency rises.
        let h = smooth_earth_diffraction(20.0, 120.0, 10000.0, 220.0, Polarization::Horizontal);
        let v = smooth_earth_diffraction(20.0, 120.0, 10000.0, 220.0, Polarization::Vertical);
        assert!((h - v).abs() < 2.0);
    }

    #[test]
    fn distance_function_has_minimum() {
        // G(x) falls with the log term then rises with the linear term.
        let g_small = distance_function(10.0);
        let g_mid = distance_function(100.0);
        let g_large = distance_function(10000.0);
        assert!(g_mid < g_small);
        assert!(g_large > g_mid);
    }
}

//! Troposcatter loss from a common scattering volume above the
//! cross-over of the two horizon rays.

use crate::constants::{A_0_KM, A_E_KM, N_S};
use crate::types::{Terminal, TroposcatterGeometry};

/// Evaluate the troposcatter model at distance `d_km`.
///
/// Returns an all-zero geometry when the scatter distance is not positive,
/// which callers treat as "no common volume".
pub(crate) fn troposcatter(
    low: &Terminal,
    high: &Terminal,
    d_km: f64,
    f_mhz: f64,
) -> TroposcatterGeometry {
    let mut tropo = TroposcatterGeometry::default();

    tropo.d_s_km = d_km - low.d_km - high.d_km;
    if tropo.d_s_km <= 0.0 {
        tropo.d_s_km = 0.0;
        return tropo;
    }

    tropo.d_z_km = 0.5 * tropo.d_s_km;

    // Ray curvature through the exponential atmosphere between the
    // terminals' horizon rays and the common volume.
    let a_m = 1.0 / A_0_KM;
    let d_n = a_m - 1.0 / A_E_KM;
    let gamma_e_km = (N_S * 1e-6) / d_n;

    let z_a_km = 1.0 / (2.0 * A_E_KM) * (tropo.d_z_km / 2.0).powi(2);
    let z_b_km = 1.0 / (2.0 * A_E_KM) * tropo.d_z_km.powi(2);

    let q_o = a_m - d_n;
    let q_a = a_m - d_n / (z_a_km / gamma_e_km).min(35.0).exp();
    let q_b = a_m - d_n / (z_b_km / gamma_e_km).min(35.0).exp();

    let cap_z_a_km = (7.0 * q_o + 6.0 * q_a - q_b) * (tropo.d_z_km.powi(2) / 96.0);
    let cap_z_b_km = (q_o + 2.0 * q_a) * (tropo.d_z_km.powi(2) / 6.0);

    let q_cap_a = a_m - d_n / (cap_z_a_km / gamma_e_km).min(35.0).exp();
    let q_cap_b = a_m - d_n / (cap_z_b_km / gamma_e_km).min(35.0).exp();

    tropo.h_v_km = (q_o + 2.0 * q_cap_a) * (tropo.d_z_km.powi(2) / 6.0);
    tropo.theta_a_rad = (q_o + 4.0 * q_cap_a + q_cap_b) * tropo.d_z_km / 6.0;
    tropo.theta_s_rad = 2.0 * tropo.theta_a_rad;

    // Scattering efficiency term.
    let epsilon_1 = 5.67e-6 * N_S * N_S - 0.00232 * N_S + 0.031;
    let epsilon_2 = 0.0002 * N_S * N_S - 0.06 * N_S + 6.6;
    let gamma = 0.1424 * (1.0 + epsilon_1 / (tropo.h_v_km / 4.0).powi(6).min(35.0).exp());
    let s_e_db = 83.1 - epsilon_2 / (1.0 + 0.07716 * tropo.h_v_km.powi(2))
        + 20.0 * ((0.1424 / gamma).powi(2) * (gamma * tropo.h_v_km).exp()).log10();

    // Scattering volume term.
    let x_a1_km2 = low.h_e_km.powi(2)
        + 4.0 * (A_E_KM + low.h_e_km) * A_E_KM * (low.d_km / (A_E_KM * 2.0)).sin().powi(2);
    let x_a2_km2 = high.h_e_km.powi(2)
        + 4.0 * (A_E_KM + high.h_e_km) * A_E_KM * (high.d_km / (A_E_KM * 2.0)).sin().powi(2);

    let ell_1_km = x_a1_km2.sqrt() + tropo.d_z_km;
    let ell_2_km = x_a2_km2.sqrt() + tropo.d_z_km;
    let ell_km = ell_1_km + ell_2_km;

    let s = (ell_1_km - ell_2_km) / ell_km;
    let eta = gamma * tropo.theta_s_rad * ell_km / 2.0;

    let kappa = f_mhz / 0.0477;
    let rho_1_km = 2.0 * kappa * tropo.theta_s_rad * low.h_e_km;
    let rho_2_km = 2.0 * kappa * tropo.theta_s_rad * high.h_e_km;

    let sqrt_2 = std::f64::consts::SQRT_2;

    let a = (1.0 - s * s).powi(2);
    let x_v1 = (1.0 + s).powi(2) * eta;
    let x_v2 = (1.0 - s).powi(2) * eta;
    let q_1 = x_v1 * x_v1 + rho_1_km * rho_1_km;
    let q_2 = x_v2 * x_v2 + rho_2_km * rho_2_km;

    let b_s = 6.0
        + 8.0 * s * s
        + 8.0 * (1.0 - s) * x_v1 * x_v1 * rho_1_km * rho_1_km / (q_1 * q_1)
        + 8.0 * (1.0 + s) * x_v2 * x_v2 * rho_2_km * rho_2_km / (q_2 * q_2)
        + 2.0 * (1.0 - s * s) * (1.0 + 2.0 * x_v1 * x_v1 / q_1) * (1.0 + 2.0 * x_v2 * x_v2 / q_2);

    let c_s = 12.0
        * ((rho_1_km + sqrt_2) / rho_1_km).powi(2)
        * ((rho_2_km + sqrt_2) / rho_2_km).powi(2)
        * (rho_1_km + rho_2_km)
        / (rho_1_km + rho_2_km + 2.0 * sqrt_2);

    let s_v_db = 10.0
        * ((a * eta * eta + b_s * eta) * q_1 * q_2 / (rho_1_km * rho_1_km * rho_2_km * rho_2_km)
            + c_s)
            .log10();

    tropo.loss_db =
        s_e_db + s_v_db + 10.0 * (kappa * tropo.theta_s_rad.powi(3) / ell_km).log10();

    tropo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absorption::SpecificAttenuation;
    use crate::types::Warnings;

    fn test_terminal(h_km: f64) -> Terminal {
        let gamma = SpecificAttenuation {
            gamma_oo: 0.01,
            gamma_ow: 0.0,
        };
        let mut warnings = Warnings::default();
        crate::terminal::solve(h_km, gamma, &mut warnings)
    }

    #[test]
    fn within_horizon_has_no_common_volume() {
        let low = test_terminal(0.01);
        let high = test_terminal(10.0);
        let tropo = troposcatter(&low, &high, 1.0, 300.0);
        assert_eq!(tropo.d_s_km, 0.0);
        assert_eq!(tropo.loss_db, 0.0);
        assert_eq!(tropo.theta_s_rad, 0.0);
    }

    #[test]
    fn loss_grows_with_distance() {
        let low = test_terminal(0.01);
        let high = test_terminal(10.0);
        let d_ml = low.d_km + high.d_km;
        let a = troposcatter(&low, &high, d_ml + 100.0, 300.0).loss_db;
        let b = troposcatter(&low, &high, d_ml + 300.0, 300.0).loss_db;
        assert!(b > a);
        assert!(a > 20.0);
    }

    #[test]
    fn scattering_angle_grows_with_distance() {
        let low = test_terminal(0.01);
        let high = test_terminal(10.0);
        let d_ml = low.d_km + high.d_km;
        let a = troposcatter(&low, &high, d_ml + 50.0, 300.0);
        let b = troposcatter(&low, &high, d_ml + 400.0, 300.0);
        assert!(b.theta_s_rad > a.theta_s_rad);
        assert!(b.h_v_km > a.h_v_km);
        assert!(a.theta_s_rad > 0.0);
    }
}

//! Terminal geometry against the reference atmosphere.

use std::f64::consts::PI;

use crate::absorption::{self, SpecificAttenuation};
use crate::constants::{A_0_KM, A_E_KM};
use crate::ray_trace;
use crate::types::{Terminal, Warnings};

/// Solves a terminal's horizon geometry: the smooth-earth horizon ray is
/// traced from the grazing point up to the terminal height, giving the
/// horizon incidence angle, the ray length, the arc distance and the
/// effective height, plus the absorption along the horizon leg.
///
/// A trace that fails or degenerates falls back to the geometric-optics
/// horizon with the fallback warning set, so the solve always yields a
/// usable terminal.
pub(crate) fn solve(h_km: f64, gamma: SpecificAttenuation, warnings: &mut Warnings) -> Terminal {
    let (mut theta_rad, mut a_km, mut d_km) = match ray_trace::trace(0.0, h_km, PI / 2.0) {
        Ok(traced) => {
            let theta_rad = PI / 2.0 - traced.angle_rad;
            // arc distance from the bending-corrected central angle
            let central_angle = theta_rad + traced.bending_rad;
            (theta_rad, traced.a_km, A_0_KM * central_angle)
        }
        Err(_) => (-1.0, 0.0, 0.0),
    };

    if !(d_km.is_finite() && d_km > 0.0 && theta_rad >= 0.0) {
        // geometric-optics horizon estimate
        tracing::debug!(h_km, "horizon trace degenerate, using geometric estimate");
        warnings.set(Warnings::RAY_TRACE_FALLBACK);
        theta_rad = (2.0 * h_km / A_E_KM).sqrt();
        d_km = (2.0 * h_km * A_E_KM).sqrt();
        a_km = (h_km.powi(2) + d_km.powi(2)).sqrt();
    }

    let phi_rad = d_km / A_E_KM;

    // effective height from the central angle; small angles go through the
    // series form to avoid loss of significance
    let h_e_km = if phi_rad <= 0.1 {
        d_km.powi(2) / (2.0 * A_E_KM)
    } else {
        (A_E_KM / phi_rad.cos()) - A_E_KM
    };

    let mut phi_rad = phi_rad;
    let mut h_e_km = h_e_km;
    let mut delta_h_km = h_km - h_e_km;

    // a low terminal can trace to an effective height above its real
    // height; fall back to the geometric horizon in that case
    if delta_h_km <= 0.0 {
        theta_rad = (2.0 * h_km / A_E_KM).sqrt();
        d_km = (2.0 * h_km * A_E_KM).sqrt();
        phi_rad = d_km / A_E_KM;
        h_e_km = h_km;
        delta_h_km = 0.0;
    }

    let absorption_db = absorption::terminal_leg_absorption(h_km, d_km, A_E_KM, gamma);

    Terminal {
        h_km,
        h_e_km,
        delta_h_km,
        d_km,
        a_km,
        phi_rad,
        theta_rad,
        a_e_km: A_E_KM,
        absorption_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::absorption::specific_attenuation;

    fn solve_clean(h_km: f64) -> Terminal {
        let mut warnings = Warnings::default();
        let t = solve(h_km, specific_attenuation(1000.0), &mut warnings);
        assert!(!warnings.ray_trace_fallback());
        t
    }

    #[test]
    fn horizon_distance_grows_with_height() {
        let low = solve_clean(0.01);
        let mid = solve_clean(1.0);
        let high = solve_clean(10.0);
        assert!(low.d_km < mid.d_km);
        assert!(mid.d_km < high.d_km);
    }

    #[test]
    fn ten_meter_terminal_matches_geometric_horizon() {
        // at 10 m the traced horizon should sit near the 4/3-earth value
        let t = solve_clean(0.01);
        let geometric = (2.0 * 0.01 * A_E_KM).sqrt();
        assert!((t.d_km - geometric).abs() / geometric < 0.15);
    }

    #[test]
    fn effective_height_stays_below_real_height() {
        // refraction stretches the horizon, so the effective height model
        // keeps h_e at or below h for tropospheric terminals
        for h in [0.005, 0.1, 1.0, 10.0] {
            let t = solve_clean(h);
            assert!(t.h_e_km <= t.h_km + 1e-9, "h_e {} > h {}", t.h_e_km, h);
            assert!(t.delta_h_km >= -1e-9);
        }
    }

    #[test]
    fn horizon_angle_is_small_and_positive() {
        let t = solve_clean(10.0);
        assert!(t.theta_rad > 0.0 && t.theta_rad < 0.1);
    }

    #[test]
    fn ceiling_height_terminal_always_solves() {
        // heights at and just under the atmosphere ceiling must yield a
        // usable horizon geometry, by trace or by geometric fallback
        for h_km in [99.5, 99.8, 100.0] {
            let mut warnings = Warnings::default();
            let t = solve(h_km, specific_attenuation(1000.0), &mut warnings);
            assert!(t.d_km.is_finite() && t.d_km > 0.0);
            assert!(t.theta_rad > 0.0);
            assert!(t.a_km >= h_km);
        }
    }

    #[test]
    fn terminal_absorption_is_positive_and_modest() {
        let t = solve_clean(10.0);
        assert!(t.absorption_db > 0.0);
        assert!(t.absorption_db < 10.0);
    }
}

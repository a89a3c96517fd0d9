//! Line-of-sight region: two-ray optics over a curved earth, ground
//! reflection, and the short-term fading parameter fed into the
//! variability combination.

use std::f64::consts::{FRAC_PI_2, PI};

use num_complex::Complex64;

use crate::absorption::{self, SpecificAttenuation};
use crate::constants::{A_0_KM, A_E_KM, C, EPSILON_R, SIGMA};
use crate::nakagami_rice;
use crate::types::{LineOfSightGeometry, Path, Polarization, Terminal, Warnings};
use crate::variability;

/// Iteration cap for the grazing-angle bisections.  The step halves each
/// pass, so the searches either converge or stall well inside this bound.
const MAX_BISECTION_STEPS: usize = 200;

/// Cap on the 1 m refinement walk of the two-ray break distance.
const MAX_TUNE_STEPS: usize = 10_000;

/// Two-ray geometry for a single grazing angle.
#[derive(Debug, Clone, Default)]
pub(crate) struct TwoRayGeometry {
    pub a_a_km: f64,
    pub z_km: [f64; 2],
    pub theta_rad: [f64; 2],
    pub arc_d_km: [f64; 2],
    pub d_km: f64,
    pub r_0_km: f64,
    pub r_12_km: f64,
    pub delta_r_km: f64,
    pub theta_h1_rad: f64,
    pub theta_h2_rad: f64,
    pub a_los_db: f64,
}

/// Solve the two-ray geometry for grazing angle `psi` using an adjusted
/// earth radius that holds the refractive bending of the reflected ray.
pub(crate) fn ray_optics(low: &Terminal, high: &Terminal, psi_rad: f64) -> TwoRayGeometry {
    let mut geo = TwoRayGeometry::default();

    let z = (A_0_KM / A_E_KM) - 1.0;
    let k_a = 1.0 / (1.0 + z * psi_rad.cos());
    geo.a_a_km = A_0_KM * k_a;

    let scale = (geo.a_a_km - A_0_KM) / (A_E_KM - A_0_KM);
    let h_km = [
        low.h_km - low.delta_h_km * scale,
        high.h_km - high.delta_h_km * scale,
    ];

    let mut h_prime_km = [0.0; 2];
    for i in 0..2 {
        geo.z_km[i] = geo.a_a_km + h_km[i];
        geo.theta_rad[i] = (geo.a_a_km * psi_rad.cos() / geo.z_km[i]).acos() - psi_rad;
        geo.arc_d_km[i] = geo.z_km[i] * geo.theta_rad[i].sin();
        h_prime_km[i] = if psi_rad > 1.56 {
            h_km[i]
        } else {
            geo.arc_d_km[i] * psi_rad.tan()
        };
    }

    let delta_z_km = (geo.z_km[0] - geo.z_km[1]).abs();
    geo.d_km = (geo.a_a_km * (geo.theta_rad[0] + geo.theta_rad[1])).max(0.0);

    let alpha =
        ((h_prime_km[1] - h_prime_km[0]) / (geo.arc_d_km[0] + geo.arc_d_km[1])).atan();
    geo.r_0_km = delta_z_km.max((geo.arc_d_km[0] + geo.arc_d_km[1]) / alpha.cos());
    geo.r_12_km = (geo.arc_d_km[0] + geo.arc_d_km[1]) / psi_rad.cos();

    geo.delta_r_km = 4.0 * h_prime_km[0] * h_prime_km[1] / (geo.r_0_km + geo.r_12_km);

    geo.theta_h1_rad = alpha - geo.theta_rad[0];
    geo.theta_h2_rad = -(alpha + geo.theta_rad[1]);

    geo
}

/// Magnitude and phase of the plane-earth reflection coefficient for the
/// given grazing angle and polarization.
pub(crate) fn reflection_coefficients(
    psi_rad: f64,
    f_mhz: f64,
    polarization: Polarization,
) -> (f64, f64) {
    let (sin_psi, cos_psi) = if psi_rad <= 0.0 {
        (0.0, 1.0)
    } else if psi_rad >= FRAC_PI_2 {
        (1.0, 0.0)
    } else {
        (psi_rad.sin(), psi_rad.cos())
    };

    let x = (18000.0 * SIGMA) / f_mhz;
    let y = EPSILON_R - cos_psi * cos_psi;
    let t = (y * y + x * x).sqrt() + y;
    let p = (t * 0.5).sqrt();
    let q = x / (2.0 * p);

    let denom = p * p + q * q;
    let (a, b) = match polarization {
        Polarization::Horizontal => ((2.0 * p) / denom, 1.0 / denom),
        Polarization::Vertical => (
            (2.0 * (p * EPSILON_R + q * x)) / denom,
            (EPSILON_R * EPSILON_R + x * x) / denom,
        ),
    };

    let r_g = ((1.0 + b * sin_psi * sin_psi - a * sin_psi)
        / (1.0 + b * sin_psi * sin_psi + a * sin_psi))
        .sqrt();

    let (alpha, beta) = match polarization {
        Polarization::Horizontal => ((-q).atan2(sin_psi - p), q.atan2(sin_psi + p)),
        Polarization::Vertical => (
            (EPSILON_R * sin_psi - q).atan2(EPSILON_R * sin_psi - p),
            (x * sin_psi + q).atan2(EPSILON_R * sin_psi + p),
        ),
    };

    (r_g, alpha - beta)
}

/// Compute the two-ray loss term for the geometry at `psi`, writing it into
/// `geo.a_los_db` and returning the effective ground reflection factor.
///
/// Inside the break distance `d_0` the complex two-ray sum is used; beyond
/// it the loss is interpolated toward the diffraction value at the maximum
/// line-of-sight range.  Loss terms here are signed as gains (zero or
/// negative).
fn path_loss(
    psi_rad: f64,
    path: &Path,
    f_mhz: f64,
    psi_limit_rad: f64,
    a_dml_db: f64,
    a_d0_db: f64,
    polarization: Polarization,
    geo: &mut TwoRayGeometry,
) -> f64 {
    let (r_g, phi_g) = reflection_coefficients(psi_rad, f_mhz, polarization);

    let d_v = if psi_rad.tan() >= 0.1 {
        1.0
    } else {
        let r_1 = geo.arc_d_km[0] / psi_rad.cos();
        let r_2 = geo.arc_d_km[1] / psi_rad.cos();
        let r_r = (r_1 * r_2) / geo.r_12_km;
        let term_1 =
            (2.0 * r_r * (1.0 + psi_rad.sin().powi(2))) / (geo.a_a_km * psi_rad.sin());
        let term_2 = (2.0 * r_r / geo.a_a_km).powi(2);
        (1.0 + term_1 + term_2).powf(-0.5)
    };

    let f_r = (geo.r_0_km / geo.r_12_km).min(1.0);
    let r_tg = r_g * d_v * f_r;

    if geo.d_km > path.d_0_km {
        geo.a_los_db = ((geo.d_km - path.d_0_km) * (a_dml_db - a_d0_db)
            / (path.d_ml_km - path.d_0_km))
            + a_d0_db;
    } else {
        let lambda_km = C / f_mhz;
        if psi_rad > psi_limit_rad {
            // Close to the terminal the lobing is ignored and the direct
            // ray gives the free-space level.
            geo.a_los_db = 0.0;
        } else {
            let phi_tg = (2.0 * PI * geo.delta_r_km / lambda_km) + phi_g;
            let reflected = Complex64::new(r_tg * phi_tg.cos(), -r_tg * phi_tg.sin());
            let w_rl = (Complex64::new(1.0, 0.0) + reflected).norm().min(1.0);
            geo.a_los_db = 20.0 * w_rl.log10();
        }
    }

    r_tg
}

/// Grazing angle whose two-ray geometry spans the given great-circle
/// distance.
pub(crate) fn find_psi_at_distance(d_km: f64, low: &Terminal, high: &Terminal) -> f64 {
    if d_km == 0.0 {
        return FRAC_PI_2;
    }

    let mut psi = FRAC_PI_2;
    let mut delta_psi = -FRAC_PI_2 / 2.0;

    for _ in 0..MAX_BISECTION_STEPS {
        psi += delta_psi;
        let geo = ray_optics(low, high, psi);
        if geo.d_km > d_km {
            delta_psi = delta_psi.abs() / 2.0;
        } else {
            delta_psi = -delta_psi.abs() / 2.0;
        }
        if (d_km - geo.d_km).abs() <= 1e-3 || delta_psi.abs() <= 1e-12 {
            break;
        }
    }

    psi
}

/// Grazing angle at which the path-length difference between the direct
/// and reflected rays equals `delta_r_km`.
fn find_psi_at_delta_r(
    delta_r_km: f64,
    low: &Terminal,
    high: &Terminal,
    terminate: f64,
    warnings: &mut Warnings,
) -> f64 {
    let mut psi = FRAC_PI_2;
    let mut delta_psi = -FRAC_PI_2 / 2.0;
    let mut converged = false;

    for _ in 0..MAX_BISECTION_STEPS {
        psi += delta_psi;
        let geo = ray_optics(low, high, psi);
        if geo.delta_r_km > delta_r_km {
            delta_psi = -delta_psi.abs() / 2.0;
        } else {
            delta_psi = delta_psi.abs() / 2.0;
        }
        if (geo.delta_r_km - delta_r_km).abs() <= terminate {
            converged = true;
            break;
        }
    }

    if !converged {
        warnings.set(Warnings::RAY_TRACE_FALLBACK);
    }
    psi
}

/// Distance at which the path-length difference equals `delta_r_km`.
fn find_distance_at_delta_r(
    delta_r_km: f64,
    low: &Terminal,
    high: &Terminal,
    terminate: f64,
    warnings: &mut Warnings,
) -> f64 {
    let mut psi = FRAC_PI_2;
    let mut delta_psi = -FRAC_PI_2 / 2.0;
    let mut geo = ray_optics(low, high, psi);
    let mut converged = false;

    for _ in 0..MAX_BISECTION_STEPS {
        psi += delta_psi;
        geo = ray_optics(low, high, psi);
        if geo.delta_r_km > delta_r_km {
            delta_psi = -delta_psi.abs() / 2.0;
        } else {
            delta_psi = delta_psi.abs() / 2.0;
        }
        if (geo.delta_r_km - delta_r_km).abs() <= terminate {
            converged = true;
            break;
        }
    }

    if !converged {
        warnings.set(Warnings::RAY_TRACE_FALLBACK);
    }
    geo.d_km
}

/// Full line-of-sight evaluation at one distance.
pub(crate) struct LineOfSightOutcome {
    pub geometry: LineOfSightGeometry,
    pub free_space_loss_db: f64,
    pub absorption_loss_db: f64,
    pub loss_db: f64,
    pub k_los_db: f64,
}

/// Evaluate the line-of-sight model at `d_km`.
///
/// `a_dml_db` is the diffraction loss at the maximum line-of-sight
/// distance, signed as a gain (negative).  Sets `path.d_0_km` as a side
/// effect of the break-distance determination.
#[allow(clippy::too_many_arguments)]
pub(crate) fn line_of_sight(
    path: &mut Path,
    low: &Terminal,
    high: &Terminal,
    f_mhz: f64,
    a_dml_db: f64,
    p_percent: f64,
    d_km: f64,
    polarization: Polarization,
    gamma: SpecificAttenuation,
    warnings: &mut Warnings,
) -> LineOfSightOutcome {
    let lambda_km = C / f_mhz;
    let terminate = lambda_km / 1e6;

    // Below psi_limit the first reflection lobe has not yet formed and the
    // field stays at the free-space level.
    let psi_limit = find_psi_at_delta_r(lambda_km / 2.0, low, high, terminate, warnings);

    // Largest distance at which a free-space value is obtained in a
    // two-ray model with reflection coefficient -1.
    let d_y6_km = find_distance_at_delta_r(lambda_km / 6.0, low, high, terminate, warnings);

    // Break-distance heuristic, compensating for d_d being too small when
    // both terminals are low.
    if low.d_km >= path.d_d_km || path.d_d_km >= path.d_ml_km {
        if low.d_km > d_y6_km || d_y6_km > path.d_ml_km {
            path.d_0_km = low.d_km;
        } else {
            path.d_0_km = d_y6_km;
        }
    } else if path.d_d_km < d_y6_km && d_y6_km < path.d_ml_km {
        path.d_0_km = d_y6_km;
    } else {
        path.d_0_km = path.d_d_km;
    }

    // Walk d_0 forward 1 m at a time so it lands on a distance the ray
    // geometry can actually produce, without leaving the LOS region.
    let mut d_temp_km = path.d_0_km;
    for _ in 0..MAX_TUNE_STEPS {
        let psi = find_psi_at_distance(d_temp_km, low, high);
        let probe = ray_optics(low, high, psi);
        if probe.d_km >= path.d_0_km || (d_temp_km + 0.001) >= path.d_ml_km {
            path.d_0_km = probe.d_km;
            break;
        }
        d_temp_km += 0.001;
    }

    // Loss at the break distance anchors the interpolation toward d_ML.
    let psi_d0 = find_psi_at_distance(path.d_0_km, low, high);
    let mut geo_d0 = ray_optics(low, high, psi_d0);
    path_loss(
        psi_d0,
        path,
        f_mhz,
        psi_limit,
        a_dml_db,
        0.0,
        polarization,
        &mut geo_d0,
    );

    let psi = find_psi_at_distance(d_km, low, high);
    let mut geo = ray_optics(low, high, psi);
    let r_tg = path_loss(
        psi,
        path,
        f_mhz,
        psi_limit,
        a_dml_db,
        geo_d0.a_los_db,
        polarization,
        &mut geo,
    );

    // Atmospheric absorption along the direct ray.
    let (r_eo_km, r_ew_km) = absorption::los_effective_ray_lengths(
        geo.z_km[0],
        geo.z_km[1],
        geo.a_a_km,
        geo.r_0_km,
        geo.theta_h1_rad,
    );
    let absorption_loss_db = gamma.gamma_oo * r_eo_km + gamma.gamma_ow * r_ew_km;

    let free_space_loss_db = 20.0 * geo.r_0_km.log10() + 20.0 * f_mhz.log10() + 32.45;

    // Weight of the long-term variability by the elevation of the low
    // terminal's horizon ray.
    let f_theta_h = if geo.theta_h1_rad <= 0.0 {
        1.0
    } else if geo.theta_h1_rad >= 1.0 {
        0.0
    } else {
        (0.5 - (1.0 / PI) * (20.0 * (32.0 * geo.theta_h1_rad).log10()).atan()).max(0.0)
    };

    let (y_e_db, _) = variability::long_term_variability(
        low.d_km,
        high.d_km,
        d_km,
        f_mhz,
        p_percent,
        f_theta_h,
        geo.a_los_db,
    );
    let (y_e_50_db, a_y_db) = variability::long_term_variability(
        low.d_km,
        high.d_km,
        d_km,
        f_mhz,
        50.0,
        f_theta_h,
        geo.a_los_db,
    );

    let f_ay = if a_y_db <= 0.0 {
        1.0
    } else if a_y_db >= 9.0 {
        0.1
    } else {
        (1.1 + 0.9 * ((a_y_db / 9.0) * PI).cos()) / 2.0
    };

    let f_delta_r = if geo.delta_r_km >= lambda_km / 2.0 {
        1.0
    } else if geo.delta_r_km <= lambda_km / 6.0 {
        0.1
    } else {
        0.5 * (1.1
            - 0.9 * (((3.0 * PI) / lambda_km) * (geo.delta_r_km - lambda_km / 6.0)).cos())
    };

    let r_s = r_tg * f_delta_r * f_ay;

    // Surface-multipath contribution to the fading parameter, scaled by
    // frequency and ray length.
    let y_pi_99_db = 10.0 * (f_mhz * geo.r_0_km.powi(3)).log10() - 84.26;
    let k_t_db = nakagami_rice::find_k_for_y_pi_99(y_pi_99_db);
    let w_a = 10_f64.powf(k_t_db / 10.0);
    let w_r = r_s * r_s + 0.01 * 0.01;
    let w = w_r + w_a;

    let k_los_db = if w <= 0.0 {
        -40.0
    } else {
        (10.0 * w.log10()).max(-40.0)
    };

    let y_pi_db = nakagami_rice::nakagami_rice(k_los_db, p_percent);
    let y_total_db =
        -variability::combine_distributions(y_e_50_db, y_e_db, 0.0, y_pi_db, p_percent);

    let loss_db = free_space_loss_db + absorption_loss_db - geo.a_los_db + y_total_db;

    LineOfSightOutcome {
        geometry: LineOfSightGeometry {
            r_0_km: geo.r_0_km,
            r_12_km: geo.r_12_km,
            theta_h1_rad: geo.theta_h1_rad,
            theta_h2_rad: geo.theta_h2_rad,
            a_a_km: geo.a_a_km,
            delta_r_km: geo.delta_r_km,
            loss_db: geo.a_los_db,
        },
        free_space_loss_db,
        absorption_loss_db,
        loss_db,
        k_los_db,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn test_terminal(h_km: f64) -> Terminal {
        let gamma = SpecificAttenuation {
            gamma_oo: 0.01,
            gamma_ow: 0.0,
        };
        let mut warnings = Warnings::default();
        crate::terminal::solve(h_km, gamma, &mut warnings)
    }

    #[test]
    fn grazing_reflection_is_total() {
        // At zero grazing angle the ground reflects fully with a 180 degree
        // phase reversal for both polarizations.
        for pol in [Polarization::Horizontal, Polarization::Vertical] {
            let (r_g, phi_g) = reflection_coefficients(0.0, 300.0, pol);
            assert_abs_diff_eq!(r_g, 1.0, epsilon = 1e-9);
            assert_abs_diff_eq!(phi_g.abs(), std::f64::consts::PI, epsilon = 1e-9);
        }
    }

    #[test]
    fn vertical_reflection_weaker_at_steep_angles() {
        let (r_h, _) = reflection_coefficients(0.5, 300.0, Polarization::Horizontal);
        let (r_v, _) = reflection_coefficients(0.5, 300.0, Polarization::Vertical);
        assert!(r_v < r_h);
        assert!(r_h < 1.0);
    }

    #[test]
    fn ray_optics_distance_is_monotone_in_psi() {
        let low = test_terminal(0.01);
        let high = test_terminal(1.0);
        let d_steep = ray_optics(&low, &high, 0.5).d_km;
        let d_shallow = ray_optics(&low, &high, 0.01).d_km;
        assert!(d_shallow > d_steep);
    }

    #[test]
    fn psi_search_recovers_distance() {
        let low = test_terminal(0.01);
        let high = test_terminal(1.0);
        let psi = find_psi_at_distance(40.0, &low, &high);
        let geo = ray_optics(&low, &high, psi);
        assert_relative_eq!(geo.d_km, 40.0, epsilon = 2e-3);
    }

    #[test]
    fn direct_ray_no_shorter_than_height_difference() {
        let low = test_terminal(0.01);
        let high = test_terminal(10.0);
        let psi = find_psi_at_distance(100.0, &low, &high);
        let geo = ray_optics(&low, &high, psi);
        assert!(geo.r_0_km >= (high.h_km - low.h_km) - 1e-6);
        assert!(geo.r_12_km >= geo.r_0_km);
    }
}

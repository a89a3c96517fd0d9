//! Input normalization, mode selection, and composition of the regional
//! models into one loss figure.

use tracing::debug;

use crate::absorption::{self, SpecificAttenuation};
use crate::constants::{A_E_KM, SCATTERING_ANGLE_BLEND_RAD};
use crate::error::{PredictionError, PredictionResult};
use crate::nakagami_rice;
use crate::terminal;
use crate::transhorizon::{self, Crossover, CrossoverCase};
use crate::troposcatter::troposcatter;
use crate::types::{
    Path, Polarization, Prediction, PredictionEx, PropagationMode, Terminal,
    TroposcatterGeometry, Warnings,
};
use crate::variability;
use crate::{los, ray_trace};

/// Width of the blend window joining the line-of-sight region to the
/// transhorizon models, starting at the maximum line-of-sight distance.
const LOS_BLEND_WIDTH_KM: f64 = 2.0;

/// Half-width of the blend window straddling the diffraction/troposcatter
/// crossover distance.
const CROSSOVER_BLEND_HALF_WIDTH_KM: f64 = 1.0;

/// Validated and normalized inputs for one prediction.
pub(crate) struct Inputs {
    pub d_km: f64,
    pub h_low_km: f64,
    pub h_high_km: f64,
    pub f_mhz: f64,
    pub polarization: Polarization,
    pub p_percent: f64,
    pub warnings: Warnings,
}

/// Validate raw inputs, returning the normalized set or a fatal error.
///
/// Out-of-range but usable values are clamped with a warning bit rather
/// than rejected; terminals are ordered so the low one comes first.
pub(crate) fn normalize(
    d_km: f64,
    h_1_meter: f64,
    h_2_meter: f64,
    f_mhz: f64,
    polarization: Polarization,
    time_fraction: f64,
) -> PredictionResult<Inputs> {
    if !d_km.is_finite()
        || !h_1_meter.is_finite()
        || !h_2_meter.is_finite()
        || !f_mhz.is_finite()
        || !time_fraction.is_finite()
    {
        return Err(PredictionError::NonFiniteInput);
    }
    if d_km < 0.0 {
        return Err(PredictionError::InvalidDistance { d_km });
    }
    if h_1_meter < 0.0 {
        return Err(PredictionError::InvalidTerminalHeight { h_m: h_1_meter });
    }
    if h_2_meter < 0.0 {
        return Err(PredictionError::InvalidTerminalHeight { h_m: h_2_meter });
    }
    if f_mhz <= 0.0 {
        return Err(PredictionError::InvalidFrequency { f_mhz });
    }
    if time_fraction <= 0.0 || time_fraction >= 1.0 {
        return Err(PredictionError::InvalidTimeAvailability {
            fraction: time_fraction,
        });
    }

    let mut warnings = Warnings::default();

    let (mut h_low_m, mut h_high_m) = if h_1_meter <= h_2_meter {
        (h_1_meter, h_2_meter)
    } else {
        (h_2_meter, h_1_meter)
    };

    if h_low_m < 1.5 {
        h_low_m = 1.5;
        warnings.set(Warnings::LOW_TERMINAL_HEIGHT);
    }
    if h_high_m < 1.5 {
        h_high_m = 1.5;
        warnings.set(Warnings::HIGH_TERMINAL_HEIGHT);
    }
    if h_low_m > 20_000.0 {
        warnings.set(Warnings::LOW_TERMINAL_HEIGHT);
        h_low_m = h_low_m.min(100_000.0);
    }
    if h_high_m > 20_000.0 {
        warnings.set(Warnings::HIGH_TERMINAL_HEIGHT);
        h_high_m = h_high_m.min(100_000.0);
    }

    if !(100.0..=30_000.0).contains(&f_mhz) {
        warnings.set(Warnings::FREQUENCY_OUT_OF_BAND);
    }

    let mut p_percent = time_fraction * 100.0;
    if !(1.0..=99.0).contains(&p_percent) {
        p_percent = p_percent.clamp(1.0, 99.0);
        warnings.set(Warnings::TIME_PERCENT_CLAMPED);
    }

    Ok(Inputs {
        d_km,
        h_low_km: h_low_m / 1000.0,
        h_high_km: h_high_m / 1000.0,
        f_mhz,
        polarization,
        p_percent,
        warnings,
    })
}

/// Shared state for evaluating the transhorizon composition at a distance.
struct TranshorizonContext<'a> {
    low: &'a Terminal,
    high: &'a Terminal,
    path: &'a Path,
    crossover: &'a Crossover,
    f_mhz: f64,
    p_percent: f64,
    k_los_db: f64,
    gamma: SpecificAttenuation,
}

struct TranshorizonPoint {
    mode: PropagationMode,
    loss_db: f64,
    free_space_loss_db: f64,
    absorption_loss_db: f64,
    troposcatter: TroposcatterGeometry,
}

impl TranshorizonContext<'_> {
    /// Terrain attenuation and mode at `d_km`, with the crossover blend
    /// window applied.
    fn terrain_attenuation(&self, d_km: f64) -> (f64, PropagationMode, TroposcatterGeometry) {
        let a_d_db = self.crossover.line.loss_at(d_km);
        let mut tropo = troposcatter(self.low, self.high, d_km, self.f_mhz);

        if tropo.d_s_km > 1.0 {
            let ahead = troposcatter(self.low, self.high, d_km + 1.0, self.f_mhz);
            tropo.slope_db_per_km = ahead.loss_db - tropo.loss_db;
        }

        if self.crossover.case == CrossoverCase::DiffractionOnly {
            return (a_d_db, PropagationMode::Diffraction, tropo);
        }

        let d_crx_km = self.crossover.d_crx_km;

        // Loss the scatter side of the crossover would report.  When the
        // scatter value sits above the diffraction line the lower-loss
        // mode wins.
        let (scatter_side, scatter_mode) = match self.crossover.case {
            CrossoverCase::TroposcatterAbove if tropo.loss_db > a_d_db => {
                (a_d_db, PropagationMode::Diffraction)
            }
            _ => (tropo.loss_db, PropagationMode::Troposcatter),
        };

        if d_km <= d_crx_km - CROSSOVER_BLEND_HALF_WIDTH_KM {
            (a_d_db, PropagationMode::Diffraction, tropo)
        } else if d_km >= d_crx_km + CROSSOVER_BLEND_HALF_WIDTH_KM {
            (scatter_side, scatter_mode, tropo)
        } else {
            let w = (d_km - (d_crx_km - CROSSOVER_BLEND_HALF_WIDTH_KM))
                / (2.0 * CROSSOVER_BLEND_HALF_WIDTH_KM);
            let a_t_db = (1.0 - w) * a_d_db + w * scatter_side;
            let mode = if d_km < d_crx_km {
                PropagationMode::Diffraction
            } else {
                scatter_mode
            };
            (a_t_db, mode, tropo)
        }
    }

    fn evaluate(&self, d_km: f64) -> TranshorizonPoint {
        let (a_t_db, mode, tropo) = self.terrain_attenuation(d_km);

        // Long-term variability; the horizon factor is unity for
        // transhorizon paths.
        let (y_e_db, _) = variability::long_term_variability(
            self.low.d_km,
            self.high.d_km,
            d_km,
            self.f_mhz,
            self.p_percent,
            1.0,
            -a_t_db,
        );
        let (y_e_50_db, _) = variability::long_term_variability(
            self.low.d_km,
            self.high.d_km,
            d_km,
            self.f_mhz,
            50.0,
            1.0,
            -a_t_db,
        );

        // Fading parameter ramps from the line-of-sight value up to full
        // scatter over the first 1.5 degrees of scattering angle.
        let k_t_db = if tropo.theta_s_rad <= 0.0 {
            self.k_los_db
        } else if tropo.theta_s_rad >= SCATTERING_ANGLE_BLEND_RAD {
            20.0
        } else {
            (tropo.theta_s_rad * (20.0 - self.k_los_db) / SCATTERING_ANGLE_BLEND_RAD)
                + self.k_los_db
        };

        let y_pi_db = nakagami_rice::nakagami_rice(k_t_db, self.p_percent);
        let y_total_db =
            variability::combine_distributions(y_e_50_db, y_e_db, 0.0, y_pi_db, self.p_percent);

        let absorption_loss_db =
            absorption::transhorizon_absorption(self.low, self.high, self.path, &tropo, self.gamma);

        // Ray length up the common volume for the free-space reference.
        let a_v_km = if tropo.h_v_km > 0.0 {
            match ray_trace::trace(0.0, tropo.h_v_km, std::f64::consts::FRAC_PI_2) {
                Ok(traced) if traced.a_km.is_finite() && traced.a_km > 0.0 => traced.a_km,
                _ => tropo.h_v_km,
            }
        } else {
            0.0
        };

        let r_fs_km = self.low.a_km + self.high.a_km + 2.0 * a_v_km;
        let free_space_loss_db = 20.0 * self.f_mhz.log10() + 20.0 * r_fs_km.log10() + 32.45;

        let loss_db = free_space_loss_db + absorption_loss_db + a_t_db - y_total_db;

        TranshorizonPoint {
            mode,
            loss_db,
            free_space_loss_db,
            absorption_loss_db,
            troposcatter: tropo,
        }
    }
}

/// Run the full prediction for normalized inputs.
pub(crate) fn evaluate(inputs: Inputs) -> PredictionResult<PredictionEx> {
    let Inputs {
        d_km,
        h_low_km,
        h_high_km,
        f_mhz,
        polarization,
        p_percent,
        mut warnings,
    } = inputs;

    // Coincident terminals at zero distance have no path at all; report
    // the documented sentinel instead of NaN arithmetic.
    if d_km == 0.0 && h_low_km == h_high_km {
        let prediction = Prediction {
            mode: PropagationMode::LineOfSight,
            distance_km: 0.0,
            loss_db: f64::NEG_INFINITY,
            free_space_loss_db: f64::NEG_INFINITY,
            absorption_loss_db: 0.0,
            low_terminal_elevation_rad: 0.0,
            warnings,
        };
        return Ok(PredictionEx {
            prediction,
            low_terminal: Terminal::default(),
            high_terminal: Terminal::default(),
            path: Path::default(),
            line_of_sight: Default::default(),
            troposcatter: Default::default(),
        });
    }

    let gamma = absorption::specific_attenuation(f_mhz);

    let low = terminal::solve(h_low_km, gamma, &mut warnings);
    let high = terminal::solve(h_high_km, gamma, &mut warnings);

    if (low.a_e_km - high.a_e_km).abs() > 1e-9 {
        return Err(PredictionError::GeometryInconsistency {
            a_e_low_km: low.a_e_km,
            a_e_high_km: high.a_e_km,
        });
    }

    let mut path = Path {
        d_ml_km: low.d_km + high.d_km,
        d_0_km: 0.0,
        d_d_km: 0.0,
        a_e_km: A_E_KM,
    };

    let (line, a_dml_db, d_d_km) =
        transhorizon::fit_diffraction_line(&low, &high, path.d_ml_km, f_mhz, polarization);
    path.d_d_km = d_d_km;

    debug!(
        d_km,
        d_ml_km = path.d_ml_km,
        f_mhz,
        "path assembled"
    );

    // Deep in the line-of-sight region no transhorizon machinery runs.
    if d_km <= path.d_ml_km {
        let outcome = los::line_of_sight(
            &mut path,
            &low,
            &high,
            f_mhz,
            -a_dml_db,
            p_percent,
            d_km,
            polarization,
            gamma,
            &mut warnings,
        );

        let prediction = Prediction {
            mode: PropagationMode::LineOfSight,
            distance_km: d_km,
            loss_db: outcome.loss_db,
            free_space_loss_db: outcome.free_space_loss_db,
            absorption_loss_db: outcome.absorption_loss_db,
            low_terminal_elevation_rad: outcome.geometry.theta_h1_rad,
            warnings,
        };
        return Ok(PredictionEx {
            prediction,
            low_terminal: low,
            high_terminal: high,
            path,
            line_of_sight: outcome.geometry,
            troposcatter: TroposcatterGeometry::default(),
        });
    }

    // Transhorizon. The fading parameter at the boundary comes from the
    // line-of-sight model just inside the horizon.
    let d_inside_km = (path.d_ml_km - 1.0).max(0.0);
    let boundary_outcome = los::line_of_sight(
        &mut path,
        &low,
        &high,
        f_mhz,
        -a_dml_db,
        p_percent,
        d_inside_km,
        polarization,
        gamma,
        &mut warnings,
    );
    let k_los_db = boundary_outcome.k_los_db;

    let crossover = transhorizon::search_crossover(&low, &high, &path, f_mhz, a_dml_db, line);
    if crossover.case == CrossoverCase::DiffractionOnly {
        warnings.set(Warnings::TRANSHORIZON_BLEND_REGION);
    }

    let context = TranshorizonContext {
        low: &low,
        high: &high,
        path: &path,
        crossover: &crossover,
        f_mhz,
        p_percent,
        k_los_db,
        gamma,
    };

    let point = context.evaluate(d_km);

    // Just past the horizon, feather the transhorizon loss into the
    // line-of-sight value at the boundary so the curve stays continuous.
    let (mode, loss_db) = if d_km < path.d_ml_km + LOS_BLEND_WIDTH_KM {
        let d_ml_km = path.d_ml_km;
        let boundary = los::line_of_sight(
            &mut path,
            &low,
            &high,
            f_mhz,
            -a_dml_db,
            p_percent,
            d_ml_km,
            polarization,
            gamma,
            &mut warnings,
        );
        let w = (d_km - path.d_ml_km) / LOS_BLEND_WIDTH_KM;
        let blended = (1.0 - w) * boundary.loss_db + w * point.loss_db;
        let mode = if d_km < path.d_ml_km + LOS_BLEND_WIDTH_KM / 2.0 {
            PropagationMode::LineOfSight
        } else {
            point.mode
        };
        (mode, blended)
    } else {
        (point.mode, point.loss_db)
    };

    let prediction = Prediction {
        mode,
        distance_km: d_km,
        loss_db,
        free_space_loss_db: point.free_space_loss_db,
        absorption_loss_db: point.absorption_loss_db,
        low_terminal_elevation_rad: low.theta_rad,
        warnings,
    };

    Ok(PredictionEx {
        prediction,
        low_terminal: low,
        high_terminal: high,
        path,
        line_of_sight: boundary_outcome.geometry,
        troposcatter: point.troposcatter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn normalization_orders_terminals() {
        let inputs = normalize(100.0, 10_000.0, 10.0, 500.0, Polarization::Horizontal, 0.5)
            .unwrap();
        assert!(inputs.h_low_km < inputs.h_high_km);
        assert_abs_diff_eq!(inputs.h_low_km, 0.01, epsilon = 1e-12);
    }

    #[test]
    fn normalization_flags_low_heights() {
        let inputs = normalize(100.0, 0.5, 1000.0, 500.0, Polarization::Horizontal, 0.5)
            .unwrap();
        assert!(inputs.warnings.low_terminal_height_limited());
        assert_abs_diff_eq!(inputs.h_low_km, 0.0015, epsilon = 1e-12);
    }

    #[test]
    fn normalization_rejects_bad_inputs() {
        assert!(matches!(
            normalize(-1.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5),
            Err(PredictionError::InvalidDistance { .. })
        ));
        assert!(matches!(
            normalize(10.0, 10.0, 1000.0, -5.0, Polarization::Horizontal, 0.5),
            Err(PredictionError::InvalidFrequency { .. })
        ));
        assert!(matches!(
            normalize(10.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 1.0),
            Err(PredictionError::InvalidTimeAvailability { .. })
        ));
        assert!(matches!(
            normalize(f64::NAN, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5),
            Err(PredictionError::NonFiniteInput)
        ));
    }

    #[test]
    fn normalization_clamps_time_percent() {
        let inputs = normalize(10.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.999)
            .unwrap();
        assert_abs_diff_eq!(inputs.p_percent, 99.0, epsilon = 1e-12);
        assert!(inputs.warnings.time_percent_clamped());
    }

    #[test]
    fn zero_distance_equal_heights_is_sentinel() {
        let inputs = normalize(0.0, 10.0, 10.0, 500.0, Polarization::Horizontal, 0.5).unwrap();
        let ex = evaluate(inputs).unwrap();
        assert!(ex.prediction.loss_db.is_infinite());
        assert!(ex.prediction.loss_db < 0.0);
        assert_eq!(ex.prediction.mode, PropagationMode::LineOfSight);
    }
}

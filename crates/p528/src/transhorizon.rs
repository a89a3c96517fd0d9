//! Beyond-the-horizon machinery: the diffraction line fitted just past
//! the maximum line-of-sight distance, and the search for the crossover
//! into the troposcatter region.

use tracing::debug;

use crate::constants::A_E_KM;
use crate::diffraction::smooth_earth_diffraction;
use crate::troposcatter::troposcatter;
use crate::types::{Path, Polarization, Terminal};

/// Linear diffraction loss model, `loss = m_d * d + a_d0`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DiffractionLine {
    pub m_d_db_per_km: f64,
    pub a_d0_db: f64,
}

impl DiffractionLine {
    pub fn loss_at(&self, d_km: f64) -> f64 {
        self.m_d_db_per_km * d_km + self.a_d0_db
    }
}

/// Fit the diffraction line through two probe distances beyond the
/// maximum line-of-sight distance.
///
/// Returns the line, its value at `d_ml`, and the distance at which it
/// predicts zero loss (used by the two-ray break-distance heuristic).
pub(crate) fn fit_diffraction_line(
    low: &Terminal,
    high: &Terminal,
    d_ml_km: f64,
    f_mhz: f64,
    polarization: Polarization,
) -> (DiffractionLine, f64, f64) {
    let probe_offset_km = (A_E_KM * A_E_KM / f_mhz).powf(1.0 / 3.0);
    let d_3_km = d_ml_km + 0.5 * probe_offset_km;
    let d_4_km = d_ml_km + 1.5 * probe_offset_km;

    let a_3_db = smooth_earth_diffraction(low.d_km, high.d_km, f_mhz, d_3_km, polarization);
    let a_4_db = smooth_earth_diffraction(low.d_km, high.d_km, f_mhz, d_4_km, polarization);

    let m_d = (a_4_db - a_3_db) / (d_4_km - d_3_km);
    let a_d0 = a_4_db - m_d * d_4_km;

    let line = DiffractionLine {
        m_d_db_per_km: m_d,
        a_d0_db: a_d0,
    };
    let a_dml_db = line.loss_at(d_ml_km);
    let d_d_km = -(a_d0 / m_d);

    (line, a_dml_db, d_d_km)
}

/// How the diffraction and troposcatter regions join at the crossover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CrossoverCase {
    /// Troposcatter already exceeded the diffraction line at the
    /// crossover; the lower-loss mode wins beyond it.
    TroposcatterAbove,
    /// The line was re-anchored through the troposcatter value so the
    /// transition is continuous; troposcatter applies beyond.
    LineReanchored,
    /// The search exhausted without the troposcatter slope dropping below
    /// the line; diffraction applies at all transhorizon distances.
    DiffractionOnly,
}

pub(crate) struct Crossover {
    pub line: DiffractionLine,
    pub d_crx_km: f64,
    pub case: CrossoverCase,
}

/// Step outward from the maximum line-of-sight distance in 1 km
/// increments until the troposcatter slope falls below the diffraction
/// line slope, marking the crossover distance.
///
/// May re-anchor the line through the last troposcatter point to keep the
/// composed loss continuous at `d_ml`.
pub(crate) fn search_crossover(
    low: &Terminal,
    high: &Terminal,
    path: &Path,
    f_mhz: f64,
    a_dml_db: f64,
    mut line: DiffractionLine,
) -> Crossover {
    const SEARCH_LIMIT: usize = 100;

    let mut d_search_km = [path.d_ml_km + 3.0, path.d_ml_km + 2.0];
    let mut a_s_db = [0.0_f64; 2];
    let mut valid_points = 0usize;

    for _ in 0..SEARCH_LIMIT {
        a_s_db[1] = a_s_db[0];

        let tropo = troposcatter(low, high, d_search_km[0], f_mhz);
        a_s_db[0] = tropo.loss_db;

        // Below 20 dB the scatter model is outside its valid region.
        if tropo.loss_db >= 20.0 {
            valid_points += 1;
            if valid_points > 1 {
                let m_s = (a_s_db[0] - a_s_db[1]) / (d_search_km[0] - d_search_km[1]);
                if m_s <= line.m_d_db_per_km {
                    let d_crx_km = d_search_km[0];

                    let a_d_db = line.loss_at(d_search_km[1]);
                    let case = if a_s_db[1] >= a_d_db {
                        CrossoverCase::TroposcatterAbove
                    } else {
                        // Pivot the line about (d_ml, a_dml) through the
                        // scatter point so the join is continuous.
                        let m_d = (a_s_db[1] - a_dml_db) / (d_search_km[1] - path.d_ml_km);
                        line = DiffractionLine {
                            m_d_db_per_km: m_d,
                            a_d0_db: a_s_db[1] - m_d * d_search_km[1],
                        };
                        CrossoverCase::LineReanchored
                    };

                    debug!(d_crx_km, ?case, "transhorizon crossover");
                    return Crossover {
                        line,
                        d_crx_km,
                        case,
                    };
                }
            }
        }

        d_search_km[1] = d_search_km[0];
        d_search_km[0] += 1.0;
    }

    debug!("transhorizon search exhausted, diffraction only");
    Crossover {
        line,
        d_crx_km: d_search_km[1],
        case: CrossoverCase::DiffractionOnly,
    }
}

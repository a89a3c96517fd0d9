//! Nakagami-Rice short-term fading statistics.
//!
//! The received envelope is modelled as a steady component of unit power
//! plus a Rayleigh-scattered component whose power relative to the steady
//! component is `10^(K/10)`.  Quantiles of the power distribution are
//! computed numerically from the Marcum Q exceedance function rather than
//! from tabulated curves, so any `K` in the working range is supported.

use std::sync::OnceLock;

use statrs::function::gamma::{gamma_ur, ln_gamma};

/// K below which the scattered power is small enough that the power
/// fluctuation is treated as Gaussian about the steady level.
const K_GAUSSIAN_LIMB_DB: f64 = -20.0;

const K_TABLE_LO_DB: f64 = -40.0;
const K_TABLE_HI_DB: f64 = 20.0;
const K_TABLE_STEP_DB: f64 = 0.25;
const K_TABLE_LEN: usize = 241;

/// `Y_pi(K, 99)` sampled over the working K range.  The curve is a fixed
/// function of K, so it is computed once and shared by every solver call
/// instead of re-running the quantile bisections per prediction.
fn y_pi_99_curve() -> &'static [f64; K_TABLE_LEN] {
    static CURVE: OnceLock<[f64; K_TABLE_LEN]> = OnceLock::new();
    CURVE.get_or_init(|| {
        let mut curve = [0.0; K_TABLE_LEN];
        for (i, y) in curve.iter_mut().enumerate() {
            *y = nakagami_rice(K_TABLE_LO_DB + K_TABLE_STEP_DB * i as f64, 99.0);
        }
        curve
    })
}

/// Probability that the received power exceeds `w` for scattered power `s2`
/// (linear, relative to the steady component).
///
/// This is the Marcum Q function `Q_1(a, b)` with `a^2 = 2 / s2` and
/// `b^2 = 2 w / s2`, evaluated through its Poisson-weighted series of
/// upper incomplete gamma terms.
fn exceedance(w: f64, s2: f64) -> f64 {
    if w <= 0.0 {
        return 1.0;
    }

    let lambda = 1.0 / s2; // a^2 / 2
    let y = w / s2; // b^2 / 2

    // The Poisson weights peak near k = lambda; sum far enough past the
    // peak that the tail contribution is negligible.
    let n_terms = (lambda + 10.0 * lambda.sqrt() + 30.0).ceil() as usize;

    let mut sum = 0.0;
    for k in 0..n_terms {
        let kf = k as f64;
        let ln_pois = -lambda + kf * lambda.ln() - ln_gamma(kf + 1.0);
        if ln_pois < -700.0 {
            continue;
        }
        sum += ln_pois.exp() * gamma_ur(kf + 1.0, y);
    }

    sum.clamp(0.0, 1.0)
}

/// Power level `w` exceeded with probability `q`, for scattered power `s2`.
fn quantile(q: f64, s2: f64) -> f64 {
    // Bracket the root.  Mean power is 1 + s2, so the upper quantiles sit
    // within a few standard deviations of that.
    let mut lo = 0.0;
    let mut hi = 1.0 + s2;
    while exceedance(hi, s2) > q {
        hi *= 2.0;
    }

    for _ in 0..80 {
        let mid = 0.5 * (lo + hi);
        if exceedance(mid, s2) > q {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    0.5 * (lo + hi)
}

/// Inverse of the standard normal survival function, `z` such that
/// `P(X > z) = q`.
pub(crate) fn inverse_complementary_normal(q: f64) -> f64 {
    use statrs::distribution::{ContinuousCDF, Normal};

    // Unit normal construction cannot fail.
    let normal = Normal::new(0.0, 1.0).unwrap_or_else(|_| unreachable!());
    normal.inverse_cdf(1.0 - q)
}

/// Variability `Y_pi(K, p)` in dB of the Nakagami-Rice distribution:
/// the deviation of the level exceeded `p` percent of the time from the
/// median level.  Positive for `p > 50` (fades), negative for `p < 50`
/// (enhancements).
pub fn nakagami_rice(k_db: f64, p_percent: f64) -> f64 {
    let q = p_percent / 100.0;
    let s2 = 10_f64.powf(k_db / 10.0);

    if k_db < K_GAUSSIAN_LIMB_DB {
        // Steady component dominates; the power fluctuation about unity
        // has a standard deviation of sqrt(s2 / 2).
        let sigma = (s2 / 2.0).sqrt();
        let z_p = inverse_complementary_normal(q);
        let w_p = (1.0 + 2.0 * sigma * z_p).max(1e-12);
        return -10.0 * w_p.log10();
    }

    let w_50 = quantile(0.5, s2);
    let w_p = quantile(q, s2);

    10.0 * (w_50.log10() - w_p.log10())
}

/// Solve for the `K` whose distribution has the given 99% variability.
///
/// `Y_pi(K, 99)` increases monotonically with `K`; the inverse is read
/// from the cached curve by interpolation.  Out-of-range targets clamp to
/// the endpoints.
pub fn find_k_for_y_pi_99(y_pi_99_db: f64) -> f64 {
    let curve = y_pi_99_curve();

    if y_pi_99_db <= curve[0] {
        return K_TABLE_LO_DB;
    }
    if y_pi_99_db >= curve[K_TABLE_LEN - 1] {
        return K_TABLE_HI_DB;
    }

    let i = curve.partition_point(|&y| y < y_pi_99_db);
    let t = (y_pi_99_db - curve[i - 1]) / (curve[i] - curve[i - 1]);
    K_TABLE_LO_DB + K_TABLE_STEP_DB * (i as f64 - 1.0 + t)
}

//! # p528
//!
//! Basic transmission loss prediction for aeronautical and satellite paths
//! following Recommendation ITU-R P.528.
//!
//! The model covers ground-to-air paths from 100 MHz to 30 GHz out to
//! 1800 km, combining three regional sub-models:
//!
//! - **Line of sight**: two-ray optics over a curved earth with ground
//!   reflection and surface-multipath fading
//! - **Diffraction**: smooth-earth diffraction linearized just beyond the
//!   radio horizon
//! - **Troposcatter**: forward scatter from the common volume above the
//!   horizon-ray crossover
//!
//! Long-term (hourly-median) variability and short-term Nakagami-Rice
//! fading are combined to give the loss not exceeded for a chosen fraction
//! of time.
//!
//! ## Example
//!
//! ```no_run
//! use p528::{predict, Polarization};
//!
//! let prediction = predict(100.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5)?;
//! println!("loss at 100 km: {:.1} dB", prediction.loss_db);
//! # Ok::<(), p528::PredictionError>(())
//! ```

mod absorption;
mod constants;
mod diffraction;
mod error;
mod los;
mod mode;
mod nakagami_rice;
mod ray_trace;
mod terminal;
mod transhorizon;
mod troposcatter;
mod types;
mod variability;

pub use error::{PredictionError, PredictionResult};
pub use types::{
    LineOfSightGeometry, Path, Polarization, Prediction, PredictionEx, PropagationMode,
    Terminal, TroposcatterGeometry, Warnings,
};

/// Predict the basic transmission loss between two terminals.
///
/// * `d_km` - great-circle path distance, in km
/// * `h_1_meter`, `h_2_meter` - terminal heights above mean sea level, in
///   meters (order does not matter)
/// * `f_mhz` - frequency, in MHz
/// * `polarization` - polarization of the radiated field
/// * `time_fraction` - fraction of time the loss is not exceeded, in
///   (0, 1) exclusive
///
/// Out-of-range but usable inputs are clamped and flagged in
/// [`Prediction::warnings`]; unusable inputs return an error.
pub fn predict(
    d_km: f64,
    h_1_meter: f64,
    h_2_meter: f64,
    f_mhz: f64,
    polarization: Polarization,
    time_fraction: f64,
) -> PredictionResult<Prediction> {
    predict_ex(d_km, h_1_meter, h_2_meter, f_mhz, polarization, time_fraction)
        .map(|ex| ex.prediction)
}

/// Like [`predict`], but also returns the intermediate terminal, path,
/// two-ray, and troposcatter geometries for diagnostics.
pub fn predict_ex(
    d_km: f64,
    h_1_meter: f64,
    h_2_meter: f64,
    f_mhz: f64,
    polarization: Polarization,
    time_fraction: f64,
) -> PredictionResult<PredictionEx> {
    let inputs = mode::normalize(d_km, h_1_meter, h_2_meter, f_mhz, polarization, time_fraction)?;
    mode::evaluate(inputs)
}

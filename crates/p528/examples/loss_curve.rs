//! Print a basic transmission loss curve for a ground-to-air path.
//!
//! Run with: cargo run --example loss_curve

use p528::{predict, Polarization, PredictionError};

fn main() -> Result<(), PredictionError> {
    let h_low_m = 10.0;
    let h_high_m = 10_000.0;
    let f_mhz = 1200.0;
    let time_fraction = 0.5;

    println!("# d_km  loss_db  free_space_db  mode");
    let mut d_km = 10.0;
    while d_km <= 1000.0 {
        let p = predict(
            d_km,
            h_low_m,
            h_high_m,
            f_mhz,
            Polarization::Horizontal,
            time_fraction,
        )?;
        println!(
            "{:6.0}  {:7.1}  {:7.1}  {:?}",
            d_km, p.loss_db, p.free_space_loss_db, p.mode
        );
        d_km += 10.0;
    }

    Ok(())
}

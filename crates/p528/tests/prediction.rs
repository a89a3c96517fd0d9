//! End-to-end prediction behavior across the model regions.

use p528::{predict, predict_ex, Polarization, PredictionError, PropagationMode};

fn loss(d_km: f64, h_1_m: f64, h_2_m: f64, f_mhz: f64, p: f64) -> f64 {
    predict(d_km, h_1_m, h_2_m, f_mhz, Polarization::Horizontal, p)
        .unwrap()
        .loss_db
}

#[test]
fn reference_case_los_500_mhz() {
    // 15 km, 10 m / 1000 m terminals, 500 MHz, median. Published value
    // is 110.0 dB; the absorption model here is the table variant, so the
    // comparison is loose.
    let a = loss(15.0, 10.0, 1000.0, 500.0, 0.50);
    assert!((a - 110.0).abs() < 3.0, "loss {a}");
}

#[test]
fn reference_case_90_percent_3600_mhz() {
    // 100 km, 100 m / 15 km terminals, 3600 MHz, 90%. Published 151.6 dB.
    let a = loss(100.0, 100.0, 15_000.0, 3600.0, 0.90);
    assert!((a - 151.6).abs() < 3.0, "loss {a}");
}

#[test]
fn reference_case_troposcatter_5700_mhz() {
    // 1500 km, 15 m / 10 km terminals, 5700 MHz, 10%. Published 293.4 dB.
    let a = loss(1500.0, 15.0, 10_000.0, 5700.0, 0.10);
    assert!((a - 293.4).abs() < 6.0, "loss {a}");
}

#[test]
fn loss_curve_is_continuous_across_the_horizon() {
    let ex = predict_ex(50.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5).unwrap();
    let d_ml = ex.path.d_ml_km;

    let mut prev = None;
    let mut d = d_ml - 3.0;
    while d <= d_ml + 3.0 {
        let a = loss(d, 10.0, 1000.0, 500.0, 0.5);
        if let Some(p) = prev {
            let step: f64 = a - p;
            assert!(
                step.abs() < 1.5,
                "jump of {step:.2} dB at d = {d:.1} km (d_ml = {d_ml:.1})"
            );
        }
        prev = Some(a);
        d += 0.1;
    }
}

#[test]
fn loss_curve_is_continuous_through_the_crossover() {
    let mut prev = None;
    let mut d = 200.0;
    while d <= 700.0 {
        let a = loss(d, 10.0, 1000.0, 500.0, 0.5);
        if let Some(p) = prev {
            let step: f64 = a - p;
            assert!(step.abs() < 5.0, "jump of {step:.2} dB at d = {d:.0} km");
        }
        prev = Some(a);
        d += 1.0;
    }
}

#[test]
fn free_space_loss_grows_with_distance() {
    let mut prev = 0.0;
    for d in [200.0, 400.0, 800.0, 1400.0] {
        let fs = predict(d, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5)
            .unwrap()
            .free_space_loss_db;
        assert!(fs > prev, "free-space loss not monotone at {d} km");
        prev = fs;
    }
}

#[test]
fn terminal_order_does_not_matter() {
    for d in [20.0, 300.0, 900.0] {
        let a = predict(d, 10.0, 8000.0, 1200.0, Polarization::Vertical, 0.5).unwrap();
        let b = predict(d, 8000.0, 10.0, 1200.0, Polarization::Vertical, 0.5).unwrap();
        assert_eq!(a.loss_db.to_bits(), b.loss_db.to_bits());
        assert_eq!(a.mode, b.mode);
    }
}

#[test]
fn short_path_is_line_of_sight() {
    let p = predict(1.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5).unwrap();
    assert_eq!(p.mode, PropagationMode::LineOfSight);
}

#[test]
fn long_path_is_troposcatter() {
    let p = predict(1000.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5).unwrap();
    assert_eq!(p.mode, PropagationMode::Troposcatter);
}

#[test]
fn zero_distance_equal_heights_returns_sentinel() {
    let p = predict(0.0, 50.0, 50.0, 500.0, Polarization::Horizontal, 0.5).unwrap();
    assert!(p.loss_db.is_infinite() && p.loss_db < 0.0);
    assert!(p.free_space_loss_db.is_infinite() && p.free_space_loss_db < 0.0);
    assert_eq!(p.mode, PropagationMode::LineOfSight);
    assert!(!p.warnings.has_warnings());
}

#[test]
fn zero_distance_distinct_heights_is_vertical_path() {
    let p = predict(0.0, 10.0, 5000.0, 500.0, Polarization::Horizontal, 0.5).unwrap();
    assert_eq!(p.mode, PropagationMode::LineOfSight);
    assert!(p.loss_db.is_finite());
    // Free-space loss for a ~5 km vertical hop at 500 MHz is near 100 dB.
    assert!((p.free_space_loss_db - 100.4).abs() < 2.0);
}

#[test]
fn out_of_band_frequency_is_flagged_not_rejected() {
    let p = predict(100.0, 10.0, 1000.0, 50.0, Polarization::Horizontal, 0.5).unwrap();
    assert!(p.warnings.frequency_out_of_band());
    assert!(p.loss_db.is_finite());
}

#[test]
fn above_range_heights_warn_but_predict() {
    // Heights past 20 km are outside the validated range but must still
    // produce a best-effort result with the height warning set, including
    // inputs clamped to the 100 km atmosphere ceiling.
    for h_2_m in [25_000.0, 99_800.0, 100_000.0, 250_000.0] {
        let p = predict(500.0, 10.0, h_2_m, 1000.0, Polarization::Horizontal, 0.5)
            .unwrap_or_else(|e| panic!("h_2 {h_2_m} m: {e}"));
        assert!(p.warnings.high_terminal_height_limited(), "h_2 {h_2_m} m");
        assert!(p.loss_db.is_finite(), "h_2 {h_2_m} m, loss {}", p.loss_db);
    }
}

#[test]
fn unusable_inputs_are_errors() {
    assert!(matches!(
        predict(-5.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5),
        Err(PredictionError::InvalidDistance { .. })
    ));
    assert!(matches!(
        predict(100.0, -1.0, 1000.0, 500.0, Polarization::Horizontal, 0.5),
        Err(PredictionError::InvalidTerminalHeight { .. })
    ));
    assert!(matches!(
        predict(100.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.0),
        Err(PredictionError::InvalidTimeAvailability { .. })
    ));
}

#[test]
fn higher_availability_costs_more_loss() {
    // Loss not exceeded 95% of the time must be at least the median loss.
    let median = loss(300.0, 10.0, 1000.0, 500.0, 0.50);
    let p95 = loss(300.0, 10.0, 1000.0, 500.0, 0.95);
    let p05 = loss(300.0, 10.0, 1000.0, 500.0, 0.05);
    assert!(p95 > median);
    assert!(p05 < median);
}

#[test]
fn extended_result_reports_geometry() {
    let ex = predict_ex(400.0, 10.0, 1000.0, 500.0, Polarization::Horizontal, 0.5).unwrap();
    assert!(ex.path.d_ml_km > 0.0);
    assert!(ex.low_terminal.d_km < ex.high_terminal.d_km);
    assert!(ex.troposcatter.d_s_km > 0.0);
    assert!(ex.troposcatter.h_v_km > 0.0);
}

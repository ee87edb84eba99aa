//! Imputation behaviour on realistic and random keypoint tables

use approx::assert_relative_eq;
use gait_kinematics::imputation::{missing_count, IterativeImputer, PassOutcome, RoundRobinImputer};
use ndarray::Array2;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Walking-like table: every column is a linear function of a time signal plus a sway signal
fn linear_table(rows: usize, cols: usize) -> Array2<f64> {
    Array2::from_shape_fn((rows, cols), |(i, j)| {
        let t = i as f64;
        let sway = (t * 0.3).sin();
        100.0 + 2.0 * j as f64 + t * (0.5 + j as f64 * 0.1) + sway * (j % 3) as f64
    })
}

#[test]
fn test_linear_relationship_is_recovered() {
    let truth = linear_table(60, 10);
    let mut table = truth.clone();
    for &(i, j) in &[(5, 2), (17, 2), (30, 7), (41, 7), (59, 9)] {
        table[[i, j]] = f64::NAN;
    }

    let filled = IterativeImputer::default().fill_missing_values(table).unwrap();
    assert_eq!(missing_count(&filled), 0);
    for &(i, j) in &[(5, 2), (17, 2), (30, 7), (41, 7), (59, 9)] {
        assert_relative_eq!(filled[[i, j]], truth[[i, j]], epsilon = 1e-6);
    }
}

#[test]
fn test_fill_is_idempotent() {
    let mut table = linear_table(40, 6);
    table[[3, 1]] = f64::NAN;
    table[[20, 4]] = f64::NAN;

    let imputer = IterativeImputer::default();
    let once = imputer.fill_missing_values(table).unwrap();
    let twice = imputer.fill_missing_values(once.clone()).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_pass_reports_each_stage() {
    let imputer = IterativeImputer::new(5, 10);

    let mut complete = linear_table(10, 3);
    assert_eq!(imputer.pass(&mut complete, None).unwrap(), PassOutcome::Complete);

    let mut gapped = linear_table(10, 3);
    gapped[[2, 0]] = f64::NAN;
    assert_eq!(imputer.pass(&mut gapped.clone(), Some(3)).unwrap(), PassOutcome::Converged { missing: 1 });
    assert_eq!(imputer.pass(&mut gapped, Some(100)).unwrap(), PassOutcome::Filled { missing: 1 });
    assert_eq!(missing_count(&gapped), 0);
}

#[test]
fn test_every_column_gapped_uses_fallback() {
    let mut rng = StdRng::seed_from_u64(7);
    let truth = linear_table(50, 8);
    let mut table = truth.clone();
    for j in 0..8 {
        let i = rng.gen_range(0..50);
        table[[i, j]] = f64::NAN;
    }

    let filled = IterativeImputer::default().fill_missing_values(table.clone()).unwrap();
    assert_eq!(filled.dim(), (50, 8));
    assert!(filled.iter().all(|v| v.is_finite()));
    for ((i, j), &v) in table.indexed_iter() {
        if !v.is_nan() {
            assert_eq!(filled[[i, j]], v);
        }
    }

    let again = RoundRobinImputer::default().fit_transform(&table).unwrap();
    assert_eq!(filled, again);
}

proptest! {
    #[test]
    fn prop_observed_cells_are_never_changed(
        seed in any::<u64>(),
        rows in 8usize..40,
        gaps in 1usize..20,
    ) {
        let mut rng = StdRng::seed_from_u64(seed);
        let cols = 6;
        let original = Array2::from_shape_fn((rows, cols), |_| rng.gen_range(1.0..500.0));
        let mut table = original.clone();
        // Column 0 stays complete so every pass has a predictor
        for _ in 0..gaps {
            let i = rng.gen_range(1..rows);
            let j = rng.gen_range(1..cols);
            table[[i, j]] = f64::NAN;
        }

        let filled = IterativeImputer::default().fill_missing_values(table.clone()).unwrap();
        prop_assert_eq!(missing_count(&filled), 0);
        for ((i, j), &v) in table.indexed_iter() {
            if !v.is_nan() {
                prop_assert_eq!(filled[[i, j]], v);
            }
        }
    }
}

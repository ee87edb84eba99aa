//! Benchmarks for missing-value imputation

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gait_kinematics::constants::NUM_COORDINATES;
use gait_kinematics::imputation::{IterativeImputer, RoundRobinImputer};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Smooth coordinate tracks with a fraction of cells knocked out
fn gapped_table(frames: usize, gap_fraction: f64, keep_first_column: bool) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(42);
    Array2::from_shape_fn((frames, NUM_COORDINATES), |(i, j)| {
        let t = i as f64 * 0.1;
        let value = 100.0 + j as f64 * 3.0 + 20.0 * (t + j as f64).sin() + rng.gen_range(-0.5..0.5);
        let protected = keep_first_column && j == 0;
        if !protected && rng.gen_bool(gap_fraction) {
            f64::NAN
        } else {
            value
        }
    })
}

fn benchmark_regression_passes(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterative_imputer");
    let imputer = IterativeImputer::default();

    for frames in [150, 300] {
        // Sparse gaps leave most columns complete
        let mut table = Array2::from_shape_fn((frames, NUM_COORDINATES), |(i, j)| {
            100.0 + j as f64 + (i as f64 * 0.1 + j as f64).sin() * 20.0
        });
        let mut rng = StdRng::seed_from_u64(frames as u64);
        for _ in 0..frames / 10 {
            let i = rng.gen_range(0..frames);
            let j = rng.gen_range(0..NUM_COORDINATES / 4);
            table[[i, j]] = f64::NAN;
        }

        group.bench_with_input(BenchmarkId::new("sparse_gaps", frames), &table, |b, table| {
            b.iter(|| black_box(imputer.fill_missing_values(black_box(table.clone())).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_round_robin(c: &mut Criterion) {
    let mut group = c.benchmark_group("round_robin_imputer");
    group.sample_size(10);

    for gap_fraction in [0.02, 0.1] {
        let table = gapped_table(150, gap_fraction, false);
        let imputer = RoundRobinImputer::default();
        group.bench_with_input(
            BenchmarkId::new("fit_transform", gap_fraction),
            &table,
            |b, table| {
                b.iter(|| black_box(imputer.fit_transform(black_box(table)).unwrap()));
            },
        );
    }

    let table = gapped_table(150, 0.05, true);
    group.bench_function("dense_gaps_with_complete_column", |b| {
        b.iter(|| black_box(IterativeImputer::default().fill_missing_values(table.clone()).unwrap()));
    });

    group.finish();
}

criterion_group!(benches, benchmark_regression_passes, benchmark_round_robin);
criterion_main!(benches);

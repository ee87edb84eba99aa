//! Benchmarks for the per-clip pipeline stages

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gait_kinematics::angles::AngleTable;
use gait_kinematics::constants::NUM_COORDINATES;
use gait_kinematics::cycle::GaitCycleSelector;
use gait_kinematics::fusion::{fuse_views, View};
use gait_kinematics::keypoints::{Joint, KeypointTable};
use gait_kinematics::scoring::FeatureVector;

/// Walking-like keypoints: legs swing sinusoidally with a little detector noise
fn walking_table(frames: usize) -> KeypointTable {
    let rows: Vec<Vec<f64>> = (0..frames)
        .map(|i| {
            let t = i as f64 * 0.2;
            let mut row = vec![10.0; NUM_COORDINATES];
            for (joint, x, y) in [
                (Joint::RShoulder, 90.0, 50.0),
                (Joint::LShoulder, 110.0, 50.0),
                (Joint::RHip, 90.0, 100.0),
                (Joint::LHip, 110.0, 100.0),
                (Joint::RKnee, 90.0 + 15.0 * t.sin(), 150.0),
                (Joint::LKnee, 110.0 - 15.0 * t.sin(), 150.0),
                (Joint::RAnkle, 90.0 + 25.0 * t.sin(), 200.0),
                (Joint::LAnkle, 110.0 - 25.0 * t.sin(), 200.0),
            ] {
                row[joint.x_column()] = x + 0.5 * rand::random::<f64>();
                row[joint.y_column()] = y + 0.5 * rand::random::<f64>();
            }
            row
        })
        .collect();
    KeypointTable::from_frames(&rows).unwrap()
}

fn benchmark_angles(c: &mut Criterion) {
    let mut group = c.benchmark_group("angles");

    for frames in [150, 300, 600] {
        let table = walking_table(frames);
        group.bench_with_input(BenchmarkId::new("from_keypoints", frames), &table, |b, table| {
            b.iter(|| black_box(AngleTable::from_keypoints(black_box(table))));
        });
    }

    group.finish();
}

fn benchmark_cycle_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("cycle_selection");
    let selector = GaitCycleSelector::default();

    for frames in [150, 600] {
        let angles = AngleTable::from_keypoints(&walking_table(frames));
        group.bench_with_input(BenchmarkId::new("select", frames), &angles, |b, angles| {
            b.iter(|| black_box(selector.select(black_box(angles)).unwrap()));
        });
    }

    group.finish();
}

fn benchmark_fusion_and_features(c: &mut Criterion) {
    let mut group = c.benchmark_group("fusion");
    let selector = GaitCycleSelector::default();

    let front = selector
        .select(&AngleTable::from_keypoints(&walking_table(150)))
        .unwrap()
        .table
        .select(&View::Front.columns())
        .unwrap();
    let side = selector
        .select(&AngleTable::from_keypoints(&walking_table(150)))
        .unwrap()
        .table
        .select(&View::Side.columns())
        .unwrap();

    group.bench_function("fuse_views", |b| {
        b.iter(|| black_box(fuse_views(black_box(&front), black_box(&side)).unwrap()));
    });

    let fused = fuse_views(&front, &side).unwrap();
    group.bench_function("feature_vector", |b| {
        b.iter(|| black_box(FeatureVector::from_fused(black_box(&fused))));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_angles,
    benchmark_cycle_selection,
    benchmark_fusion_and_features
);
criterion_main!(benches);

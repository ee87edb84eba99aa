//! Helper functions and utilities for tests

#![allow(dead_code)]

use gait_kinematics::constants::{KEYPOINT_RECORD_LEN, NUM_COORDINATES};
use gait_kinematics::keypoints::{Joint, KeypointTable};
use gait_kinematics::scoring::GaitClassifier;
use gait_kinematics::Result;
use std::path::Path;

/// Image coordinates of an upright subject with straight legs
pub const STANDING_POSE: [(Joint, f64, f64); 8] = [
    (Joint::RShoulder, 90.0, 50.0),
    (Joint::LShoulder, 110.0, 50.0),
    (Joint::RHip, 90.0, 100.0),
    (Joint::LHip, 110.0, 100.0),
    (Joint::RKnee, 90.0, 150.0),
    (Joint::LKnee, 110.0, 150.0),
    (Joint::RAnkle, 90.0, 200.0),
    (Joint::LAnkle, 110.0, 200.0),
];

/// One interleaved coordinate row of the standing pose; other joints sit at (10, 10)
pub fn standing_row() -> Vec<f64> {
    let mut row = vec![10.0; NUM_COORDINATES];
    for (joint, x, y) in STANDING_POSE {
        row[joint.x_column()] = x;
        row[joint.y_column()] = y;
    }
    row
}

/// `n` identical standing frames
pub fn standing_table(n: usize) -> Result<KeypointTable> {
    KeypointTable::from_frames(&vec![standing_row(); n])
}

/// `x, y, confidence` triples for an interleaved coordinate row
pub fn keypoint_triples(row: &[f64]) -> Vec<f64> {
    let mut values = Vec::with_capacity(KEYPOINT_RECORD_LEN);
    for pair in row.chunks(2) {
        values.extend_from_slice(&[pair[0], pair[1], 0.9]);
    }
    values
}

/// Pose record JSON with one detected person
pub fn pose_record(row: &[f64]) -> String {
    serde_json::json!({
        "version": 1.3,
        "people": [{ "person_id": [-1], "pose_keypoints_2d": keypoint_triples(row) }]
    })
    .to_string()
}

/// Pose record JSON with nobody detected
pub fn empty_record() -> String {
    r#"{"version": 1.3, "people": []}"#.to_string()
}

/// Write a clip directory of numbered frame records
pub fn write_clip(dir: &Path, records: &[String]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let clip = dir.file_name().and_then(|n| n.to_str()).unwrap_or("clip");
    for (i, record) in records.iter().enumerate() {
        std::fs::write(dir.join(format!("{clip}_{i:012}_keypoints.json")), record)?;
    }
    Ok(())
}

/// Classifier returning a fixed score
pub struct FixedClassifier {
    pub score: f64,
}

impl GaitClassifier for FixedClassifier {
    fn predict(&self, _features: &[f32]) -> Result<f64> {
        Ok(self.score)
    }

    fn name(&self) -> &str {
        "FixedClassifier"
    }
}

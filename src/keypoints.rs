//! Joint layout and the per-view keypoint table.
//!
//! A [`KeypointTable`] holds one row per retained frame and one column per
//! joint coordinate, interleaved per joint (`NoseX, NoseY, NeckX, ...`).
//! Missing detections are stored as `NaN`.

use crate::constants::{NUM_COORDINATES, NUM_JOINTS};
use crate::{Error, Result};
use ndarray::{Array2, ArrayView1, Axis};

/// Body landmarks in BODY_25 order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Joint {
    Nose,
    Neck,
    RShoulder,
    RElbow,
    RWrist,
    LShoulder,
    LElbow,
    LWrist,
    MHip,
    RHip,
    RKnee,
    RAnkle,
    LHip,
    LKnee,
    LAnkle,
    REye,
    LEye,
    REar,
    LEar,
    LBigToe,
    LSmallToe,
    LHeel,
    RBigToe,
    RSmallToe,
    RHeel,
}

impl Joint {
    /// All joints in record order
    pub const ALL: [Joint; NUM_JOINTS] = [
        Joint::Nose,
        Joint::Neck,
        Joint::RShoulder,
        Joint::RElbow,
        Joint::RWrist,
        Joint::LShoulder,
        Joint::LElbow,
        Joint::LWrist,
        Joint::MHip,
        Joint::RHip,
        Joint::RKnee,
        Joint::RAnkle,
        Joint::LHip,
        Joint::LKnee,
        Joint::LAnkle,
        Joint::REye,
        Joint::LEye,
        Joint::REar,
        Joint::LEar,
        Joint::LBigToe,
        Joint::LSmallToe,
        Joint::LHeel,
        Joint::RBigToe,
        Joint::RSmallToe,
        Joint::RHeel,
    ];

    /// Position of the joint in a pose record
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column holding the joint's x coordinate
    #[must_use]
    pub fn x_column(self) -> usize {
        self.index() * 2
    }

    /// Column holding the joint's y coordinate
    #[must_use]
    pub fn y_column(self) -> usize {
        self.index() * 2 + 1
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Joint::Nose => "Nose",
            Joint::Neck => "Neck",
            Joint::RShoulder => "RShoulder",
            Joint::RElbow => "RElbow",
            Joint::RWrist => "RWrist",
            Joint::LShoulder => "LShoulder",
            Joint::LElbow => "LElbow",
            Joint::LWrist => "LWrist",
            Joint::MHip => "MHip",
            Joint::RHip => "RHip",
            Joint::RKnee => "RKnee",
            Joint::RAnkle => "RAnkle",
            Joint::LHip => "LHip",
            Joint::LKnee => "LKnee",
            Joint::LAnkle => "LAnkle",
            Joint::REye => "REye",
            Joint::LEye => "LEye",
            Joint::REar => "REar",
            Joint::LEar => "LEar",
            Joint::LBigToe => "LBigToe",
            Joint::LSmallToe => "LSmallToe",
            Joint::LHeel => "LHeel",
            Joint::RBigToe => "RBigToe",
            Joint::RSmallToe => "RSmallToe",
            Joint::RHeel => "RHeel",
        }
    }
}

/// Column headers for a keypoint table (`NoseX`, `NoseY`, ...)
#[must_use]
pub fn column_names() -> Vec<String> {
    Joint::ALL
        .iter()
        .flat_map(|joint| [format!("{}X", joint.name()), format!("{}Y", joint.name())])
        .collect()
}

/// Replace sentinel zero coordinates with `NaN`.
///
/// Detectors report undetected joints as `0`, so every exact zero is treated
/// as missing, including a joint that genuinely sits on pixel 0.
#[must_use]
pub fn zero_to_nan(values: &[f64]) -> Vec<f64> {
    values.iter().map(|&v| if v == 0.0 { f64::NAN } else { v }).collect()
}

/// A 2D point in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// True when either coordinate is missing
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.x.is_nan() || self.y.is_nan()
    }
}

/// Ordered frames of joint coordinates for one camera view
#[derive(Debug, Clone, PartialEq)]
pub struct KeypointTable {
    data: Array2<f64>,
}

impl KeypointTable {
    /// Wrap a `frames x 50` matrix
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix does not have one column per coordinate
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if data.ncols() != NUM_COORDINATES {
            return Err(Error::InvalidInput(format!(
                "Keypoint table needs {NUM_COORDINATES} columns, got {}",
                data.ncols()
            )));
        }
        Ok(Self { data })
    }

    /// Build a table from per-frame coordinate rows, preserving row order
    ///
    /// # Errors
    ///
    /// Returns an error if any row does not hold exactly 50 values
    pub fn from_frames(frames: &[Vec<f64>]) -> Result<Self> {
        let mut flat = Vec::with_capacity(frames.len() * NUM_COORDINATES);
        for (i, frame) in frames.iter().enumerate() {
            if frame.len() != NUM_COORDINATES {
                return Err(Error::InvalidInput(format!(
                    "Frame {i} has {} coordinates, expected {NUM_COORDINATES}",
                    frame.len()
                )));
            }
            flat.extend_from_slice(frame);
        }
        let data = Array2::from_shape_vec((frames.len(), NUM_COORDINATES), flat)?;
        Ok(Self { data })
    }

    #[must_use]
    pub fn n_frames(&self) -> usize {
        self.data.nrows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    #[must_use]
    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> Array2<f64> {
        self.data
    }

    /// Coordinates of one frame
    #[must_use]
    pub fn frame(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.index_axis(Axis(0), index)
    }

    /// Location of `joint` in frame `index`
    #[must_use]
    pub fn point(&self, index: usize, joint: Joint) -> Point {
        Point::new(
            self.data[[index, joint.x_column()]],
            self.data[[index, joint.y_column()]],
        )
    }

    /// Number of missing cells
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_to_nan() {
        let out = zero_to_nan(&[0.0, 5.0, 0.0, 3.2]);
        assert!(out[0].is_nan());
        assert_eq!(out[1], 5.0);
        assert!(out[2].is_nan());
        assert_eq!(out[3], 3.2);
    }

    #[test]
    fn test_negative_zero_is_missing() {
        let out = zero_to_nan(&[-0.0]);
        assert!(out[0].is_nan());
    }

    #[test]
    fn test_joint_columns() {
        assert_eq!(Joint::ALL.len(), NUM_JOINTS);
        assert_eq!(Joint::RHip.x_column(), 18);
        assert_eq!(Joint::RHip.y_column(), 19);
        assert_eq!(Joint::LAnkle.x_column(), 28);
        assert_eq!(Joint::RHeel.y_column(), 49);
        for (i, joint) in Joint::ALL.iter().enumerate() {
            assert_eq!(joint.index(), i);
        }
    }

    #[test]
    fn test_column_names() {
        let names = column_names();
        assert_eq!(names.len(), NUM_COORDINATES);
        assert_eq!(names[0], "NoseX");
        assert_eq!(names[1], "NoseY");
        assert_eq!(names[18], "RHipX");
        assert_eq!(names[49], "RHeelY");
    }

    #[test]
    fn test_from_frames_preserves_order() {
        let frames: Vec<Vec<f64>> = (0..3).map(|i| vec![f64::from(i + 1); NUM_COORDINATES]).collect();
        let table = KeypointTable::from_frames(&frames).unwrap();
        assert_eq!(table.n_frames(), 3);
        assert_eq!(table.frame(0)[0], 1.0);
        assert_eq!(table.frame(2)[49], 3.0);
    }

    #[test]
    fn test_from_frames_rejects_short_row() {
        let frames = vec![vec![1.0; 10]];
        assert!(KeypointTable::from_frames(&frames).is_err());
    }

    #[test]
    fn test_point_and_missing_count() {
        let mut row = vec![1.0; NUM_COORDINATES];
        row[Joint::LKnee.x_column()] = f64::NAN;
        let table = KeypointTable::from_frames(&[row]).unwrap();
        assert!(table.point(0, Joint::LKnee).is_missing());
        assert!(!table.point(0, Joint::RKnee).is_missing());
        assert_eq!(table.missing_count(), 1);
    }
}

//! Joint angle computation and the per-view angle table.
//!
//! All angles are in degrees and computed frame by frame from image
//! coordinates (y grows downward). Knee flexion/extension and both
//! abduction/adduction families use the three-point angle at the middle
//! joint; hip flexion/extension compares the thigh vector with a fixed
//! reference direction.

use crate::constants::{EPSILON, STRAIGHT_ANGLE_DEG, UNSET_COORDINATE};
use crate::keypoints::{Joint, KeypointTable, Point};
use crate::{Error, Result};
use nalgebra::Vector2;
use ndarray::{concatenate, s, Array2, Axis};

/// Reference direction for hip flexion/extension
fn hip_reference() -> Vector2<f64> {
    Vector2::new(0.0, -1.0)
}

/// Body side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// Angle family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngleFamily {
    KneeFlexionExtension,
    HipFlexionExtension,
    KneeAbductionAdduction,
    HipAbductionAdduction,
}

/// One named column of an [`AngleTable`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AngleColumn {
    pub family: AngleFamily,
    pub side: Side,
}

impl AngleColumn {
    /// Every column in table order
    pub const ALL: [AngleColumn; 8] = [
        AngleColumn::new(AngleFamily::KneeFlexionExtension, Side::Left),
        AngleColumn::new(AngleFamily::KneeFlexionExtension, Side::Right),
        AngleColumn::new(AngleFamily::HipFlexionExtension, Side::Left),
        AngleColumn::new(AngleFamily::HipFlexionExtension, Side::Right),
        AngleColumn::new(AngleFamily::KneeAbductionAdduction, Side::Left),
        AngleColumn::new(AngleFamily::KneeAbductionAdduction, Side::Right),
        AngleColumn::new(AngleFamily::HipAbductionAdduction, Side::Left),
        AngleColumn::new(AngleFamily::HipAbductionAdduction, Side::Right),
    ];

    #[must_use]
    pub const fn new(family: AngleFamily, side: Side) -> Self {
        Self { family, side }
    }

    /// Header used in CSV artifacts, e.g. `Knee Flexion/Extension Left`
    #[must_use]
    pub fn label(&self) -> String {
        let family = match self.family {
            AngleFamily::KneeFlexionExtension => "Knee Flexion/Extension",
            AngleFamily::HipFlexionExtension => "Hip Flexion/Extension",
            AngleFamily::KneeAbductionAdduction => "Knee Abduction/Adduction",
            AngleFamily::HipAbductionAdduction => "Hip Abduction/Adduction",
        };
        let side = match self.side {
            Side::Left => "Left",
            Side::Right => "Right",
        };
        format!("{family} {side}")
    }

    /// Inverse of [`AngleColumn::label`]
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label.trim())
    }
}

fn shoulder(side: Side) -> Joint {
    match side {
        Side::Left => Joint::LShoulder,
        Side::Right => Joint::RShoulder,
    }
}

fn hip(side: Side) -> Joint {
    match side {
        Side::Left => Joint::LHip,
        Side::Right => Joint::RHip,
    }
}

fn knee(side: Side) -> Joint {
    match side {
        Side::Left => Joint::LKnee,
        Side::Right => Joint::RKnee,
    }
}

fn ankle(side: Side) -> Joint {
    match side {
        Side::Left => Joint::LAnkle,
        Side::Right => Joint::RAnkle,
    }
}

/// Turn a cosine into degrees, clamping floating-point drift into [-1, 1]
fn acos_degrees(cosine: f64) -> f64 {
    cosine.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Angle at `p2` in the triangle `p1`, `p2`, `p3`, by the law of cosines.
///
/// A zero-length side gives [`STRAIGHT_ANGLE_DEG`]. Missing inputs give `NaN`.
#[must_use]
pub fn angle_between_points(p1: Point, p2: Point, p3: Point) -> f64 {
    let a = (p2.x - p1.x).hypot(p2.y - p1.y);
    let b = (p2.x - p3.x).hypot(p2.y - p3.y);
    let c = (p3.x - p1.x).hypot(p3.y - p1.y);
    let denominator = 2.0 * a * b;
    if denominator < EPSILON {
        return STRAIGHT_ANGLE_DEG;
    }
    acos_degrees((a * a + b * b - c * c) / denominator)
}

/// Angle between the hip-to-knee vector and the downward-pointing reference.
///
/// Returns `None` when either point carries the unset marker `(-1, -1)`.
/// A zero-length thigh vector gives [`STRAIGHT_ANGLE_DEG`].
#[must_use]
pub fn thigh_reference_angle(hip: Point, knee: Point) -> Option<f64> {
    let unset = |p: Point| p.x == UNSET_COORDINATE && p.y == UNSET_COORDINATE;
    if unset(hip) || unset(knee) {
        return None;
    }

    let reference = hip_reference();
    let thigh = Vector2::new(knee.x - hip.x, knee.y - hip.y);
    let norms = thigh.norm() * reference.norm();
    if norms < EPSILON {
        return Some(STRAIGHT_ANGLE_DEG);
    }
    Some(acos_degrees(thigh.dot(&reference) / norms))
}

/// Knee flexion/extension: 0 for a straight leg
#[must_use]
pub fn knee_flexion_extension(hip: Point, knee: Point, ankle: Point) -> f64 {
    STRAIGHT_ANGLE_DEG - angle_between_points(hip, knee, ankle)
}

/// Hip flexion/extension: 0 for a thigh hanging straight down the image.
/// `NaN` when either joint is unset.
#[must_use]
pub fn hip_flexion_extension(hip: Point, knee: Point) -> f64 {
    thigh_reference_angle(hip, knee).map_or(f64::NAN, |angle| STRAIGHT_ANGLE_DEG - angle)
}

/// Knee abduction/adduction: raw angle at the knee
#[must_use]
pub fn knee_abduction_adduction(hip: Point, knee: Point, ankle: Point) -> f64 {
    angle_between_points(hip, knee, ankle)
}

/// Hip abduction/adduction: raw angle at the hip between trunk and thigh
#[must_use]
pub fn hip_abduction_adduction(shoulder: Point, hip: Point, knee: Point) -> f64 {
    angle_between_points(shoulder, hip, knee)
}

/// Angle of one column for one frame
#[must_use]
pub fn frame_angle(table: &KeypointTable, frame: usize, column: AngleColumn) -> f64 {
    let side = column.side;
    let point = |joint: Joint| table.point(frame, joint);
    match column.family {
        AngleFamily::KneeFlexionExtension => {
            knee_flexion_extension(point(hip(side)), point(knee(side)), point(ankle(side)))
        }
        AngleFamily::HipFlexionExtension => hip_flexion_extension(point(hip(side)), point(knee(side))),
        AngleFamily::KneeAbductionAdduction => {
            knee_abduction_adduction(point(hip(side)), point(knee(side)), point(ankle(side)))
        }
        AngleFamily::HipAbductionAdduction => {
            hip_abduction_adduction(point(shoulder(side)), point(hip(side)), point(knee(side)))
        }
    }
}

/// Rows of angles with named columns.
///
/// Row `i` always corresponds to frame `i` of the keypoint table the angles
/// came from, or to row `i` of the tables it was assembled from.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleTable {
    columns: Vec<AngleColumn>,
    values: Array2<f64>,
}

impl AngleTable {
    /// # Errors
    ///
    /// Returns an error if the number of columns and headers disagree
    pub fn new(columns: Vec<AngleColumn>, values: Array2<f64>) -> Result<Self> {
        if columns.len() != values.ncols() {
            return Err(Error::InvalidInput(format!(
                "Angle table has {} headers for {} columns",
                columns.len(),
                values.ncols()
            )));
        }
        Ok(Self { columns, values })
    }

    /// Table with the given headers and no rows
    #[must_use]
    pub fn empty(columns: Vec<AngleColumn>) -> Self {
        let values = Array2::zeros((0, columns.len()));
        Self { columns, values }
    }

    /// Compute all eight angle columns for every frame
    #[must_use]
    pub fn from_keypoints(table: &KeypointTable) -> Self {
        let columns = AngleColumn::ALL.to_vec();
        let values = Array2::from_shape_fn((table.n_frames(), columns.len()), |(frame, c)| {
            frame_angle(table, frame, columns[c])
        });
        Self { columns, values }
    }

    #[must_use]
    pub fn columns(&self) -> &[AngleColumn] {
        &self.columns
    }

    #[must_use]
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Values of a named column
    #[must_use]
    pub fn column(&self, column: AngleColumn) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|&c| c == column)?;
        Some(self.values.column(idx).to_vec())
    }

    /// Keep only `columns`, in the order given
    ///
    /// # Errors
    ///
    /// Returns an error if a requested column is absent
    pub fn select(&self, columns: &[AngleColumn]) -> Result<Self> {
        let indices = columns
            .iter()
            .map(|column| {
                self.columns
                    .iter()
                    .position(|c| c == column)
                    .ok_or_else(|| Error::InvalidInput(format!("Column not present: {}", column.label())))
            })
            .collect::<Result<Vec<_>>>()?;
        let values = self.values.select(Axis(1), &indices);
        Ok(Self {
            columns: columns.to_vec(),
            values,
        })
    }

    /// Copy of rows `start..end`
    #[must_use]
    pub fn rows(&self, start: usize, end: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            values: self.values.slice(s![start..end, ..]).to_owned(),
        }
    }

    /// Stack tables with identical headers top to bottom
    ///
    /// # Errors
    ///
    /// Returns an error if headers differ
    pub fn concat_rows(columns: Vec<AngleColumn>, tables: &[AngleTable]) -> Result<Self> {
        if tables.iter().any(|t| t.columns != columns) {
            return Err(Error::InvalidInput("Cannot stack tables with different headers".to_string()));
        }
        if tables.is_empty() {
            return Ok(Self::empty(columns));
        }
        let views: Vec<_> = tables.iter().map(|t| t.values.view()).collect();
        let values = concatenate(Axis(0), &views)?;
        Ok(Self { columns, values })
    }
}

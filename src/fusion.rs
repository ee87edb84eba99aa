//! Camera views and front/side fusion.

use crate::angles::{AngleColumn, AngleFamily, AngleTable, Side};
use crate::{Error, Result};
use ndarray::{s, Array2};
use std::fmt;

/// Camera view of a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum View {
    Front,
    Side,
}

impl View {
    /// Classify a clip name by its `_F_` / `_S_` marker. Front wins if both appear.
    #[must_use]
    pub fn from_clip_name(name: &str) -> Option<Self> {
        [Self::Front, Self::Side]
            .into_iter()
            .find(|view| name.contains(&format!("_{}_", view.marker())))
    }

    /// Single-letter marker used in clip names
    #[must_use]
    pub fn marker(self) -> &'static str {
        match self {
            Self::Front => "F",
            Self::Side => "S",
        }
    }

    /// Angle columns this view contributes.
    ///
    /// The front camera sees the frontal plane (abduction/adduction), the
    /// side camera the sagittal plane (flexion/extension).
    #[must_use]
    pub fn columns(self) -> Vec<AngleColumn> {
        let (knee, hip) = match self {
            Self::Front => (AngleFamily::KneeAbductionAdduction, AngleFamily::HipAbductionAdduction),
            Self::Side => (AngleFamily::KneeFlexionExtension, AngleFamily::HipFlexionExtension),
        };
        vec![
            AngleColumn::new(knee, Side::Left),
            AngleColumn::new(knee, Side::Right),
            AngleColumn::new(hip, Side::Left),
            AngleColumn::new(hip, Side::Right),
        ]
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Front => write!(f, "Front"),
            Self::Side => write!(f, "Side"),
        }
    }
}

/// Front and side columns side by side
#[derive(Debug, Clone, PartialEq)]
pub struct FusedTable {
    columns: Vec<AngleColumn>,
    values: Array2<f64>,
}

impl FusedTable {
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
}

/// Merge the front and side selections by row position.
///
/// Row `i` of the result pairs row `i` of each input; frame timing is not
/// aligned. If the inputs differ in length the shorter one is padded with
/// `NaN`.
///
/// # Errors
///
/// Returns an error if either table lacks its view's columns
pub fn fuse_views(front: &AngleTable, side: &AngleTable) -> Result<FusedTable> {
    let front = front
        .select(&View::Front.columns())
        .map_err(|e| Error::MissingView(format!("front table: {e}")))?;
    let side = side
        .select(&View::Side.columns())
        .map_err(|e| Error::MissingView(format!("side table: {e}")))?;

    let rows = front.n_rows().max(side.n_rows());
    if front.n_rows() != side.n_rows() {
        log::warn!(
            "Front has {} rows and side has {} rows; padding to {rows}",
            front.n_rows(),
            side.n_rows()
        );
    }

    let front_width = front.n_columns();
    let mut values = Array2::from_elem((rows, front_width + side.n_columns()), f64::NAN);
    values
        .slice_mut(s![..front.n_rows(), ..front_width])
        .assign(front.values());
    values
        .slice_mut(s![..side.n_rows(), front_width..])
        .assign(side.values());

    let mut columns = front.columns().to_vec();
    columns.extend_from_slice(side.columns());
    Ok(FusedTable { columns, values })
}

//! Feature normalisation and the classifier boundary.
//!
//! A fused table is min-max scaled column by column, fitted on that table
//! alone, then flattened row-major into the vector the classifier consumes.

use crate::fusion::FusedTable;
use crate::{Error, Result};
use ndarray::{Array2, Axis};
use std::fmt;

/// Scale each column to `[0, 1]` using that column's own range.
///
/// `NaN` cells are ignored when fitting and stay `NaN`. A constant column
/// maps to 0.
#[must_use]
pub fn min_max_scale(values: &Array2<f64>) -> Array2<f64> {
    let mut scaled = values.clone();
    for mut column in scaled.axis_iter_mut(Axis(1)) {
        let (min, max) = column
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = if max - min > 0.0 { max - min } else { 1.0 };
        column.mapv_inplace(|v| (v - min) / range);
    }
    scaled
}

/// Flattened, scaled features of one fused table
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    /// Scale `table` and flatten it row by row
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // classifier consumes f32
    pub fn from_fused(table: &FusedTable) -> Self {
        let scaled = min_max_scale(table.values());
        Self {
            values: scaled.iter().map(|&v| v as f32).collect(),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Binary classifier over a flattened feature vector
pub trait GaitClassifier {
    /// Score in `[0, 1]`
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails
    fn predict(&self, features: &[f32]) -> Result<f64>;

    /// Classifier name
    fn name(&self) -> &str;
}

/// Class assigned from a score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnosis {
    Asd,
    NoAsd,
}

impl Diagnosis {
    /// Positive when `score` is strictly above `threshold`
    #[must_use]
    pub fn from_score(score: f64, threshold: f64) -> Self {
        if score > threshold {
            Self::Asd
        } else {
            Self::NoAsd
        }
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asd => write!(f, "ASD"),
            Self::NoAsd => write!(f, "No ASD"),
        }
    }
}

/// Scored fused clip
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub file: String,
    pub score: f64,
    pub diagnosis: Diagnosis,
}

/// Reference label written next to fused tables: 0 for the `Su_1` cohort, else 1
#[must_use]
pub fn reference_label(group_key: &str) -> u8 {
    u8::from(!group_key.starts_with("Su_1"))
}

/// Score one feature vector
///
/// # Errors
///
/// Returns an error if the vector is empty, the classifier fails, or the
/// score is not finite
pub fn score_features(
    classifier: &dyn GaitClassifier,
    file: &str,
    features: &FeatureVector,
    threshold: f64,
) -> Result<Prediction> {
    if features.is_empty() {
        return Err(Error::InvalidInput(format!("Empty feature vector for {file}")));
    }
    let score = classifier.predict(features.as_slice())?;
    if !score.is_finite() {
        return Err(Error::ModelOutputError(format!("{} returned {score}", classifier.name())));
    }
    let diagnosis = Diagnosis::from_score(score, threshold);
    log::info!("File: {file}, Prediction: {diagnosis} ({:.2}%)", score * 100.0);
    Ok(Prediction {
        file: file.to_string(),
        score,
        diagnosis,
    })
}

#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;

#[cfg(feature = "onnx")]
mod onnx {
    use super::GaitClassifier;
    use crate::{Error, Result};
    use ndarray::{Array2, CowArray};
    use ort::{Environment, Session, Value};
    use std::path::Path;
    use std::sync::Arc;

    /// Classifier backed by an `ONNX` model taking a `[1, n]` f32 input
    pub struct OnnxClassifier {
        session: Session,
        expected_len: Option<usize>,
    }

    impl OnnxClassifier {
        /// Load the model at `model_path`
        ///
        /// # Errors
        ///
        /// Returns an error if:
        /// - The model file does not exist
        /// - The ONNX runtime environment cannot be created
        /// - The model cannot be loaded
        pub fn new<P: AsRef<Path>>(model_path: P) -> Result<Self> {
            let model_path = model_path.as_ref();
            if !model_path.is_file() {
                return Err(Error::ModelError(format!(
                    "Classifier model not found: {}",
                    model_path.display()
                )));
            }
            log::info!("Initializing OnnxClassifier with model: {}", model_path.display());

            let environment = Arc::new(
                Environment::builder()
                    .with_name("gait_classifier")
                    .with_log_level(ort::LoggingLevel::Warning)
                    .build()?,
            );

            let session = ort::SessionBuilder::new(&environment)?
                .with_optimization_level(ort::GraphOptimizationLevel::Level3)?
                .with_model_from_file(model_path)?;

            if session.inputs.is_empty() {
                return Err(Error::ModelError("Model has no inputs".to_string()));
            }

            Ok(Self {
                session,
                expected_len: None,
            })
        }

        /// Reject vectors whose length differs from `len`
        #[must_use]
        pub fn with_expected_len(mut self, len: usize) -> Self {
            self.expected_len = Some(len);
            self
        }
    }

    impl GaitClassifier for OnnxClassifier {
        fn predict(&self, features: &[f32]) -> Result<f64> {
            if let Some(expected) = self.expected_len {
                if features.len() != expected {
                    return Err(Error::InvalidInput(format!(
                        "Feature vector has {} values, model expects {expected}",
                        features.len()
                    )));
                }
            }

            let input = Array2::from_shape_vec((1, features.len()), features.to_vec())?;
            let cow_array = CowArray::from(input.into_dyn());
            let input_tensor = Value::from_array(self.session.allocator(), &cow_array)?;

            let outputs = self.session.run(vec![input_tensor])?;
            let output = outputs
                .into_iter()
                .next()
                .ok_or_else(|| Error::ModelOutputError("No output from model".to_string()))?;

            let tensor = output.try_extract::<f32>()?;
            let view = tensor.view();
            let score = view
                .iter()
                .next()
                .copied()
                .ok_or_else(|| Error::ModelOutputError("Model output is empty".to_string()))?;
            Ok(f64::from(score))
        }

        fn name(&self) -> &str {
            "OnnxClassifier"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::angles::{AngleColumn, AngleTable};
    use crate::fusion::fuse_views;
    use ndarray::array;

    struct MeanClassifier;

    impl GaitClassifier for MeanClassifier {
        fn predict(&self, features: &[f32]) -> Result<f64> {
            Ok(features.iter().map(|&v| f64::from(v)).sum::<f64>() / features.len() as f64)
        }

        fn name(&self) -> &str {
            "MeanClassifier"
        }
    }

    #[test]
    fn test_min_max_scale_per_column() {
        let values = array![[0.0, 10.0, 5.0], [5.0, 20.0, 5.0], [10.0, 30.0, 5.0]];
        let scaled = min_max_scale(&values);
        assert_eq!(scaled.column(0).to_vec(), vec![0.0, 0.5, 1.0]);
        assert_eq!(scaled.column(1).to_vec(), vec![0.0, 0.5, 1.0]);
        assert_eq!(scaled.column(2).to_vec(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_min_max_scale_keeps_nan() {
        let values = array![[1.0], [f64::NAN], [3.0]];
        let scaled = min_max_scale(&values);
        assert_eq!(scaled[[0, 0]], 0.0);
        assert!(scaled[[1, 0]].is_nan());
        assert_eq!(scaled[[2, 0]], 1.0);
    }

    #[test]
    fn test_feature_vector_is_row_major() {
        let values = Array2::from_shape_fn((2, 8), |(i, j)| (i * 8 + j) as f64);
        let table = AngleTable::new(AngleColumn::ALL.to_vec(), values).unwrap();
        let fused = fuse_views(&table, &table).unwrap();
        let features = FeatureVector::from_fused(&fused);
        assert_eq!(features.len(), 16);
        // every column spans exactly two rows: first row 0, second row 1
        assert!(features.as_slice()[..8].iter().all(|&v| v == 0.0));
        assert!(features.as_slice()[8..].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(Diagnosis::from_score(0.5, 0.5), Diagnosis::NoAsd);
        assert_eq!(Diagnosis::from_score(0.51, 0.5), Diagnosis::Asd);
        assert_eq!(Diagnosis::Asd.to_string(), "ASD");
    }

    #[test]
    fn test_score_features() {
        let features = FeatureVector { values: vec![0.0, 1.0, 1.0, 1.0] };
        let prediction = score_features(&MeanClassifier, "a.csv", &features, 0.5).unwrap();
        assert_eq!(prediction.score, 0.75);
        assert_eq!(prediction.diagnosis, Diagnosis::Asd);

        let empty = FeatureVector { values: Vec::new() };
        assert!(score_features(&MeanClassifier, "b.csv", &empty, 0.5).is_err());
    }

    #[test]
    fn test_reference_label() {
        assert_eq!(reference_label("Su_101_walk"), 0);
        assert_eq!(reference_label("Su_201_walk"), 1);
    }
}

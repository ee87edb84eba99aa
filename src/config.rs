//! Configuration management for the gait kinematics pipeline

use crate::constants::{
    DEFAULT_FALLBACK_MAX_ITER, DEFAULT_FALLBACK_TOL, DEFAULT_FEATURE_LENGTH, DEFAULT_IMPUTATION_TOLERANCE,
    DEFAULT_MAX_IMPUTATION_PASSES, DEFAULT_OFFSET_DIVISOR, DEFAULT_SCORE_THRESHOLD, DEFAULT_SEGMENT_COUNT,
    DEFAULT_SEGMENT_LENGTH,
};
use crate::loader::FrameOrdering;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Keypoint loading
    pub loader: LoaderConfig,

    /// Missing-value imputation
    pub imputation: ImputationConfig,

    /// Gait-cycle window selection
    pub cycle: CycleConfig,

    /// Classifier scoring
    pub scoring: ScoringConfig,
}

/// Keypoint loading configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// How frame files of per-clip folders are ordered in time.
    /// The front/side pair layout is always lexicographic.
    pub frame_ordering: FrameOrdering,
}

/// Imputation parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    /// Missing-count change between passes that counts as converged
    pub tolerance: usize,

    /// Hard cap on imputation passes
    pub max_passes: usize,

    /// Rounds of the multivariate fallback
    pub fallback_max_iter: usize,

    /// Relative stopping threshold of the multivariate fallback
    pub fallback_tol: f64,
}

/// Gait-cycle selection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Rows per window
    pub segment_length: usize,

    /// Windows per view
    pub segment_count: usize,

    /// Window `i` starts at `rows * i / offset_divisor`
    pub offset_divisor: usize,
}

/// Scoring parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Path to the classifier model; no scoring when unset
    pub model_path: Option<PathBuf>,

    /// Scores strictly above this are positive
    pub threshold: f64,

    /// Feature vector length the model expects
    pub feature_length: usize,
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_IMPUTATION_TOLERANCE,
            max_passes: DEFAULT_MAX_IMPUTATION_PASSES,
            fallback_max_iter: DEFAULT_FALLBACK_MAX_ITER,
            fallback_tol: DEFAULT_FALLBACK_TOL,
        }
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            segment_length: DEFAULT_SEGMENT_LENGTH,
            segment_count: DEFAULT_SEGMENT_COUNT,
            offset_divisor: DEFAULT_OFFSET_DIVISOR,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            model_path: None,
            threshold: DEFAULT_SCORE_THRESHOLD,
            feature_length: DEFAULT_FEATURE_LENGTH,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;

        serde_yaml::from_str(&content).map_err(|e| Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.cycle.segment_length == 0 {
            return Err(Error::ConfigError("Segment length must be greater than 0".to_string()));
        }
        if self.cycle.segment_count == 0 {
            return Err(Error::ConfigError("Segment count must be greater than 0".to_string()));
        }
        if self.cycle.offset_divisor <= self.cycle.segment_count {
            return Err(Error::ConfigError(
                "Offset divisor must be greater than segment count".to_string(),
            ));
        }

        if self.imputation.max_passes == 0 {
            return Err(Error::ConfigError("Max imputation passes must be greater than 0".to_string()));
        }
        if self.imputation.fallback_max_iter == 0 {
            return Err(Error::ConfigError(
                "Fallback max iterations must be greater than 0".to_string(),
            ));
        }
        if !(self.imputation.fallback_tol > 0.0) {
            return Err(Error::ConfigError("Fallback tolerance must be positive".to_string()));
        }

        if !(0.0..=1.0).contains(&self.scoring.threshold) {
            return Err(Error::ConfigError(
                "Score threshold must be between 0.0 and 1.0".to_string(),
            ));
        }
        if let Some(model) = &self.scoring.model_path {
            if !model.exists() {
                return Err(Error::ConfigError(format!(
                    "Classifier model not found: {}",
                    model.display()
                )));
            }
        }

        Ok(())
    }
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gait Kinematics Configuration

# Keypoint loading
loader:
  frame_ordering: counter   # counter | lexicographic

# Missing-value imputation
imputation:
  tolerance: 5
  max_passes: 100
  fallback_max_iter: 10
  fallback_tol: 0.001

# Gait-cycle window selection
cycle:
  segment_length: 30
  segment_count: 4
  offset_divisor: 5

# Classifier scoring
scoring:
  model_path: "Model/gait_classifier.onnx"
  threshold: 0.5
  feature_length: 960
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = serde_yaml::from_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.loader.frame_ordering, FrameOrdering::Counter);
        assert_eq!(config.imputation.tolerance, 5);
        assert_eq!(config.cycle.segment_length, 30);
        assert_eq!(config.scoring.feature_length, 960);
        assert_eq!(
            config.scoring.model_path.as_deref(),
            Some(Path::new("Model/gait_classifier.onnx"))
        );
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_yaml::from_str("cycle:\n  segment_length: 20\n").unwrap();
        assert_eq!(config.cycle.segment_length, 20);
        assert_eq!(config.cycle.segment_count, 4);
        assert_eq!(config.imputation.max_passes, 100);
    }

    #[test]
    fn test_invalid_divisor() {
        let mut config = Config::default();
        config.cycle.offset_divisor = 4;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_threshold() {
        let mut config = Config::default();
        config.scoring.threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_model_rejected() {
        let mut config = Config::default();
        config.scoring.model_path = Some(PathBuf::from("/nonexistent/model.onnx"));
        assert!(config.validate().is_err());
    }
}

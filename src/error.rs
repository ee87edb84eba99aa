//! Error types for the gait kinematics library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Keypoint record could not be decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV artifact could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Table construction with mismatched dimensions
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// `ONNX` Runtime inference failed
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Imputation precondition violated
    #[error("Imputation error: {0}")]
    ImputationError(String),

    /// Classifier loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Classifier output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// A required camera view is absent
    #[error("Missing view: {0}")]
    MissingView(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

//! Error types for churn training and scoring

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for churn operations
pub type Result<T> = std::result::Result<T, ChurnError>;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum ChurnError {
    #[error("Could not find churn column in the dataset (tried: {})", tried.join(", "))]
    MissingTargetColumn { tried: Vec<String> },

    #[error("Unsupported model type: {0}")]
    UnsupportedModelType(String),

    #[error("Failed to write model artifact to {}: {reason}", path.display())]
    ArtifactWriteFailure { path: PathBuf, reason: String },

    #[error("Failed to read model artifact from {}: {reason}", path.display())]
    ArtifactReadFailure { path: PathBuf, reason: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Dataset is empty")]
    EmptyDataset,

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ChurnError {
    /// Stable machine-readable tag for the error payload
    pub fn kind(&self) -> &'static str {
        match self {
            ChurnError::MissingTargetColumn { .. } => "missing_target_column",
            ChurnError::UnsupportedModelType(_) => "unsupported_model_type",
            ChurnError::ArtifactWriteFailure { .. } => "artifact_write_failure",
            ChurnError::ArtifactReadFailure { .. } => "artifact_read_failure",
            ChurnError::DataError(_) => "data_error",
            ChurnError::EmptyDataset => "empty_dataset",
            ChurnError::FeatureNotFound(_) => "feature_not_found",
            ChurnError::ModelNotFitted => "model_not_fitted",
            ChurnError::ShapeError { .. } => "shape_error",
            ChurnError::SerializationError(_) => "serialization_error",
            ChurnError::ConfigError(_) => "config_error",
            ChurnError::IoError(_) => "io_error",
        }
    }
}

impl From<polars::error::PolarsError> for ChurnError {
    fn from(err: polars::error::PolarsError) -> Self {
        ChurnError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for ChurnError {
    fn from(err: serde_json::Error) -> Self {
        ChurnError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for ChurnError {
    fn from(err: bincode::Error) -> Self {
        ChurnError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for ChurnError {
    fn from(err: ndarray::ShapeError) -> Self {
        ChurnError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ChurnError::UnsupportedModelType("xyz".to_string());
        assert_eq!(err.to_string(), "Unsupported model type: xyz");
    }

    #[test]
    fn test_missing_target_lists_aliases() {
        let err = ChurnError::MissingTargetColumn {
            tried: vec!["Churn".to_string(), "churn".to_string()],
        };
        assert!(err.to_string().contains("Churn, churn"));
        assert_eq!(err.kind(), "missing_target_column");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ChurnError = io_err.into();
        assert!(matches!(err, ChurnError::IoError(_)));
        assert_eq!(err.kind(), "io_error");
    }
}

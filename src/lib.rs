//! Churn Predict - customer churn training and scoring
//!
//! This crate turns a tabular customer dataset into a fitted churn model:
//! - Column names are resolved against alias tables, so differently named
//!   exports of the same data train the same way
//! - Numeric features are median-imputed and standardized, categorical
//!   features are mode-imputed and one-hot encoded
//! - Interchangeable classifiers (logistic regression, decision tree) are
//!   looked up by token in a registry
//! - Each run is evaluated on a seeded held-out split and the fitted
//!   pipeline is persisted as a single artifact
//!
//! # Modules
//!
//! - [`schema`] - Alias tables, schema resolution, feature partition
//! - [`preprocessing`] - Target encoding, imputation, scaling, encoding
//! - [`training`] - Model abstraction, registry, orchestrator
//! - [`export`] - Artifact persistence and reload
//! - [`data`] - Dataset loading (CSV, JSON, Parquet)
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use churn_predict::prelude::*;
//!
//! let df = load_dataset("telco.csv")?;
//! let trainer = ChurnTrainer::new(TrainingConfig::single_model());
//! let result = trainer.run(&df, "lr", "models", "churn-v1")?;
//! println!("accuracy {:.3}", result.metrics.accuracy);
//! # Ok::<(), churn_predict::ChurnError>(())
//! ```

// Core error handling
pub mod error;

// Core modules
pub mod schema;
pub mod preprocessing;
pub mod training;

// Persistence and I/O
pub mod data;
pub mod export;

// Services
pub mod cli;

pub use error::{ChurnError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{ChurnError, Result};

    // Schema
    pub use crate::schema::{AliasTable, FeaturePartition, FieldRole, FieldSpec, SchemaMapping};

    // Preprocessing
    pub use crate::preprocessing::{encode_target, FeaturePipeline, PreprocessingConfig};

    // Training
    pub use crate::training::{
        ChurnModel, ChurnTrainer, ComparisonReport, EvaluationResult, FittedPipeline,
        ModelRegistry, PredictionRecord, TrainingConfig,
    };

    // Persistence and loading
    pub use crate::data::load_dataset;
    pub use crate::export::{load_pipeline, ArtifactMetadata};
}

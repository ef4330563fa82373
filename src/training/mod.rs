//! Model training module
//!
//! Provides the churn training path:
//! - A model abstraction with logistic regression and decision tree variants
//! - A token-addressed registry of variants
//! - Seeded train/test splitting and held-out evaluation
//! - The training orchestrator that packages results and persists artifacts

mod config;
mod engine;
mod metrics;
mod models;
mod registry;
mod split;
pub mod decision_tree;
pub mod linear_models;

pub use config::{LogisticConfig, TrainingConfig, TreeConfig, DEFAULT_SEED};
pub use decision_tree::{DecisionTree, TreeNode};
pub use engine::{
    ChurnTrainer, ComparisonReport, EvaluationResult, FittedPipeline, ModelComparison,
    PredictionRecord, TOP_FEATURES,
};
pub use linear_models::LogisticRegression;
pub use metrics::{roc_auc, roc_curve, ClassificationMetrics, ConfusionMatrix, RocPoint, DECISION_THRESHOLD};
pub use models::{normalize_importances, ChurnModel, FeatureImportance, TrainingReport};
pub use registry::{BuildFn, LoadFn, ModelEntry, ModelRegistry};
pub use split::{train_test_split, TrainTestSplit};

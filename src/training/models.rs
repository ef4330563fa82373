//! Model abstraction shared by every classifier variant

use super::metrics::{ClassificationMetrics, ConfusionMatrix, RocPoint, DECISION_THRESHOLD};
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Instant;

/// Importance of one encoded feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Outcome of training a model and evaluating it on a held-out split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub metrics: ClassificationMetrics,
    pub roc_curve: Vec<RocPoint>,
    pub confusion_matrix: ConfusionMatrix,
    /// Training time in seconds
    pub training_time_secs: f64,
}

/// Trait for churn classifiers.
///
/// Variants produce positive-class probabilities and a non-negative raw
/// importance per encoded feature. Importances are sum-normalized here, so
/// every variant honours the same contract.
pub trait ChurnModel: Send + Sync + Debug {
    /// Registry tag, e.g. `logistic_regression`
    fn model_type(&self) -> &'static str;

    /// Fit the model to training data
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;

    /// Probability of churn for every row
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Non-negative, unnormalized importance per input column
    fn raw_importances(&self) -> Result<Array1<f64>>;

    /// Serialize the fitted parameters
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Hard labels (1.0 = churn)
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p > DECISION_THRESHOLD { 1.0 } else { 0.0 }))
    }

    /// Fit on the training split and evaluate on the held-out split
    fn train(
        &mut self,
        x_train: &Array2<f64>,
        y_train: &Array1<f64>,
        x_test: &Array2<f64>,
        y_test: &Array1<f64>,
    ) -> Result<TrainingReport> {
        let start = Instant::now();
        self.fit(x_train, y_train)?;
        let training_time_secs = start.elapsed().as_secs_f64();

        let proba = self.predict_proba(x_test)?;
        let (metrics, roc_curve, confusion_matrix) = ClassificationMetrics::compute(y_test, &proba)?;
        Ok(TrainingReport {
            metrics,
            roc_curve,
            confusion_matrix,
            training_time_secs,
        })
    }

    /// Importances paired with feature names, sorted descending
    fn feature_importance(&self, feature_names: &[String]) -> Result<Vec<FeatureImportance>> {
        let raw = self.raw_importances()?;
        if raw.len() != feature_names.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} feature names", raw.len()),
                actual: format!("{} feature names", feature_names.len()),
            });
        }
        let normalized = normalize_importances(&raw);

        let mut ranked: Vec<FeatureImportance> = feature_names
            .iter()
            .zip(normalized.iter())
            .map(|(name, &importance)| FeatureImportance {
                feature: name.clone(),
                importance,
            })
            .collect();
        // stable: equal importances keep encoded order
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        Ok(ranked)
    }
}

/// Absolute values scaled to sum to 1. All-zero input becomes uniform.
pub fn normalize_importances(raw: &Array1<f64>) -> Array1<f64> {
    let abs = raw.mapv(|v| if v.is_finite() { v.abs() } else { 0.0 });
    let total = abs.sum();
    if total > 0.0 {
        abs / total
    } else if raw.is_empty() {
        abs
    } else {
        Array1::from_elem(raw.len(), 1.0 / raw.len() as f64)
    }
}

//! Logistic regression

use super::config::LogisticConfig;
use super::models::ChurnModel;
use crate::error::{ChurnError, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// L2-regularized logistic regression for binary classification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    /// Fitted coefficients
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept
    pub intercept: Option<f64>,
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum iterations
    pub max_iter: usize,
    /// Convergence tolerance
    pub tol: f64,
    /// Learning rate
    pub learning_rate: f64,
    /// Iterations used by the last fit
    pub n_iter: usize,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LogisticRegression {
    /// Create a new logistic regression model
    pub fn new() -> Self {
        Self::from_config(&LogisticConfig::default())
    }

    pub fn from_config(config: &LogisticConfig) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c: config.c,
            max_iter: config.max_iter,
            tol: config.tol,
            learning_rate: config.learning_rate,
            n_iter: 0,
        }
    }

    /// Sigmoid function
    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

impl ChurnModel for LogisticRegression {
    fn model_type(&self) -> &'static str {
        "logistic_regression"
    }

    /// Batch gradient descent on mean log-loss plus `||w||² / (2·C·n)`
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(ChurnError::EmptyDataset);
        }
        if self.c <= 0.0 {
            return Err(ChurnError::ConfigError(format!("C must be positive, got {}", self.c)));
        }

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;

        let lr = self.learning_rate;
        let penalty = 1.0 / (self.c * n_samples as f64);

        self.n_iter = self.max_iter;
        for iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let errors = &predictions - y;
            let dw = (x.t().dot(&errors) / n_samples as f64) + (penalty * &weights);
            let db = errors.mean().unwrap_or(0.0);

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                self.n_iter = iter;
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        debug!(n_iter = self.n_iter, n_features, "Logistic regression fitted");
        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        Ok(())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        let intercept = self.intercept.unwrap_or(0.0);

        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Absolute coefficients
    fn raw_importances(&self) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(ChurnError::ModelNotFitted)?;
        Ok(coefficients.mapv(f64::abs))
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [-2.0, 0.1],
            [-1.5, -0.2],
            [-1.0, 0.0],
            [-0.5, 0.3],
            [0.5, -0.1],
            [1.0, 0.2],
            [1.5, 0.0],
            [2.0, -0.3]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_logistic_regression() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let proba = model.predict_proba(&x).unwrap();
        assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(model.predict(&x).unwrap(), y);
    }

    #[test]
    fn test_first_feature_dominates_importance() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let names = vec!["num__signal".to_string(), "num__noise".to_string()];
        let ranked = model.feature_importance(&names).unwrap();
        assert_eq!(ranked[0].feature, "num__signal");
    }

    #[test]
    fn test_deterministic_fit() {
        let (x, y) = separable();
        let mut a = LogisticRegression::new();
        let mut b = LogisticRegression::new();
        a.fit(&x, &y).unwrap();
        b.fit(&x, &y).unwrap();
        assert_eq!(a.coefficients, b.coefficients);
        assert_eq!(a.intercept, b.intercept);
    }

    #[test]
    fn test_bytes_round_trip() {
        let (x, y) = separable();
        let mut model = LogisticRegression::new();
        model.fit(&x, &y).unwrap();

        let restored = LogisticRegression::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(model.predict_proba(&x).unwrap(), restored.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit() {
        let model = LogisticRegression::new();
        assert!(matches!(model.predict_proba(&array![[1.0]]), Err(ChurnError::ModelNotFitted)));
    }
}

//! Training configuration

use serde::{Deserialize, Serialize};

/// Default seed for the train/test split
pub const DEFAULT_SEED: u64 = 42;

/// Hyper-parameters for the logistic regression variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularization strength
    pub c: f64,
    /// Maximum gradient descent iterations
    pub max_iter: usize,
    /// Stop once the gradient norm drops below this
    pub tol: f64,
    /// Gradient descent step size
    pub learning_rate: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.5,
        }
    }
}

/// Hyper-parameters for the decision tree variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: Some(6),
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Configuration for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Fraction of records held out for evaluation
    pub test_size: f64,

    /// Random seed for the shuffled split
    pub random_state: u64,

    /// Logistic regression hyper-parameters
    pub logistic: LogisticConfig,

    /// Decision tree hyper-parameters
    pub tree: TreeConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self::single_model()
    }
}

impl TrainingConfig {
    /// Single-model path: 75/25 split
    pub fn single_model() -> Self {
        Self {
            test_size: 0.25,
            random_state: DEFAULT_SEED,
            logistic: LogisticConfig::default(),
            tree: TreeConfig::default(),
        }
    }

    /// Comparison path: 80/20 split
    pub fn comparison() -> Self {
        Self {
            test_size: 0.20,
            ..Self::single_model()
        }
    }

    /// Set the held-out fraction
    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    /// Set random state
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Set logistic regression hyper-parameters
    pub fn with_logistic(mut self, logistic: LogisticConfig) -> Self {
        self.logistic = logistic;
        self
    }

    /// Set decision tree hyper-parameters
    pub fn with_tree(mut self, tree: TreeConfig) -> Self {
        self.tree = tree;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_presets() {
        assert_eq!(TrainingConfig::single_model().test_size, 0.25);
        assert_eq!(TrainingConfig::comparison().test_size, 0.20);
        assert_eq!(TrainingConfig::comparison().random_state, DEFAULT_SEED);
    }

    #[test]
    fn test_builder() {
        let config = TrainingConfig::default()
            .with_random_state(7)
            .with_tree(TreeConfig { max_depth: Some(3), ..TreeConfig::default() });
        assert_eq!(config.random_state, 7);
        assert_eq!(config.tree.max_depth, Some(3));
    }
}

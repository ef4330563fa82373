//! Preprocessing configuration

use super::ImputeStrategy;
use serde::{Deserialize, Serialize};

/// Configuration for the two-branch feature pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Strategy for handling missing numeric values
    pub numeric_impute_strategy: ImputeStrategy,

    /// Strategy for handling missing categorical values
    pub categorical_impute_strategy: ImputeStrategy,

    /// Run the numeric and categorical branches on separate threads
    pub parallel_branches: bool,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            numeric_impute_strategy: ImputeStrategy::Median,
            categorical_impute_strategy: ImputeStrategy::MostFrequent,
            parallel_branches: true,
        }
    }
}

impl PreprocessingConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to toggle branch parallelism
    pub fn with_parallel_branches(mut self, parallel: bool) -> Self {
        self.parallel_branches = parallel;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PreprocessingConfig::default();
        assert_eq!(config.numeric_impute_strategy, ImputeStrategy::Median);
        assert_eq!(config.categorical_impute_strategy, ImputeStrategy::MostFrequent);
        assert!(config.parallel_branches);
    }

    #[test]
    fn test_builder() {
        let config = PreprocessingConfig::new().with_parallel_branches(false);
        assert_eq!(config.numeric_impute_strategy, ImputeStrategy::Median);
        assert!(!config.parallel_branches);
    }
}

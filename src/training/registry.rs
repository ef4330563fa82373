//! Token-addressed registry of model variants

use super::config::TrainingConfig;
use super::decision_tree::DecisionTree;
use super::linear_models::LogisticRegression;
use super::models::ChurnModel;
use crate::error::{ChurnError, Result};

/// Builds an untrained model from the training configuration
pub type BuildFn = fn(&TrainingConfig) -> Box<dyn ChurnModel>;

/// Restores a fitted model from its serialized parameters
pub type LoadFn = fn(&[u8]) -> Result<Box<dyn ChurnModel>>;

/// One registered model variant
#[derive(Debug, Clone)]
pub struct ModelEntry {
    /// Canonical tag, also written into artifacts
    pub tag: &'static str,
    /// Extra tokens accepted for this variant
    pub aliases: &'static [&'static str],
    build: BuildFn,
    load: LoadFn,
}

impl ModelEntry {
    pub fn new(tag: &'static str, aliases: &'static [&'static str], build: BuildFn, load: LoadFn) -> Self {
        Self { tag, aliases, build, load }
    }

    fn matches(&self, token: &str) -> bool {
        self.tag.eq_ignore_ascii_case(token) || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(token))
    }

    /// Fresh, unfitted model
    pub fn build(&self, config: &TrainingConfig) -> Box<dyn ChurnModel> {
        (self.build)(config)
    }

    /// Fitted model from artifact bytes
    pub fn load(&self, bytes: &[u8]) -> Result<Box<dyn ChurnModel>> {
        (self.load)(bytes)
    }
}

/// Registry of model variants, looked up by case-insensitive token
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ModelRegistry {
    /// Registry with no variants
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Logistic regression and decision tree
    pub fn with_defaults() -> Self {
        Self {
            entries: vec![
                ModelEntry::new(
                    "logistic_regression",
                    &["lr", "logistic"],
                    |config| Box::new(LogisticRegression::from_config(&config.logistic)),
                    |bytes| Ok(Box::new(LogisticRegression::from_bytes(bytes)?)),
                ),
                ModelEntry::new(
                    "decision_tree",
                    &["dt", "tree"],
                    |config| Box::new(DecisionTree::from_config(&config.tree)),
                    |bytes| Ok(Box::new(DecisionTree::from_bytes(bytes)?)),
                ),
            ],
        }
    }

    /// Add a variant. Fails if any of its tokens is already taken.
    pub fn register(&mut self, entry: ModelEntry) -> Result<()> {
        let tokens = std::iter::once(entry.tag).chain(entry.aliases.iter().copied());
        for token in tokens {
            if let Some(existing) = self.entries.iter().find(|e| e.matches(token)) {
                return Err(ChurnError::ConfigError(format!(
                    "Model token '{}' already registered for {}",
                    token, existing.tag
                )));
            }
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Find the variant for a caller-supplied token
    pub fn resolve(&self, token: &str) -> Result<&ModelEntry> {
        let token = token.trim();
        self.entries
            .iter()
            .find(|e| e.matches(token))
            .ok_or_else(|| ChurnError::UnsupportedModelType(token.to_string()))
    }

    /// Canonical tags in registration order
    pub fn tags(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.tag).collect()
    }
}

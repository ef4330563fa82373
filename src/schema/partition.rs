//! Numeric / categorical split of the feature columns

use super::SchemaMapping;
use serde::{Deserialize, Serialize};

/// Two disjoint, exhaustive sets over the feature columns.
///
/// Features are every column except the identifier and the label. Only
/// columns resolved as numeric fields go to the numeric branch; everything
/// else is categorical.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeaturePartition {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl FeaturePartition {
    /// Derive the partition from the dataset columns and a resolved mapping
    pub fn derive(columns: &[String], mapping: &SchemaMapping) -> Self {
        let excluded = [mapping.identifier(), mapping.target()];
        let features: Vec<&String> = columns
            .iter()
            .filter(|c| !excluded.contains(&Some(c.as_str())))
            .collect();

        let numeric: Vec<String> = mapping
            .numeric_columns()
            .into_iter()
            .filter(|c| features.iter().any(|f| f.as_str() == *c))
            .map(str::to_string)
            .collect();

        let categorical = features
            .into_iter()
            .filter(|c| !numeric.contains(c))
            .cloned()
            .collect();

        Self { numeric, categorical }
    }

    /// All feature columns, numeric first
    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.numeric.iter().chain(self.categorical.iter())
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

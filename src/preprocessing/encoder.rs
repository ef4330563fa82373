//! One-hot encoding for categorical columns

use crate::error::{ChurnError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One-hot encoder.
///
/// Categories are learned per column at fit time and kept sorted. A value
/// never seen during fit encodes to an all-zero indicator vector.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    // column name -> sorted categories, in fit column order
    categories: Vec<(String, Vec<String>)>,
    is_fitted: bool,
}

impl OneHotEncoder {
    /// Create a new encoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the encoder to string columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.categories.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.to_string()))?;
            let seen: BTreeSet<String> = column
                .as_materialized_series()
                .str()?
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            self.categories
                .push((col_name.to_string(), seen.into_iter().collect()));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Encode into a dense indicator block
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let mut out = Array2::zeros((df.height(), self.n_outputs()));
        let mut offset = 0;

        for (col_name, cats) in &self.categories {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let ca = column.as_materialized_series().str()?;
            for (i, v) in ca.into_iter().enumerate() {
                if let Some(pos) = v.and_then(|s| cats.binary_search_by(|c| c.as_str().cmp(s)).ok()) {
                    out[[i, offset + pos]] = 1.0;
                }
            }
            offset += cats.len();
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Total number of indicator columns
    pub fn n_outputs(&self) -> usize {
        self.categories.iter().map(|(_, c)| c.len()).sum()
    }

    /// `<column>_<category>` for every indicator, in output order
    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .flat_map(|(col, cats)| cats.iter().map(move |cat| format!("{}_{}", col, cat)))
            .collect()
    }
}

//! Missing value imputation

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Strategy for imputing missing values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    /// Replace with median (numeric columns)
    Median,
    /// Replace with the most frequent value; ties go to the smallest value (string columns)
    MostFrequent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ImputeValue {
    Numeric(f64),
    String(String),
}

/// Placeholder used when a categorical column has no observed values
const MISSING_CATEGORY: &str = "missing";

/// Imputer for handling missing values
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Imputer {
    strategy: ImputeStrategy,
    fill_values: HashMap<String, ImputeValue>,
    is_fitted: bool,
}

impl Imputer {
    /// Create a new imputer with the specified strategy
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self {
            strategy,
            fill_values: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit the imputer to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.fill_values.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.to_string()))?;

            let fill_value = self.compute_fill_value(column.as_materialized_series())?;
            self.fill_values.insert(col_name.to_string(), fill_value);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Transform the data by imputing missing values
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let mut result = df.clone();
        for (col_name, fill_value) in &self.fill_values {
            if let Ok(column) = df.column(col_name) {
                let filled = Self::fill_series(column.as_materialized_series(), fill_value)?;
                result.with_column(filled)?;
            }
        }

        Ok(result)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<DataFrame> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    /// Numeric fill value learned for a column
    #[cfg(test)]
    fn numeric_fill(&self, column: &str) -> Option<f64> {
        match self.fill_values.get(column)? {
            ImputeValue::Numeric(v) => Some(*v),
            ImputeValue::String(_) => None,
        }
    }

    /// String fill value learned for a column
    #[cfg(test)]
    fn string_fill(&self, column: &str) -> Option<&str> {
        match self.fill_values.get(column)? {
            ImputeValue::String(s) => Some(s.as_str()),
            ImputeValue::Numeric(_) => None,
        }
    }

    fn observed_f64(series: &Series) -> Result<Vec<f64>> {
        Ok(series.f64()?.into_iter().flatten().collect())
    }

    fn median(mut values: Vec<f64>) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));
        let mid = values.len() / 2;
        if values.len() % 2 == 0 {
            Some((values[mid - 1] + values[mid]) / 2.0)
        } else {
            Some(values[mid])
        }
    }

    /// Mode for a string series; the lexicographically smallest value wins a tie
    fn compute_mode_string(series: &Series) -> Result<Option<String>> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for val in series.str()?.into_iter().flatten() {
            *counts.entry(val).or_insert(0) += 1;
        }

        let mut best: Option<(&str, usize)> = None;
        for (val, count) in counts {
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((val, count));
            }
        }
        Ok(best.map(|(v, _)| v.to_string()))
    }

    fn compute_fill_value(&self, series: &Series) -> Result<ImputeValue> {
        let name = series.name();
        let value = match &self.strategy {
            ImputeStrategy::Median => {
                let median = Self::median(Self::observed_f64(series)?);
                ImputeValue::Numeric(median.unwrap_or_else(|| {
                    warn!(column = %name, "no observed values, imputing 0.0");
                    0.0
                }))
            }
            ImputeStrategy::MostFrequent => {
                let mode = Self::compute_mode_string(series)?;
                ImputeValue::String(mode.unwrap_or_else(|| {
                    warn!(column = %name, "no observed values, imputing placeholder category");
                    MISSING_CATEGORY.to_string()
                }))
            }
        };
        Ok(value)
    }

    fn fill_series(series: &Series, fill_value: &ImputeValue) -> Result<Series> {
        match fill_value {
            ImputeValue::Numeric(val) => {
                let filled: Float64Chunked = series
                    .f64()?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(*val)))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
            ImputeValue::String(val) => {
                let filled: StringChunked = series
                    .str()?
                    .into_iter()
                    .map(|opt| Some(opt.unwrap_or(val.as_str()).to_string()))
                    .collect();
                Ok(filled.with_name(series.name().clone()).into_series())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputer_creation() {
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(!imputer.is_fitted);
    }

    #[test]
    fn test_median_imputation() {
        let df = df!("a" => &[Some(1.0), None, Some(3.0), Some(10.0)]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        let result = imputer.fit_transform(&df, &["a"]).unwrap();

        assert_eq!(imputer.numeric_fill("a"), Some(3.0));
        let col = result.column("a").unwrap().as_materialized_series().f64().unwrap();
        assert_eq!(col.null_count(), 0);
        assert_eq!(col.get(1), Some(3.0));
    }

    #[test]
    fn test_median_even_count() {
        let df = df!("a" => &[Some(1.0), Some(2.0), Some(3.0), Some(4.0), None]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::Median);
        imputer.fit(&df, &["a"]).unwrap();
        assert_eq!(imputer.numeric_fill("a"), Some(2.5));
    }

    #[test]
    fn test_most_frequent_string_tie_breaks_smallest() {
        let df = df!("c" => &[Some("b"), Some("a"), None, Some("b"), Some("a")]).unwrap();
        let mut imputer = Imputer::new(ImputeStrategy::MostFrequent);
        let result = imputer.fit_transform(&df, &["c"]).unwrap();

        assert_eq!(imputer.string_fill("c"), Some("a"));
        let col = result.column("c").unwrap().as_materialized_series().str().unwrap();
        assert_eq!(col.get(2), Some("a"));
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = df!("a" => &[1.0]).unwrap();
        let imputer = Imputer::new(ImputeStrategy::Median);
        assert!(matches!(imputer.transform(&df), Err(ChurnError::ModelNotFitted)));
    }
}

//! Feature scaling

use crate::error::{ChurnError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for a fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ScalerParams {
    center: f64,
    scale: f64,
}

/// Z-score scaler. Statistics are captured at fit time and reused unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scaler {
    /// Ordered by fit columns, which fixes the output column order
    params: Vec<(String, ScalerParams)>,
    is_fitted: bool,
}

impl Scaler {
    /// Create a new scaler
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        self.params.clear();
        for col_name in columns {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.to_string()))?;
            let values: Vec<f64> = column
                .as_materialized_series()
                .f64()?
                .into_iter()
                .flatten()
                .collect();

            let params = Self::compute_params(&values);
            self.params.push((col_name.to_string(), params));
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Scale the fitted columns into a dense block, one output column per fit column
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut out = Array2::zeros((n_rows, self.params.len()));

        for (j, (col_name, params)) in self.params.iter().enumerate() {
            let column = df
                .column(col_name)
                .map_err(|_| ChurnError::FeatureNotFound(col_name.clone()))?;
            let ca = column.as_materialized_series().f64()?;
            for (i, v) in ca.into_iter().enumerate() {
                // a missing value lands on the center
                out[[i, j]] = v.map_or(0.0, |x| (x - params.center) / params.scale);
            }
        }

        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(&mut self, df: &DataFrame, columns: &[&str]) -> Result<Array2<f64>> {
        self.fit(df, columns)?;
        self.transform(df)
    }

    fn compute_params(values: &[f64]) -> ScalerParams {
        if values.is_empty() {
            return ScalerParams { center: 0.0, scale: 1.0 };
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        // population std, as in the usual z-score scaler
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();
        ScalerParams {
            center: mean,
            scale: if std == 0.0 { 1.0 } else { std },
        }
    }
}

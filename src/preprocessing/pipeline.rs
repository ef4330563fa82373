//! Two-branch feature pipeline

use super::{
    coerce_numeric, config::PreprocessingConfig, Imputer, OneHotEncoder, Scaler,
};
use crate::error::{ChurnError, Result};
use crate::schema::FeaturePartition;
use ndarray::{concatenate, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::debug;

/// Fitted preprocessing for the churn feature matrix.
///
/// Numeric columns are coerced to floats, imputed with the fit-time median
/// and standardized. Categorical columns are imputed with the fit-time most
/// frequent value and one-hot encoded. Output columns are the numeric block
/// followed by the categorical indicator block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturePipeline {
    config: PreprocessingConfig,
    partition: FeaturePartition,
    numeric_imputer: Imputer,
    categorical_imputer: Imputer,
    scaler: Scaler,
    encoder: OneHotEncoder,
    feature_names: Vec<String>,
    is_fitted: bool,
}

impl FeaturePipeline {
    /// Create an unfitted pipeline over a fixed feature partition
    pub fn new(config: PreprocessingConfig, partition: FeaturePartition) -> Self {
        Self {
            numeric_imputer: Imputer::new(config.numeric_impute_strategy.clone()),
            categorical_imputer: Imputer::new(config.categorical_impute_strategy.clone()),
            scaler: Scaler::new(),
            encoder: OneHotEncoder::new(),
            config,
            partition,
            feature_names: Vec::new(),
            is_fitted: false,
        }
    }

    /// Learn imputation, scaling and encoding statistics from `df`
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        self.fit_transform(df)?;
        Ok(self)
    }

    /// Fit on `df` and return its feature matrix
    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        if self.partition.is_empty() {
            return Err(ChurnError::DataError(
                "no feature columns left after excluding identifier and target".to_string(),
            ));
        }
        let start = Instant::now();
        let prepared = self.prepare(df)?;

        let numeric: Vec<&str> = self.partition.numeric.iter().map(String::as_str).collect();
        let categorical: Vec<&str> = self
            .partition
            .categorical
            .iter()
            .map(String::as_str)
            .collect();

        let numeric_imputer = &mut self.numeric_imputer;
        let scaler = &mut self.scaler;
        let categorical_imputer = &mut self.categorical_imputer;
        let encoder = &mut self.encoder;

        let mut numeric_branch = || -> Result<Array2<f64>> {
            let imputed = numeric_imputer.fit_transform(&prepared, &numeric)?;
            scaler.fit_transform(&imputed, &numeric)
        };
        let mut categorical_branch = || -> Result<Array2<f64>> {
            let imputed = categorical_imputer.fit_transform(&prepared, &categorical)?;
            encoder.fit_transform(&imputed, &categorical)
        };

        let (num_block, cat_block) = if self.config.parallel_branches {
            rayon::join(numeric_branch, categorical_branch)
        } else {
            (numeric_branch(), categorical_branch())
        };
        let matrix = concatenate(Axis(1), &[num_block?.view(), cat_block?.view()])?;

        self.feature_names = self
            .partition
            .numeric
            .iter()
            .map(|c| format!("num__{}", c))
            .chain(self.encoder.feature_names().into_iter().map(|c| format!("cat__{}", c)))
            .collect();
        self.is_fitted = true;

        debug!(
            rows = matrix.nrows(),
            features = matrix.ncols(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fitted feature pipeline"
        );
        Ok(matrix)
    }

    /// Apply the fitted statistics to `df`
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(ChurnError::ModelNotFitted);
        }
        let prepared = self.prepare(df)?;

        let numeric_branch = || -> Result<Array2<f64>> {
            let imputed = self.numeric_imputer.transform(&prepared)?;
            self.scaler.transform(&imputed)
        };
        let categorical_branch = || -> Result<Array2<f64>> {
            let imputed = self.categorical_imputer.transform(&prepared)?;
            self.encoder.transform(&imputed)
        };

        let (num_block, cat_block) = if self.config.parallel_branches {
            rayon::join(numeric_branch, categorical_branch)
        } else {
            (numeric_branch(), categorical_branch())
        };
        let matrix = concatenate(Axis(1), &[num_block?.view(), cat_block?.view()])?;

        if matrix.ncols() != self.feature_names.len() {
            return Err(ChurnError::ShapeError {
                expected: format!("{} features", self.feature_names.len()),
                actual: format!("{} features", matrix.ncols()),
            });
        }
        Ok(matrix)
    }

    /// Output column names: `num__<column>` then `cat__<column>_<category>`
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Input columns this pipeline reads
    pub fn partition(&self) -> &FeaturePartition {
        &self.partition
    }

    /// Select the partition columns and normalize their dtypes
    fn prepare(&self, df: &DataFrame) -> Result<DataFrame> {
        let mut columns: Vec<Column> = Vec::with_capacity(self.partition.len());

        for name in &self.partition.numeric {
            let column = df
                .column(name)
                .map_err(|_| ChurnError::FeatureNotFound(name.clone()))?;
            let coerced = coerce_numeric(column.as_materialized_series())?;
            if coerced.failures > 0 {
                debug!(
                    column = %name,
                    failures = coerced.failures,
                    "Unparseable or non-finite numeric values treated as missing"
                );
            }
            columns.push(coerced.series.into());
        }

        for name in &self.partition.categorical {
            let column = df
                .column(name)
                .map_err(|_| ChurnError::FeatureNotFound(name.clone()))?;
            let series = column.as_materialized_series();
            let as_str = if series.dtype().is_float() {
                let ca: Float64Chunked = series
                    .cast(&DataType::Float64)?
                    .f64()?
                    .into_iter()
                    .map(|v| v.filter(|x| !x.is_nan()))
                    .collect();
                ca.with_name(series.name().clone()).into_series().cast(&DataType::String)?
            } else {
                series.cast(&DataType::String)?
            };
            columns.push(as_str.into());
        }

        Ok(DataFrame::new(columns)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition() -> FeaturePartition {
        FeaturePartition {
            numeric: vec!["tenure".to_string(), "total_charges".to_string()],
            categorical: vec!["contract".to_string()],
        }
    }

    fn frame() -> DataFrame {
        df!(
            "tenure" => &[1i64, 12, 24, 48],
            "total_charges" => &["29.85", " ", "1889.5", "108.15"],
            "contract" => &["Month-to-month", "One year", "Month-to-month", "Two year"]
        )
        .unwrap()
    }

    #[test]
    fn test_fit_transform_layout() {
        let mut pipeline = FeaturePipeline::new(PreprocessingConfig::default(), partition());
        let x = pipeline.fit_transform(&frame()).unwrap();

        assert_eq!(x.shape(), &[4, 5]);
        assert_eq!(
            pipeline.feature_names(),
            &[
                "num__tenure",
                "num__total_charges",
                "cat__contract_Month-to-month",
                "cat__contract_One year",
                "cat__contract_Two year",
            ]
        );
        assert!(x.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_blank_numeric_gets_median() {
        let mut pipeline = FeaturePipeline::new(PreprocessingConfig::default(), partition());
        pipeline.fit(&frame()).unwrap();

        // median of 29.85, 108.15, 1889.5 is 108.15, which scales to the same value
        let x = pipeline.transform(&frame()).unwrap();
        assert!((x[[1, 1]] - x[[3, 1]]).abs() < 1e-12);
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let mut par = FeaturePipeline::new(PreprocessingConfig::default(), partition());
        let mut seq = FeaturePipeline::new(
            PreprocessingConfig::default().with_parallel_branches(false),
            partition(),
        );
        assert_eq!(par.fit_transform(&frame()).unwrap(), seq.fit_transform(&frame()).unwrap());
    }

    #[test]
    fn test_float_categorical_nan_gets_mode() {
        let partition = FeaturePartition {
            numeric: vec!["tenure".to_string()],
            categorical: vec!["plan".to_string()],
        };
        let df = df!(
            "tenure" => &[1i64, 12, 24, 48],
            "plan" => &[1.0f64, f64::NAN, 1.0, 2.0]
        )
        .unwrap();

        let mut pipeline = FeaturePipeline::new(PreprocessingConfig::default(), partition);
        let x = pipeline.fit_transform(&df).unwrap();

        assert_eq!(x.shape(), &[4, 3]);
        assert!(pipeline.feature_names().iter().all(|n| !n.contains("NaN")));
        assert_eq!(x.row(1).slice(ndarray::s![1..]), x.row(0).slice(ndarray::s![1..]));
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut pipeline = FeaturePipeline::new(PreprocessingConfig::default(), partition());
        pipeline.fit(&frame()).unwrap();

        let df = df!("tenure" => &[1i64], "contract" => &["One year"]).unwrap();
        let err = pipeline.transform(&df).unwrap_err();
        assert!(matches!(err, ChurnError::FeatureNotFound(ref c) if c == "total_charges"));
    }

    #[test]
    fn test_transform_before_fit() {
        let pipeline = FeaturePipeline::new(PreprocessingConfig::default(), partition());
        assert!(matches!(pipeline.transform(&frame()), Err(ChurnError::ModelNotFitted)));
    }
}

//! Training orchestration: split, fit, evaluate, package, persist

use super::config::TrainingConfig;
use super::metrics::{ClassificationMetrics, ConfusionMatrix, RocPoint, DECISION_THRESHOLD};
use super::models::{ChurnModel, FeatureImportance};
use super::registry::{ModelEntry, ModelRegistry};
use super::split::{train_test_split, TrainTestSplit};
use crate::error::{ChurnError, Result};
use crate::export::{self, ArtifactMetadata};
use crate::preprocessing::{encode_target, FeaturePipeline, PreprocessingConfig};
use crate::schema::{self, AliasTable, FeaturePartition, SchemaMapping};
use chrono::Utc;
use ndarray::{Array1, Array2, Axis};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Number of features reported per model on the comparison path
pub const TOP_FEATURES: usize = 10;

/// Churn prediction for one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub customer_id: String,
    pub churn_probability: f64,
    pub is_churn: bool,
}

/// Everything one training invocation produces
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub model_id: String,
    pub model_type: String,
    pub metrics: ClassificationMetrics,
    pub feature_importance: Vec<FeatureImportance>,
    pub model_path: String,
    /// One record per held-out row, in split order
    pub predictions: Vec<PredictionRecord>,
    pub roc_curve: Vec<RocPoint>,
    pub confusion_matrix: ConfusionMatrix,
}

/// Held-out results for one model on the comparison path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelComparison {
    pub model_type: String,
    pub metrics: ClassificationMetrics,
    pub top_features: Vec<FeatureImportance>,
    pub training_time_secs: f64,
}

/// Models trained on one shared split, best AUC-ROC first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub n_train: usize,
    pub n_test: usize,
    pub n_features: usize,
    pub models: Vec<ModelComparison>,
}

impl ComparisonReport {
    pub fn best(&self) -> Option<&ModelComparison> {
        self.models.first()
    }
}

/// Fitted preprocessing plus fitted model, scored as one unit
#[derive(Debug)]
pub struct FittedPipeline {
    preprocessor: FeaturePipeline,
    model: Box<dyn ChurnModel>,
    aliases: AliasTable,
}

impl FittedPipeline {
    pub(crate) fn new(preprocessor: FeaturePipeline, model: Box<dyn ChurnModel>, aliases: AliasTable) -> Self {
        Self {
            preprocessor,
            model,
            aliases,
        }
    }

    pub fn model_type(&self) -> &'static str {
        self.model.model_type()
    }

    /// Encoded feature names, in model input order
    pub fn feature_names(&self) -> &[String] {
        self.preprocessor.feature_names()
    }

    pub(crate) fn preprocessor(&self) -> &FeaturePipeline {
        &self.preprocessor
    }

    pub(crate) fn model(&self) -> &dyn ChurnModel {
        self.model.as_ref()
    }

    pub(crate) fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Churn probability for every row of `dataset`
    pub fn predict_proba(&self, dataset: &DataFrame) -> Result<Array1<f64>> {
        let x = self.preprocessor.transform(dataset)?;
        self.model.predict_proba(&x)
    }

    /// Normalized importances, highest first
    pub fn feature_importance(&self) -> Result<Vec<FeatureImportance>> {
        self.model.feature_importance(self.preprocessor.feature_names())
    }

    /// Prediction records for every row; the churn column is not required
    pub fn score(&self, dataset: &DataFrame) -> Result<Vec<PredictionRecord>> {
        if dataset.height() == 0 {
            return Err(ChurnError::EmptyDataset);
        }
        let proba = self.predict_proba(dataset)?;
        let columns = column_names(dataset);
        let mapping = schema::map_columns(&columns, &self.aliases);
        let rows: Vec<usize> = (0..dataset.height()).collect();
        let ids = customer_ids(dataset, mapping.identifier(), &rows)?;
        Ok(package_predictions(ids, &proba))
    }
}

/// Schema, labels and partition for one dataset
struct PreparedData {
    mapping: SchemaMapping,
    labels: Array1<f64>,
    partition: FeaturePartition,
}

/// Feature matrices for one split with the preprocessor fitted on its train rows
struct EncodedSplit {
    preprocessor: FeaturePipeline,
    x_train: Array2<f64>,
    y_train: Array1<f64>,
    x_test: Array2<f64>,
    y_test: Array1<f64>,
}

/// Runs training invocations against a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct ChurnTrainer {
    config: TrainingConfig,
    preprocessing: PreprocessingConfig,
    aliases: AliasTable,
    registry: ModelRegistry,
}

impl ChurnTrainer {
    /// Create a trainer with default preprocessing, the Telco alias table and the built-in models
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_preprocessing(mut self, preprocessing: PreprocessingConfig) -> Self {
        self.preprocessing = preprocessing;
        self
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_registry(mut self, registry: ModelRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Train one model, evaluate it on the held-out split and persist it.
    ///
    /// The model token and model id are checked before the dataset is read.
    /// The artifact is written last; any earlier failure leaves no file.
    pub fn run(
        &self,
        dataset: &DataFrame,
        model_type: &str,
        output_directory: impl AsRef<Path>,
        model_id: &str,
    ) -> Result<EvaluationResult> {
        let entry = self.registry.resolve(model_type)?;
        let output_directory = output_directory.as_ref();
        export::artifact_path(output_directory, model_id)?;

        info!(
            model_id,
            model_type = entry.tag,
            rows = dataset.height(),
            seed = self.config.random_state,
            "Starting training run"
        );
        let start = Instant::now();

        let prepared = self.prepare(dataset)?;
        let split = train_test_split(dataset.height(), self.config.test_size, self.config.random_state)?;
        let encoded = self.encode_split(dataset, &prepared, &split)?;

        let mut model = entry.build(&self.config);
        let report = model.train(&encoded.x_train, &encoded.y_train, &encoded.x_test, &encoded.y_test)?;
        let test_proba = model.predict_proba(&encoded.x_test)?;

        let pipeline = FittedPipeline::new(encoded.preprocessor, model, self.aliases.clone());
        let feature_importance = pipeline.feature_importance()?;

        let ids = customer_ids(dataset, prepared.mapping.identifier(), &split.test)?;
        let predictions = package_predictions(ids, &test_proba);

        let metadata = ArtifactMetadata {
            model_id: model_id.to_string(),
            model_type: entry.tag.to_string(),
            trained_at: Utc::now(),
            feature_names: pipeline.feature_names().to_vec(),
            n_train_samples: split.train.len(),
            metrics: report.metrics,
        };
        let model_path = export::store(&pipeline, &metadata, output_directory, model_id)?;

        info!(
            model_id,
            accuracy = report.metrics.accuracy,
            auc_roc = report.metrics.auc_roc,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Training run complete"
        );

        Ok(EvaluationResult {
            model_id: model_id.to_string(),
            model_type: entry.tag.to_string(),
            metrics: report.metrics,
            feature_importance,
            model_path: model_path.display().to_string(),
            predictions,
            roc_curve: report.roc_curve,
            confusion_matrix: report.confusion_matrix,
        })
    }

    /// Train every requested model on one shared split, ranked by AUC-ROC.
    ///
    /// Nothing is persisted. Repeated tokens for the same variant train it once.
    pub fn compare(&self, dataset: &DataFrame, tokens: &[&str]) -> Result<ComparisonReport> {
        let mut seen = HashSet::new();
        let mut entries: Vec<&ModelEntry> = Vec::new();
        for token in tokens {
            let entry = self.registry.resolve(token)?;
            if seen.insert(entry.tag) {
                entries.push(entry);
            }
        }
        if entries.is_empty() {
            return Err(ChurnError::ConfigError("No model types requested".to_string()));
        }

        let prepared = self.prepare(dataset)?;
        let split = train_test_split(dataset.height(), self.config.test_size, self.config.random_state)?;
        let encoded = self.encode_split(dataset, &prepared, &split)?;

        let mut models = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut model = entry.build(&self.config);
            let report = model.train(&encoded.x_train, &encoded.y_train, &encoded.x_test, &encoded.y_test)?;
            let importance = model.feature_importance(encoded.preprocessor.feature_names())?;

            info!(
                model_type = entry.tag,
                accuracy = report.metrics.accuracy,
                auc_roc = report.metrics.auc_roc,
                "Model evaluated"
            );
            models.push(ModelComparison {
                model_type: entry.tag.to_string(),
                metrics: report.metrics,
                top_features: importance.into_iter().take(TOP_FEATURES).collect(),
                training_time_secs: report.training_time_secs,
            });
        }
        models.sort_by(|a, b| b.metrics.auc_roc.total_cmp(&a.metrics.auc_roc));

        Ok(ComparisonReport {
            n_train: split.train.len(),
            n_test: split.test.len(),
            n_features: encoded.preprocessor.feature_names().len(),
            models,
        })
    }

    fn prepare(&self, dataset: &DataFrame) -> Result<PreparedData> {
        if dataset.height() == 0 {
            return Err(ChurnError::EmptyDataset);
        }

        let columns = column_names(dataset);
        let mapping = schema::resolve(&columns, &self.aliases)?;
        let target = mapping
            .target()
            .ok_or_else(|| ChurnError::DataError("churn column unresolved".to_string()))?;

        let encoded = encode_target(dataset.column(target)?.as_materialized_series())?;
        let partition = FeaturePartition::derive(&columns, &mapping);

        debug!(
            churn_column = target,
            identifier = ?mapping.identifier(),
            numeric = ?partition.numeric,
            categorical = ?partition.categorical,
            "Resolved schema"
        );
        info!(
            rows = dataset.height(),
            churned = encoded.positives,
            features = partition.len(),
            "Prepared dataset"
        );

        Ok(PreparedData {
            mapping,
            labels: encoded.labels,
            partition,
        })
    }

    fn encode_split(
        &self,
        dataset: &DataFrame,
        prepared: &PreparedData,
        split: &TrainTestSplit,
    ) -> Result<EncodedSplit> {
        let train_df = take_rows(dataset, &split.train)?;
        let test_df = take_rows(dataset, &split.test)?;

        let mut preprocessor = FeaturePipeline::new(self.preprocessing.clone(), prepared.partition.clone());
        let x_train = preprocessor.fit_transform(&train_df)?;
        let x_test = preprocessor.transform(&test_df)?;

        Ok(EncodedSplit {
            preprocessor,
            x_train,
            y_train: prepared.labels.select(Axis(0), &split.train),
            x_test,
            y_test: prepared.labels.select(Axis(0), &split.test),
        })
    }
}

fn column_names(dataset: &DataFrame) -> Vec<String> {
    dataset
        .get_column_names()
        .iter()
        .map(|c| c.to_string())
        .collect()
}

fn take_rows(dataset: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec("idx".into(), rows.iter().map(|&r| r as IdxSize).collect());
    Ok(dataset.take(&idx)?)
}

/// Identifier for each row position; `CUST-<row>` when absent or null
fn customer_ids(dataset: &DataFrame, identifier: Option<&str>, rows: &[usize]) -> Result<Vec<String>> {
    let Some(column) = identifier else {
        return Ok(rows.iter().map(|r| format!("CUST-{}", r)).collect());
    };
    let as_str = dataset
        .column(column)?
        .as_materialized_series()
        .cast(&DataType::String)?;
    let ca = as_str.str()?;
    Ok(rows
        .iter()
        .map(|&r| {
            ca.get(r)
                .map(str::to_string)
                .unwrap_or_else(|| format!("CUST-{}", r))
        })
        .collect())
}

fn package_predictions(ids: Vec<String>, proba: &Array1<f64>) -> Vec<PredictionRecord> {
    ids.into_iter()
        .zip(proba.iter())
        .map(|(customer_id, &p)| PredictionRecord {
            customer_id,
            churn_probability: p,
            is_churn: p > DECISION_THRESHOLD,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset() -> DataFrame {
        let n = 40;
        let tenure: Vec<i64> = (0..n).map(|i| i * 2).collect();
        let churn: Vec<&str> = (0..n).map(|i| if i < 16 { "Yes" } else { "No" }).collect();
        let contract: Vec<&str> = (0..n)
            .map(|i| if i % 3 == 0 { "Two year" } else { "Month-to-month" })
            .collect();
        df!(
            "tenure" => tenure,
            "Contract" => contract,
            "Churn" => churn
        )
        .unwrap()
    }

    #[test]
    fn test_customer_ids_fallback() {
        let df = df!("customerID" => &[Some("A-1"), None]).unwrap();
        let ids = customer_ids(&df, Some("customerID"), &[1, 0]).unwrap();
        assert_eq!(ids, vec!["CUST-1", "A-1"]);

        let ids = customer_ids(&df, None, &[3]).unwrap();
        assert_eq!(ids, vec!["CUST-3"]);
    }

    #[test]
    fn test_run_without_identifier_uses_row_positions() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = ChurnTrainer::new(TrainingConfig::single_model());
        let result = trainer.run(&dataset(), "lr", dir.path(), "unit").unwrap();

        let split = train_test_split(40, 0.25, 42).unwrap();
        let expected: Vec<String> = split.test.iter().map(|r| format!("CUST-{}", r)).collect();
        let actual: Vec<String> = result.predictions.iter().map(|p| p.customer_id.clone()).collect();
        assert_eq!(actual, expected);
        assert_eq!(result.model_type, "logistic_regression");
    }

    #[test]
    fn test_unknown_model_fails_before_data() {
        let trainer = ChurnTrainer::default();
        // an empty frame would fail with EmptyDataset if it were read
        let err = trainer.run(&DataFrame::empty(), "xyz", "unused", "m").unwrap_err();
        assert!(matches!(err, ChurnError::UnsupportedModelType(_)));
    }

    #[test]
    fn test_compare_ranks_by_auc() {
        let trainer = ChurnTrainer::new(TrainingConfig::comparison());
        let report = trainer.compare(&dataset(), &["dt", "lr", "logistic"]).unwrap();

        assert_eq!(report.models.len(), 2);
        assert_eq!(report.n_test, 8);
        assert!(report.models[0].metrics.auc_roc >= report.models[1].metrics.auc_roc);
    }
}

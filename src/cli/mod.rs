//! Churn CLI Module
//!
//! Command-line interface for training, comparison and scoring. Result
//! documents go to stdout as JSON; progress goes to stderr.

use clap::{Parser, Subcommand};
use colored::*;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::data::load_dataset;
use crate::error::{ChurnError, Result};
use crate::export::load_pipeline;
use crate::schema::AliasTable;
use crate::training::{
    ChurnTrainer, ComparisonReport, EvaluationResult, ModelRegistry, PredictionRecord,
    TrainingConfig, DEFAULT_SEED,
};

/// Model used when a request names none
pub const DEFAULT_MODEL_TYPE: &str = "logistic_regression";

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn muted(s: &str) -> ColoredString { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString    { s.truecolor(100, 210, 120) }

fn step_done(msg: &str, detail: &str) {
    eprintln!("  {} {} {}", ok("✓"), msg, dim(detail));
}

fn kv(key: &str, val: f64) {
    eprintln!("  {:<12} {}", muted(key), format!("{:.4}", val).white().bold());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "churn")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train, compare and score customer churn models")]
#[command(long_about = None)]
pub struct Cli {
    /// JSON alias table overriding the built-in column names
    #[arg(long, global = true)]
    pub schema: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train one model from an invocation record and persist it
    Train {
        /// Invocation record (JSON); read from stdin when omitted
        #[arg(short, long)]
        request: Option<PathBuf>,
    },

    /// Train several models on one shared 80/20 split and rank them
    Compare {
        /// Dataset file (csv, tsv, json, jsonl, parquet)
        #[arg(short, long)]
        data: PathBuf,

        /// Comma-separated model tokens
        #[arg(short, long, value_delimiter = ',', default_value = "lr,dt")]
        models: Vec<String>,

        /// Split seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },

    /// Score a dataset with a stored model artifact
    Predict {
        /// Model artifact path
        #[arg(short, long)]
        model: PathBuf,

        /// Dataset file
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Training request read by `churn train`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    pub dataset_location: String,
    pub model_id: String,
    pub output_directory: String,
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Invocation {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ChurnError::ConfigError(format!("Invalid invocation record: {}", e)))
    }

    pub fn model_type(&self) -> &str {
        self.model_type.as_deref().unwrap_or(DEFAULT_MODEL_TYPE)
    }
}

/// Payload printed instead of a result when a command fails
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

impl From<&ChurnError> for ErrorPayload {
    fn from(err: &ChurnError) -> Self {
        Self {
            error: ErrorBody {
                kind: err.kind().to_string(),
                message: err.to_string(),
            },
        }
    }
}

fn aliases(schema: Option<&Path>) -> Result<AliasTable> {
    match schema {
        Some(path) => AliasTable::from_json_file(path),
        None => Ok(AliasTable::default()),
    }
}

fn read_request(request: Option<&Path>) -> Result<String> {
    match request {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Run a parsed command and return the JSON document for stdout
pub fn execute(cli: &Cli) -> Result<String> {
    let aliases = aliases(cli.schema.as_deref())?;
    let json = match &cli.command {
        Commands::Train { request } => {
            let invocation = Invocation::from_json(&read_request(request.as_deref())?)?;
            serde_json::to_string_pretty(&cmd_train(&invocation, aliases)?)?
        }
        Commands::Compare { data, models, seed } => {
            let tokens: Vec<&str> = models.iter().map(String::as_str).collect();
            serde_json::to_string_pretty(&cmd_compare(data, &tokens, *seed, aliases)?)?
        }
        Commands::Predict { model, data } => serde_json::to_string_pretty(&cmd_predict(model, data)?)?,
    };
    Ok(json)
}

/// Single-model path: 75/25 split, artifact written
pub fn cmd_train(invocation: &Invocation, aliases: AliasTable) -> Result<EvaluationResult> {
    let config = TrainingConfig::single_model()
        .with_random_state(invocation.seed.unwrap_or(DEFAULT_SEED));
    let trainer = ChurnTrainer::new(config).with_aliases(aliases);

    // reject an unknown model before touching the dataset
    trainer.registry().resolve(invocation.model_type())?;

    let start = Instant::now();
    let df = load_dataset(&invocation.dataset_location)?;
    step_done(
        "Loaded dataset",
        &format!("{} rows × {} cols in {:?}", df.height(), df.width(), start.elapsed()),
    );

    let result = trainer.run(
        &df,
        invocation.model_type(),
        &invocation.output_directory,
        &invocation.model_id,
    )?;
    step_done(&format!("Trained {}", result.model_type.cyan()), &result.model_path);
    kv("Accuracy", result.metrics.accuracy);
    kv("AUC-ROC", result.metrics.auc_roc);
    Ok(result)
}

/// Comparison path: 80/20 split, nothing persisted
pub fn cmd_compare(data: &Path, tokens: &[&str], seed: u64, aliases: AliasTable) -> Result<ComparisonReport> {
    let config = TrainingConfig::comparison().with_random_state(seed);
    let trainer = ChurnTrainer::new(config).with_aliases(aliases);
    for token in tokens {
        trainer.registry().resolve(token)?;
    }

    let df = load_dataset(data)?;
    let report = trainer.compare(&df, tokens)?;
    for model in &report.models {
        step_done(
            &model.model_type,
            &format!("auc {:.4}  acc {:.4}", model.metrics.auc_roc, model.metrics.accuracy),
        );
    }
    Ok(report)
}

/// Score every row of a dataset with a stored artifact
pub fn cmd_predict(model: &Path, data: &Path) -> Result<Vec<PredictionRecord>> {
    let loaded = load_pipeline(model, &ModelRegistry::default())?;
    let df = load_dataset(data)?;
    let records = loaded.pipeline.score(&df)?;
    step_done(
        &format!("Scored {} records", records.len()),
        &format!("{} ({})", loaded.metadata.model_id, loaded.metadata.model_type),
    );
    Ok(records)
}

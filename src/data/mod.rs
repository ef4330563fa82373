//! Dataset loading

use crate::error::{ChurnError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

/// On-disk dataset format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv { separator: u8 },
    Json,
    JsonLines,
    Parquet,
}

impl DataFormat {
    /// Detect the format from the file extension; CSV when unknown
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "tsv" => DataFormat::Csv { separator: b'\t' },
            "json" => DataFormat::Json,
            "jsonl" | "ndjson" => DataFormat::JsonLines,
            "parquet" | "pq" => DataFormat::Parquet,
            _ => DataFormat::Csv { separator: b',' },
        }
    }
}

/// Data loader for the supported file formats
#[derive(Debug, Clone)]
pub struct DataLoader {
    /// Rows scanned to infer CSV column types; `None` scans the whole file
    infer_schema_length: Option<usize>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    /// Create a new data loader
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(10_000),
        }
    }

    /// Load a file, detecting the format from its extension
    pub fn load(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        self.load_as(path, DataFormat::from_path(path))
    }

    /// Load a file in an explicit format. Empty datasets are rejected.
    pub fn load_as(&self, path: &Path, format: DataFormat) -> Result<DataFrame> {
        let start = Instant::now();
        let file = File::open(path)
            .map_err(|e| ChurnError::DataError(format!("Cannot open {}: {}", path.display(), e)))?;

        let df = match format {
            DataFormat::Csv { separator } => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(self.infer_schema_length)
                .with_parse_options(CsvParseOptions::default().with_separator(separator))
                .into_reader_with_file_handle(file)
                .finish(),
            DataFormat::Json => JsonReader::new(file).with_json_format(JsonFormat::Json).finish(),
            DataFormat::JsonLines => JsonReader::new(file)
                .with_json_format(JsonFormat::JsonLines)
                .finish(),
            DataFormat::Parquet => ParquetReader::new(file).finish(),
        }
        .map_err(|e| ChurnError::DataError(format!("Cannot read {}: {}", path.display(), e)))?;

        if df.height() == 0 {
            return Err(ChurnError::EmptyDataset);
        }

        debug!(
            path = %path.display(),
            rows = df.height(),
            columns = df.width(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Loaded dataset"
        );
        Ok(df)
    }
}

/// Load a dataset with the default loader
pub fn load_dataset(path: impl AsRef<Path>) -> Result<DataFrame> {
    DataLoader::new().load(path)
}

//! Binary artifact format and file I/O

use crate::error::{ChurnError, Result};
use crate::preprocessing::FeaturePipeline;
use crate::schema::AliasTable;
use crate::training::{ClassificationMetrics, FittedPipeline, ModelRegistry};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Descriptive metadata stored alongside the fitted parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub model_id: String,
    /// Registry tag used to rebuild the model on load
    pub model_type: String,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub n_train_samples: usize,
    pub metrics: ClassificationMetrics,
}

/// A pipeline read back from disk
#[derive(Debug)]
pub struct LoadedArtifact {
    pub pipeline: FittedPipeline,
    pub metadata: ArtifactMetadata,
}

/// On-disk wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializedArtifact {
    /// Magic bytes for format detection
    magic: [u8; 4],
    format_version: u32,
    metadata: ArtifactMetadata,
    /// bincode-encoded payload
    payload: Vec<u8>,
    /// FNV-1a hash of `payload`
    checksum: u64,
}

impl SerializedArtifact {
    const MAGIC: [u8; 4] = [b'C', b'H', b'R', b'N'];
    const VERSION: u32 = 1;

    fn new(metadata: ArtifactMetadata, payload: Vec<u8>) -> Self {
        let checksum = Self::compute_checksum(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            payload,
            checksum,
        }
    }

    /// Compute checksum using FNV-1a hash
    fn compute_checksum(data: &[u8]) -> u64 {
        const FNV_OFFSET: u64 = 14695981039346656037;
        const FNV_PRIME: u64 = 1099511628211;

        let mut hash = FNV_OFFSET;
        for byte in data {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }

    fn verify_checksum(&self) -> bool {
        Self::compute_checksum(&self.payload) == self.checksum
    }
}

#[derive(Serialize)]
struct PayloadRef<'a> {
    aliases: &'a AliasTable,
    preprocessor: &'a FeaturePipeline,
    model: Vec<u8>,
}

#[derive(Deserialize)]
struct Payload {
    aliases: AliasTable,
    preprocessor: FeaturePipeline,
    model: Vec<u8>,
}

/// Artifact location for a model id. Rejects ids that are not a single path component.
pub fn artifact_path(output_directory: &Path, model_id: &str) -> Result<PathBuf> {
    let invalid = model_id.trim().is_empty()
        || model_id == "."
        || model_id == ".."
        || model_id.contains(['/', '\\']);
    if invalid {
        return Err(ChurnError::ConfigError(format!("Invalid model id: '{}'", model_id)));
    }
    Ok(output_directory.join(format!("model_{}.bin", model_id)))
}

/// Serialize a fitted pipeline and return where it was written.
///
/// Bytes go to a temporary sibling first and are renamed into place, so the
/// final path only ever holds a complete artifact.
pub fn store(
    pipeline: &FittedPipeline,
    metadata: &ArtifactMetadata,
    output_directory: &Path,
    model_id: &str,
) -> Result<PathBuf> {
    let path = artifact_path(output_directory, model_id)?;
    let write_failure = |reason: String| ChurnError::ArtifactWriteFailure {
        path: path.clone(),
        reason,
    };

    let payload = bincode::serialize(&PayloadRef {
        aliases: pipeline.aliases(),
        preprocessor: pipeline.preprocessor(),
        model: pipeline.model().to_bytes()?,
    })?;
    let bytes = bincode::serialize(&SerializedArtifact::new(metadata.clone(), payload))?;

    fs::create_dir_all(output_directory).map_err(|e| write_failure(e.to_string()))?;

    write_then_rename(&bytes, &path).map_err(|e| write_failure(e.to_string()))?;

    info!(path = %path.display(), bytes = bytes.len(), "Stored model artifact");
    Ok(path)
}

/// Write `bytes` to a `.tmp` sibling of `path`, then rename it into place.
/// The temporary file is removed if either step fails.
fn write_then_rename(bytes: &[u8], path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("bin.tmp");
    let outcome = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if outcome.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    outcome
}

/// Read an artifact and rebuild its pipeline through `registry`
pub fn load_pipeline(path: impl AsRef<Path>, registry: &ModelRegistry) -> Result<LoadedArtifact> {
    let path = path.as_ref();
    let read_failure = |reason: String| ChurnError::ArtifactReadFailure {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = fs::read(path).map_err(|e| read_failure(e.to_string()))?;
    let serialized: SerializedArtifact =
        bincode::deserialize(&bytes).map_err(|e| read_failure(format!("not a model artifact: {}", e)))?;

    if serialized.magic != SerializedArtifact::MAGIC {
        return Err(read_failure("not a model artifact: bad magic bytes".to_string()));
    }
    if serialized.format_version != SerializedArtifact::VERSION {
        return Err(read_failure(format!(
            "unsupported format version {}",
            serialized.format_version
        )));
    }
    if !serialized.verify_checksum() {
        return Err(read_failure("checksum verification failed, file may be corrupted".to_string()));
    }

    let payload: Payload =
        bincode::deserialize(&serialized.payload).map_err(|e| read_failure(e.to_string()))?;
    let entry = registry.resolve(&serialized.metadata.model_type)?;
    let model = entry.load(&payload.model)?;

    info!(
        path = %path.display(),
        model_id = %serialized.metadata.model_id,
        model_type = entry.tag,
        "Loaded model artifact"
    );
    Ok(LoadedArtifact {
        pipeline: FittedPipeline::new(payload.preprocessor, model, payload.aliases),
        metadata: serialized.metadata,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_path() {
        let path = artifact_path(Path::new("/tmp/models"), "churn-v1").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/models/model_churn-v1.bin"));
    }

    #[test]
    fn test_artifact_path_rejects_bad_ids() {
        for id in ["", "  ", "..", "a/b", "a\\b"] {
            assert!(matches!(
                artifact_path(Path::new("out"), id),
                Err(ChurnError::ConfigError(_))
            ));
        }
    }

    #[test]
    fn test_failed_rename_leaves_no_temporary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_m.bin");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), b"x").unwrap();

        assert!(write_then_rename(b"artifact", &path).is_err());
        assert!(!path.with_extension("bin.tmp").exists());
    }

    #[test]
    fn test_write_then_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_m.bin");

        write_then_rename(b"artifact", &path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"artifact");
        assert!(!path.with_extension("bin.tmp").exists());
    }

    #[test]
    fn test_checksum() {
        let metadata = ArtifactMetadata {
            model_id: "m".to_string(),
            model_type: "logistic_regression".to_string(),
            trained_at: Utc::now(),
            feature_names: Vec::new(),
            n_train_samples: 0,
            metrics: ClassificationMetrics::default(),
        };
        let mut artifact = SerializedArtifact::new(metadata, vec![1, 2, 3, 4]);
        assert!(artifact.verify_checksum());

        artifact.payload[0] = 9;
        assert!(!artifact.verify_checksum());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_pipeline(dir.path().join("model_none.bin"), &ModelRegistry::default()).unwrap_err();
        assert!(matches!(err, ChurnError::ArtifactReadFailure { .. }));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model_bad.bin");
        fs::write(&path, b"definitely not an artifact").unwrap();
        let err = load_pipeline(&path, &ModelRegistry::default()).unwrap_err();
        assert_eq!(err.kind(), "artifact_read_failure");
    }
}

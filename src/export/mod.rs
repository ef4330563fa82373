//! Model artifact persistence
//!
//! A fitted pipeline is written as one binary file per model id:
//! `<output_directory>/model_<model_id>.bin`. The file carries magic bytes,
//! a format version, metadata, and a checksummed payload holding the fitted
//! preprocessing parameters and the model's own serialized parameters.

mod serializer;

pub use serializer::{artifact_path, load_pipeline, store, ArtifactMetadata, LoadedArtifact};

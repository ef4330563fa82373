//! Integration test: artifact persistence, reload and scoring

use churn_predict::export::load_pipeline;
use churn_predict::prelude::*;
use churn_predict::training::ModelRegistry;
use polars::prelude::*;
use std::collections::HashMap;

fn create_dataset(n: usize) -> DataFrame {
    let ids: Vec<String> = (0..n).map(|i| format!("CUST{:03}", i)).collect();
    let tenure: Vec<i64> = (0..n).map(|i| ((i * 11) % 60) as i64).collect();
    let monthly: Vec<f64> = (0..n).map(|i| 30.0 + ((i * 17) % 70) as f64).collect();
    let contract: Vec<&str> = (0..n)
        .map(|i| ["Month-to-month", "One year", "Two year"][i % 3])
        .collect();
    let internet: Vec<Option<&str>> = (0..n)
        .map(|i| match i % 4 {
            0 => Some("DSL"),
            1 => Some("Fiber optic"),
            2 => Some("No"),
            _ => None,
        })
        .collect();
    let churn: Vec<&str> = (0..n)
        .map(|i| {
            let t = (i * 11) % 60;
            if i % 3 == 0 && t < 25 { "Yes" } else { "No" }
        })
        .collect();

    df!(
        "CustomerID" => ids,
        "Tenure" => tenure,
        "MonthlyCharges" => monthly,
        "Contract" => contract,
        "InternetService" => internet,
        "Churn" => churn
    )
    .unwrap()
}

#[test]
fn test_round_trip_reproduces_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let df = create_dataset(80);

    for token in ["lr", "dt"] {
        let result = ChurnTrainer::default().run(&df, token, dir.path(), token).unwrap();
        let loaded = load_pipeline(&result.model_path, &ModelRegistry::default()).unwrap();

        let scored: HashMap<String, f64> = loaded
            .pipeline
            .score(&df)
            .unwrap()
            .into_iter()
            .map(|p| (p.customer_id, p.churn_probability))
            .collect();

        for p in &result.predictions {
            let reloaded = scored[&p.customer_id];
            assert!(
                (reloaded - p.churn_probability).abs() < 1e-12,
                "{}: {} vs {}",
                p.customer_id,
                reloaded,
                p.churn_probability
            );
        }
    }
}

#[test]
fn test_artifact_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let df = create_dataset(80);
    let result = ChurnTrainer::default().run(&df, "lr", dir.path(), "meta").unwrap();

    let loaded = load_pipeline(&result.model_path, &ModelRegistry::default()).unwrap();
    let metadata = &loaded.metadata;

    assert_eq!(metadata.model_id, "meta");
    assert_eq!(metadata.model_type, "logistic_regression");
    assert_eq!(metadata.n_train_samples, 60);
    assert_eq!(metadata.metrics, result.metrics);
    assert_eq!(metadata.feature_names, loaded.pipeline.feature_names());
    assert_eq!(loaded.pipeline.model_type(), "logistic_regression");
    assert_eq!(
        &metadata.feature_names[..2],
        &["num__Tenure".to_string(), "num__MonthlyCharges".to_string()]
    );
}

#[test]
fn test_retraining_overwrites_the_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let df = create_dataset(80);
    let trainer = ChurnTrainer::default();

    let first = trainer.run(&df, "lr", dir.path(), "same").unwrap();
    let second = trainer.run(&df, "dt", dir.path(), "same").unwrap();
    assert_eq!(first.model_path, second.model_path);

    let loaded = load_pipeline(&second.model_path, &ModelRegistry::default()).unwrap();
    assert_eq!(loaded.metadata.model_type, "decision_tree");
    let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(leftovers.len(), 1);
}

#[test]
fn test_unknown_categories_score_without_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ChurnTrainer::default()
        .run(&create_dataset(80), "lr", dir.path(), "unknown")
        .unwrap();
    let loaded = load_pipeline(&result.model_path, &ModelRegistry::default()).unwrap();

    let fresh = df!(
        "CustomerID" => &["NEW1", "NEW2"],
        "Tenure" => &[3i64, 40],
        "MonthlyCharges" => &[99.0, 45.0],
        "Contract" => &["Three year", "Month-to-month"],
        "InternetService" => &["Satellite", "DSL"]
    )
    .unwrap();

    // the churn column is not needed for scoring
    let records = loaded.pipeline.score(&fresh).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].customer_id, "NEW1");
    assert!(records.iter().all(|r| (0.0..=1.0).contains(&r.churn_probability)));
}

#[test]
fn test_scoring_requires_training_columns() {
    let dir = tempfile::tempdir().unwrap();
    let result = ChurnTrainer::default()
        .run(&create_dataset(80), "lr", dir.path(), "cols")
        .unwrap();
    let loaded = load_pipeline(&result.model_path, &ModelRegistry::default()).unwrap();

    let partial = df!("CustomerID" => &["X"], "Tenure" => &[1i64]).unwrap();
    let err = loaded.pipeline.score(&partial).unwrap_err();
    assert!(matches!(err, ChurnError::FeatureNotFound(_)));
}

#[test]
fn test_corrupted_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let result = ChurnTrainer::default()
        .run(&create_dataset(80), "lr", dir.path(), "corrupt")
        .unwrap();

    let mut bytes = std::fs::read(&result.model_path).unwrap();
    let last = bytes.len() - 20;
    bytes[last] ^= 0xFF;
    std::fs::write(&result.model_path, &bytes).unwrap();

    let err = load_pipeline(&result.model_path, &ModelRegistry::default()).unwrap_err();
    assert!(matches!(err, ChurnError::ArtifactReadFailure { .. }));
}

#[test]
fn test_unwritable_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let err = ChurnTrainer::default()
        .run(&create_dataset(80), "lr", &blocker, "m")
        .unwrap_err();
    assert!(matches!(err, ChurnError::ArtifactWriteFailure { .. }));
    assert_eq!(err.kind(), "artifact_write_failure");
}

#[test]
fn test_artifact_needs_registered_model() {
    let dir = tempfile::tempdir().unwrap();
    let result = ChurnTrainer::default()
        .run(&create_dataset(80), "dt", dir.path(), "tree")
        .unwrap();

    let err = load_pipeline(&result.model_path, &ModelRegistry::empty()).unwrap_err();
    assert!(matches!(err, ChurnError::UnsupportedModelType(ref t) if t == "decision_tree"));
}

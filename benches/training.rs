use churn_predict::export::load_pipeline;
use churn_predict::training::{ChurnTrainer, ModelRegistry, TrainingConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

const CONTRACTS: [&str; 3] = ["Month-to-month", "One year", "Two year"];
const INTERNET: [&str; 3] = ["DSL", "Fiber optic", "No"];

fn create_churn_data(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(42);

    let mut ids = Vec::with_capacity(n_rows);
    let mut tenure = Vec::with_capacity(n_rows);
    let mut monthly = Vec::with_capacity(n_rows);
    let mut total = Vec::with_capacity(n_rows);
    let mut contract = Vec::with_capacity(n_rows);
    let mut internet = Vec::with_capacity(n_rows);
    let mut churn = Vec::with_capacity(n_rows);

    for i in 0..n_rows {
        let t: i64 = rng.gen_range(0..72);
        let m: f64 = rng.gen_range(18.0..120.0);
        let c = CONTRACTS[rng.gen_range(0..3)];
        let risk = (if c == "Month-to-month" { 0.45 } else { 0.1 }) + (if t < 12 { 0.25 } else { 0.0 });

        ids.push(format!("C{:06}", i));
        tenure.push(t);
        monthly.push(m);
        total.push(if rng.gen_bool(0.01) { " ".to_string() } else { format!("{:.2}", t as f64 * m) });
        contract.push(c);
        internet.push(INTERNET[rng.gen_range(0..3)]);
        churn.push(if rng.gen_bool(risk) { "Yes" } else { "No" });
    }

    df!(
        "customerID" => ids,
        "tenure" => tenure,
        "MonthlyCharges" => monthly,
        "TotalCharges" => total,
        "Contract" => contract,
        "InternetService" => internet,
        "Churn" => churn
    )
    .unwrap()
}

fn bench_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    for n_rows in [1000, 5000, 10000].iter() {
        let df = create_churn_data(*n_rows);
        let trainer = ChurnTrainer::new(TrainingConfig::comparison());

        for token in ["lr", "dt"] {
            group.bench_with_input(BenchmarkId::new(token, n_rows), &df, |b, df| {
                b.iter(|| trainer.compare(black_box(df), &[token]).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let mut group = c.benchmark_group("scoring");

    // Train and persist once
    let dir = tempfile::tempdir().unwrap();
    let result = ChurnTrainer::default()
        .run(&create_churn_data(5000), "lr", dir.path(), "bench")
        .unwrap();
    let loaded = load_pipeline(&result.model_path, &ModelRegistry::default()).unwrap();

    for n_rows in [100, 1000, 10000].iter() {
        let df = create_churn_data(*n_rows);

        group.bench_with_input(BenchmarkId::new("score", n_rows), &df, |b, df| {
            b.iter(|| loaded.pipeline.score(black_box(df)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_training, bench_scoring);
criterion_main!(benches);

//! Churn CLI entry point

use clap::Parser;
use churn_predict::cli::{execute, Cli, ErrorPayload};

fn main() -> anyhow::Result<()> {
    // stdout is reserved for the JSON result
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "churn_predict=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(err) => {
            tracing::error!(kind = err.kind(), "{}", err);
            println!("{}", serde_json::to_string_pretty(&ErrorPayload::from(&err))?);
            std::process::exit(1);
        }
    }
}

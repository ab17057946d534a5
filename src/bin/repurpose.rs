#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;

use anyhow::{Context, Result};
use repurpose::ai::{ProviderRegistry, build_providers};
use repurpose::core::config::Settings;
use repurpose::core::models::ProcessRequest;
use repurpose::pipeline::{HttpPageExtractor, LogReporter, Orchestrator};
use tokio::io::AsyncReadExt;
use tracing::{error, info};

/// Reads a request JSON document from the file named by the first argument,
/// or from stdin, and prints the response JSON to stdout.
#[tokio::main]
async fn main() -> Result<()> {
    repurpose::setup_logging();

    let settings = Settings::from_env()
        .map_err(anyhow::Error::msg)
        .context("Config error")?;
    let settings = Arc::new(settings);

    let raw = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read request file {path}"))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read request from stdin")?;
            buf
        }
    };
    let request: ProcessRequest =
        serde_json::from_str(&raw).context("Failed to parse request JSON")?;

    let registry = Arc::new(ProviderRegistry::new(build_providers(&settings), &settings));
    let extractor = Arc::new(HttpPageExtractor::new()?);
    let orchestrator = Orchestrator::new(Arc::clone(&settings), registry, extractor);

    match orchestrator.process(&request, Arc::new(LogReporter)).await {
        Ok(response) => {
            info!(
                provider = response.provider_id.as_str(),
                fallback = response.is_mock_fallback,
                "Request processed"
            );
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Err(e) => {
            error!("Processing failed: {}", e);
            Err(e.into())
        }
    }
}

//! One-shot reconciliation from JSON files, for adjuster spot checks and
//! pipeline smoke tests.

use clap::Args;
use flood_recon::config::AppConfig;
use flood_recon::error::AppError;
use flood_recon::oracle::{HttpVisualOracle, VisualOracle};
use flood_recon::Document;
use flood_recon::ReconciliationEngine;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct ReconcileArgs {
    /// Path to the extracted elevation-certificate JSON
    #[arg(long)]
    certificate: PathBuf,
    /// Path to the extracted application JSON
    #[arg(long)]
    application: PathBuf,
    /// Image references forwarded to the visual oracle (repeatable)
    #[arg(long = "image")]
    images: Vec<String>,
    /// Emit compact JSON instead of pretty-printed output
    #[arg(long)]
    compact: bool,
}

pub(crate) async fn run_reconcile(args: ReconcileArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let certificate = load_document(&args.certificate)?;
    let application = load_document(&args.application)?;

    let engine = ReconciliationEngine::new(Default::default(), config.oracle.retry_policy());
    let oracle = config
        .oracle
        .endpoint
        .as_deref()
        .map(HttpVisualOracle::new);
    let oracle_ref = oracle.as_ref().map(|o| o as &dyn VisualOracle);

    let report = engine
        .run(&certificate, &application, &args.images, oracle_ref)
        .await;

    let value = report.to_json();
    let rendered = if args.compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
    .expect("report serializes");
    println!("{rendered}");

    Ok(())
}

fn load_document(path: &PathBuf) -> Result<Document, AppError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(AppError::from)
}

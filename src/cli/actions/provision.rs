use crate::{cli::globals::GlobalArgs, provision};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub file: PathBuf,
}

/// Execute the provision action.
/// # Errors
/// Returns an error if the user file cannot be loaded or the provider URL is invalid.
/// Users that fail to be created are logged and counted, not returned as errors.
pub async fn execute(args: Args) -> Result<()> {
    let records = provision::load_records(&args.file)
        .with_context(|| format!("Could not load users from {}", args.file.display()))?;

    let directory = args
        .globals
        .provider()
        .context("Invalid identity provider URL")?;

    let report = provision::create_users(&directory, &records).await;

    if report.failed > 0 {
        warn!("{} of {} users were not created", report.failed, records.len());
    }

    println!("created: {}, failed: {}", report.created, report.failed);

    Ok(())
}

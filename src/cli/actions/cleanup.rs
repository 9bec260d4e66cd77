use crate::{cli::globals::GlobalArgs, provision};
use anyhow::{Context, Result};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub email_contains: String,
    pub limit: usize,
}

/// Execute the cleanup action.
/// # Errors
/// Returns an error if the provider URL is invalid or the user list cannot be fetched.
pub async fn execute(args: Args) -> Result<()> {
    let directory = args
        .globals
        .provider()
        .context("Invalid identity provider URL")?;

    let report = provision::cleanup_users(&directory, &args.email_contains, args.limit)
        .await
        .context("Cleanup failed")?;

    println!(
        "matched: {}, deleted: {}, failed: {}",
        report.matched, report.deleted, report.failed
    );

    Ok(())
}

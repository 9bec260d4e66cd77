use crate::{
    api,
    cli::globals::GlobalArgs,
    gate::{Gate, RouteMatcher},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub port: u16,
    pub session_cookie: String,
    pub sign_in_url: Option<String>,
    pub public_routes: Vec<String>,
    pub reset_routes: Vec<String>,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the provider URL or a route pattern is invalid, or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let provider = args
        .globals
        .provider()
        .context("Invalid identity provider URL")?
        .with_session_cookie(args.session_cookie);

    let routes = RouteMatcher::new(&args.public_routes, &args.reset_routes)
        .context("Invalid route configuration")?;

    let gate = Gate::new(Arc::new(provider), routes).with_sign_in_url(args.sign_in_url);

    api::new(args.port, gate).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("provider_url", args.globals.provider_url.clone()),
        ("session_cookie", args.session_cookie.clone()),
        (
            "sign_in_url",
            args.sign_in_url
                .clone()
                .unwrap_or_else(|| "none".to_string()),
        ),
        ("public_routes", args.public_routes.join(",")),
        ("reset_routes", args.reset_routes.join(",")),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = format!(
        "{} {} - {}\n\nStartup configuration:",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        short_commit(crate::GIT_COMMIT_HASH)
    );
    for (key, value) in &entries {
        let padding = " ".repeat(max_key_len.saturating_sub(key.len()));
        let _ =
            std::fmt::Write::write_fmt(&mut message, format_args!("\n  {key}:{padding} {value}"));
    }
    info!("{message}");
}

fn short_commit(hash: &str) -> &str {
    let trimmed = hash.trim();
    trimmed.get(..7).unwrap_or(trimmed)
}

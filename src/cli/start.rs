use crate::cli::{actions::Action, commands, dispatch, telemetry};
use anyhow::Result;
use tracing::debug;

/// Files read into the environment before arguments are parsed.
const ENV_FILES: [&str; 2] = [".env.local", ".env"];

/// Main entry point for the CLI - builds and returns the Action
///
/// # Errors
///
/// Returns an error if argument parsing, telemetry initialization, or action dispatch fails
pub fn start() -> Result<Action> {
    // Existing environment variables win over both files, and `.env.local` over `.env`.
    let loaded: Vec<_> = ENV_FILES
        .iter()
        .filter_map(|file| dotenvy::from_filename(file).ok())
        .collect();

    let matches = commands::new().get_matches();

    let verbosity_level = commands::logging::verbosity_level(
        matches
            .get_one::<u8>(commands::logging::ARG_VERBOSITY)
            .copied()
            .unwrap_or(0),
    );

    telemetry::init(verbosity_level)?;

    for path in loaded {
        debug!("Loaded environment from {}", path.display());
    }

    dispatch::handler(&matches)
}

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const PROVISION_COMMAND: &str = "provision";
pub const CLEANUP_COMMAND: &str = "cleanup";
pub const ARG_FILE: &str = "file";
pub const ARG_EMAIL_CONTAINS: &str = "email-contains";
pub const ARG_LIMIT: &str = "limit";

/// Matches the provider's page size for a single list call.
pub const DEFAULT_CLEANUP_LIMIT: usize = 500;

#[derive(Debug, Clone)]
pub struct ProvisionOptions {
    pub file: PathBuf,
}

impl ProvisionOptions {
    /// # Errors
    /// Returns an error if `--file` is missing.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let file = match matches.get_one::<String>(ARG_FILE) {
            Some(value) if !value.trim().is_empty() => PathBuf::from(value.trim()),
            _ => anyhow::bail!("missing required argument: --{ARG_FILE}"),
        };

        Ok(Self { file })
    }
}

#[derive(Debug, Clone)]
pub struct CleanupOptions {
    pub email_contains: String,
    pub limit: usize,
}

impl CleanupOptions {
    /// # Errors
    /// Returns an error if `--email-contains` is missing or blank, since an
    /// empty needle would match every user.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let email_contains = match matches.get_one::<String>(ARG_EMAIL_CONTAINS) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => anyhow::bail!("missing required argument: --{ARG_EMAIL_CONTAINS}"),
        };

        let limit = matches
            .get_one::<usize>(ARG_LIMIT)
            .copied()
            .unwrap_or(DEFAULT_CLEANUP_LIMIT);

        Ok(Self {
            email_contains,
            limit,
        })
    }
}

#[must_use]
pub fn provision_command() -> Command {
    Command::new(PROVISION_COMMAND)
        .about("Create users from a JSON file, optionally flagged for a password reset")
        .arg(
            Arg::new(ARG_FILE)
                .short('f')
                .long(ARG_FILE)
                .help("JSON array of users to create")
                .long_help(
                    "JSON array of users to create, example:\n\n  [{\"email\": \"jane@example.com\", \"first_name\": \"Jane\", \"password_reset_required\": true}]\n\nA user may carry `password_digest` and `password_hasher` to import an existing credential.",
                )
                .env("RESETGATE_PROVISION_FILE")
                .required(true),
        )
}

#[must_use]
pub fn cleanup_command() -> Command {
    Command::new(CLEANUP_COMMAND)
        .about("Delete users whose primary email contains a marker")
        .arg(
            Arg::new(ARG_EMAIL_CONTAINS)
                .short('e')
                .long(ARG_EMAIL_CONTAINS)
                .help("Delete users whose primary email contains this text")
                .env("RESETGATE_CLEANUP_EMAIL_CONTAINS")
                .required(true),
        )
        .arg(
            Arg::new(ARG_LIMIT)
                .long(ARG_LIMIT)
                .help("Maximum number of users to list")
                .default_value("500")
                .value_parser(clap::value_parser!(usize)),
        )
}

use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_PROVIDER_URL: &str = "provider-url";
pub const ARG_PROVIDER_SECRET_KEY: &str = "provider-secret-key";

#[derive(Debug, Clone)]
pub struct Options {
    pub url: String,
    pub secret_key: SecretString,
}

impl Options {
    /// Parse identity provider arguments from matches.
    ///
    /// # Errors
    /// Returns an error if required arguments are missing or blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let url = match matches.get_one::<String>(ARG_PROVIDER_URL) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => anyhow::bail!("missing required argument: --{ARG_PROVIDER_URL}"),
        };

        let secret_key = match matches.get_one::<String>(ARG_PROVIDER_SECRET_KEY) {
            Some(value) if !value.trim().is_empty() => SecretString::from(value.trim()),
            _ => anyhow::bail!("missing required argument: --{ARG_PROVIDER_SECRET_KEY}"),
        };

        Ok(Self { url, secret_key })
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_PROVIDER_URL)
                .long(ARG_PROVIDER_URL)
                .help("Identity provider backend API URL, example: https://api.clerk.com")
                .env("RESETGATE_PROVIDER_URL")
                .required(true),
        )
        .arg(
            Arg::new(ARG_PROVIDER_SECRET_KEY)
                .long(ARG_PROVIDER_SECRET_KEY)
                .help("Identity provider secret key for the backend API")
                .env("RESETGATE_PROVIDER_SECRET_KEY")
                .hide_env_values(true)
                .required(true),
        )
}

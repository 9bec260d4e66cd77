//! Maps validated CLI matches to the action for the chosen subcommand.

use crate::cli::{
    actions::{cleanup, provision, server, Action},
    commands::{self, provider},
    globals::GlobalArgs,
};
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let provider = provider::Options::parse(matches)?;
    let globals = GlobalArgs::new(provider.url, provider.secret_key);

    match matches.subcommand_name() {
        Some(commands::server::COMMAND) => {
            let options =
                commands::server::Options::parse(sub_m(matches, commands::server::COMMAND)?)?;

            Ok(Action::Server(server::Args {
                globals,
                port: options.port,
                session_cookie: options.session_cookie,
                sign_in_url: options.sign_in_url,
                public_routes: options.public_routes,
                reset_routes: options.reset_routes,
            }))
        }
        Some(commands::provision::PROVISION_COMMAND) => {
            let options = commands::provision::ProvisionOptions::parse(sub_m(
                matches,
                commands::provision::PROVISION_COMMAND,
            )?)?;

            Ok(Action::Provision(provision::Args {
                globals,
                file: options.file,
            }))
        }
        Some(commands::provision::CLEANUP_COMMAND) => {
            let options = commands::provision::CleanupOptions::parse(sub_m(
                matches,
                commands::provision::CLEANUP_COMMAND,
            )?)?;

            Ok(Action::Cleanup(cleanup::Args {
                globals,
                email_contains: options.email_contains,
                limit: options.limit,
            }))
        }
        _ => anyhow::bail!("missing subcommand"),
    }
}

fn sub_m<'a>(matches: &'a clap::ArgMatches, subcommand: &str) -> Result<&'a clap::ArgMatches> {
    matches
        .subcommand_matches(subcommand)
        .context("arguments not found")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider_env() -> [(&'static str, Option<&'static str>); 2] {
        [
            ("RESETGATE_PROVIDER_URL", Some("https://api.clerk.test")),
            ("RESETGATE_PROVIDER_SECRET_KEY", Some("sk_test_123")),
        ]
    }

    #[test]
    fn server_action() {
        temp_env::with_vars(provider_env(), || {
            let matches = commands::new().get_matches_from(vec!["resetgate", "server", "-p", "3000"]);
            let action = handler(&matches);
            assert!(matches!(action, Ok(Action::Server(ref args)) if args.port == 3000));
        });
    }

    #[test]
    fn cleanup_action() {
        temp_env::with_vars(provider_env(), || {
            let matches = commands::new().get_matches_from(vec![
                "resetgate",
                "cleanup",
                "--email-contains",
                "justin+",
                "--limit",
                "20",
            ]);
            let action = handler(&matches);
            assert!(matches!(
                action,
                Ok(Action::Cleanup(ref args)) if args.email_contains == "justin+" && args.limit == 20
            ));
        });
    }

    #[test]
    fn blank_cleanup_needle_is_rejected() {
        temp_env::with_vars(provider_env(), || {
            let matches =
                commands::new().get_matches_from(vec!["resetgate", "cleanup", "--email-contains", " "]);
            let result = handler(&matches);
            assert!(result.is_err());
            if let Err(err) = result {
                assert!(err
                    .to_string()
                    .contains("missing required argument: --email-contains"));
            }
        });
    }
}

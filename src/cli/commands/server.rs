use crate::gate::routes::{DEFAULT_PUBLIC_ROUTES, DEFAULT_RESET_ROUTES};
use crate::provider::DEFAULT_SESSION_COOKIE;
use clap::{Arg, ArgAction, ArgMatches, Command};

pub const COMMAND: &str = "server";
pub const ARG_PORT: &str = "port";
pub const ARG_SESSION_COOKIE: &str = "session-cookie";
pub const ARG_SIGN_IN_URL: &str = "sign-in-url";
pub const ARG_PUBLIC_ROUTE: &str = "public-route";
pub const ARG_RESET_ROUTE: &str = "reset-route";

#[derive(Debug, Clone)]
pub struct Options {
    pub port: u16,
    pub session_cookie: String,
    pub sign_in_url: Option<String>,
    pub public_routes: Vec<String>,
    pub reset_routes: Vec<String>,
}

impl Options {
    /// Parse server arguments from the `server` subcommand matches.
    ///
    /// # Errors
    /// Returns an error if the session cookie name is blank.
    pub fn parse(matches: &ArgMatches) -> anyhow::Result<Self> {
        let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);

        let session_cookie = matches
            .get_one::<String>(ARG_SESSION_COOKIE)
            .map_or(DEFAULT_SESSION_COOKIE, |value| value.trim());
        if session_cookie.is_empty() {
            anyhow::bail!("--{ARG_SESSION_COOKIE} must not be empty");
        }

        let routes = |id: &str, defaults: &[&str]| -> Vec<String> {
            let values: Vec<String> = matches
                .get_many::<String>(id)
                .map(|values| {
                    values
                        .map(|value| value.trim().to_string())
                        .filter(|value| !value.is_empty())
                        .collect()
                })
                .unwrap_or_default();

            if values.is_empty() {
                defaults.iter().map(ToString::to_string).collect()
            } else {
                values
            }
        };

        Ok(Self {
            port,
            session_cookie: session_cookie.to_string(),
            sign_in_url: matches
                .get_one::<String>(ARG_SIGN_IN_URL)
                .cloned()
                .filter(|value| !value.trim().is_empty()),
            public_routes: routes(ARG_PUBLIC_ROUTE, DEFAULT_PUBLIC_ROUTES),
            reset_routes: routes(ARG_RESET_ROUTE, DEFAULT_RESET_ROUTES),
        })
    }
}

#[must_use]
pub fn command() -> Command {
    Command::new(COMMAND)
        .about("Serve the application behind the password-reset gate")
        .arg(
            Arg::new(ARG_PORT)
                .short('p')
                .long(ARG_PORT)
                .help("Port to listen on")
                .default_value("8080")
                .env("RESETGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new(ARG_SESSION_COOKIE)
                .long(ARG_SESSION_COOKIE)
                .help("Cookie carrying the provider session token")
                .default_value(DEFAULT_SESSION_COOKIE)
                .env("RESETGATE_SESSION_COOKIE"),
        )
        .arg(
            Arg::new(ARG_SIGN_IN_URL)
                .long(ARG_SIGN_IN_URL)
                .help("Sign-in page for unauthenticated page requests")
                .long_help(
                    "Sign-in page for unauthenticated page requests. The original path is passed as `redirect_url`.\n\nWithout it, unauthenticated requests to protected routes get 401.",
                )
                .env("RESETGATE_SIGN_IN_URL"),
        )
        .arg(
            Arg::new(ARG_PUBLIC_ROUTE)
                .long(ARG_PUBLIC_ROUTE)
                .help("Route open without a session, `(.*)` suffix matches a prefix (repeatable)")
                .env("RESETGATE_PUBLIC_ROUTES")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(ARG_RESET_ROUTE)
                .long(ARG_RESET_ROUTE)
                .help("Route that belongs to the reset flow (repeatable)")
                .env("RESETGATE_RESET_ROUTES")
                .value_delimiter(',')
                .action(ArgAction::Append),
        )
}

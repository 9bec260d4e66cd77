use clap::{builder::ValueParser, Arg, ArgAction, Command};
use tracing::Level;

pub const ARG_VERBOSITY: &str = "verbosity";

/// Log level names accepted by `RESETGATE_LOG_LEVEL`, in `-v` count order.
/// `error` is the default and needs no flag.
const LEVELS: [(&str, Option<Level>); 5] = [
    ("error", None),
    ("warn", Some(Level::WARN)),
    ("info", Some(Level::INFO)),
    ("debug", Some(Level::DEBUG)),
    ("trace", Some(Level::TRACE)),
];

/// Tracing level for a `-v` count. Counts past the table clamp to TRACE.
#[must_use]
pub fn verbosity_level(count: u8) -> Option<Level> {
    LEVELS
        .get(usize::from(count))
        .map_or(Some(Level::TRACE), |(_, level)| *level)
}

/// Turn a `RESETGATE_LOG_LEVEL` value (a level name or a `-v` count) into a count.
///
/// # Errors
/// Returns a message listing the accepted names for anything else.
pub fn parse_log_level(value: &str) -> Result<u8, String> {
    let value = value.trim();

    if let Ok(count) = value.parse::<u8>() {
        return Ok(count.min(u8::try_from(LEVELS.len() - 1).unwrap_or(u8::MAX)));
    }

    LEVELS
        .iter()
        .position(|(name, _)| name.eq_ignore_ascii_case(value))
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            let names: Vec<_> = LEVELS.iter().map(|(name, _)| *name).collect();
            format!("invalid log level '{value}', expected one of {}", names.join(", "))
        })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Increase log verbosity: -v warn, -vv info, -vvv debug, -vvvv trace (default: error)")
            .long_help(
                "Increase log verbosity: -v warn, -vv info, -vvv debug, -vvvv trace.\n\
                 RESETGATE_LOG_LEVEL takes a level name (error, warn, info, debug, trace) \
                 or a count. RUST_LOG directives still apply on top.",
            )
            .env("RESETGATE_LOG_LEVEL")
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_log_level)),
    )
}

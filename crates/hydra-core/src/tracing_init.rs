//! Tracing/logging initialization for the `hydra` binary.
//!
//! Sets up `tracing_subscriber` with an env-filter and optional JSON output.
//! Log lines go to stderr so the user's own command output, if any, is never
//! interleaved with ours on stdout.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Error, Result};

/// Log levels accepted on the command line.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Alternate spellings of [`LOG_LEVELS`] entries.
const LEVEL_ALIASES: [(&str, &str); 1] = [("warning", "warn")];

/// Map a user-supplied level to its entry in [`LOG_LEVELS`].
pub fn canonical_level(log_level: &str) -> Result<&'static str> {
    LOG_LEVELS
        .iter()
        .copied()
        .find(|level| *level == log_level)
        .or_else(|| {
            LEVEL_ALIASES
                .iter()
                .find(|(alias, _)| *alias == log_level)
                .map(|(_, level)| *level)
        })
        .ok_or_else(|| {
            Error::Config(format!(
                "invalid log level {log_level:?} (available: {})",
                LOG_LEVELS.join(", ")
            ))
        })
}

/// Build the env filter for a run.
///
/// `RUST_LOG` wins when set; otherwise every event at `log_level` or above
/// is shown.
pub fn build_filter(log_level: &str) -> Result<EnvFilter> {
    let level = canonical_level(log_level)?;
    Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
}

/// Initialise the global tracing subscriber.
///
/// * `log_level` -- default level when `RUST_LOG` is not set.
/// * `log_json` -- when `true`, emit structured JSON log lines instead of the
///   human-readable format.
pub fn init_tracing(log_level: &str, log_json: bool) -> Result<()> {
    let env_filter = build_filter(log_level)?;
    if log_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

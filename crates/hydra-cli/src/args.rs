use std::path::PathBuf;

use clap::Parser;

use hydra_core::RunSettings;
use hydra_core::gitmodules::ItemKey;
use hydra_core::tracing_init::canonical_level;

/// Run a command in every git submodule, several at a time.
#[derive(Debug, Parser)]
#[command(name = "hydra", version, about)]
pub struct Args {
    /// Command to run inside each submodule (quote it, e.g. "npm ci")
    pub command: String,

    /// Path to the submodule declaration file
    #[arg(short, long, default_value = ".gitmodules", env = "HYDRA_FILE")]
    pub file: PathBuf,

    /// Number of concurrent workers [default: number of submodules, capped by CPU count]
    #[arg(short, long, env = "HYDRA_WORKERS")]
    pub workers: Option<usize>,

    /// Maximum number of pending invocations [default: number of submodules]
    #[arg(long, env = "HYDRA_QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    /// Per-submodule timeout in seconds
    #[arg(long, env = "HYDRA_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Run in each submodule's declared `path` instead of its name
    #[arg(long, env = "HYDRA_USE_PATH")]
    pub use_path: bool,

    /// Log level filter: trace, debug, info, warn (or warning), error.
    /// `RUST_LOG` takes precedence when set
    #[arg(
        long,
        default_value = "info",
        env = "HYDRA_LOG_LEVEL",
        value_parser = parse_log_level
    )]
    pub log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "HYDRA_LOG_JSON")]
    pub log_json: bool,

    /// Exit with status 1 when any submodule's command failed
    #[arg(long, env = "HYDRA_FAIL_ON_ERROR")]
    pub fail_on_error: bool,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    pub summary_json: bool,
}

fn parse_log_level(value: &str) -> Result<String, String> {
    canonical_level(value)
        .map(str::to_string)
        .map_err(|e| e.to_string())
}

impl Args {
    pub const fn item_key(&self) -> ItemKey {
        if self.use_path {
            ItemKey::Path
        } else {
            ItemKey::Name
        }
    }

    /// Run settings as given; validation happens once the item count is known.
    pub fn settings(&self) -> RunSettings {
        RunSettings {
            command: self.command.clone(),
            worker_count: self.workers,
            queue_capacity: self.queue_capacity,
            timeout_secs: self.timeout,
            log_level: self.log_level.clone(),
        }
    }
}

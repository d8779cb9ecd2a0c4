//! Run configuration.
//!
//! Settings arrive from CLI flags and `HYDRA_*` environment variables as
//! [`RunSettings`]. Once the number of work items is known they are resolved
//! into an immutable [`RunConfig`]:
//! 1. Explicit values are validated (every count must be positive and within
//!    [`MAX_WORKERS`] / [`MAX_QUEUE_CAPACITY`])
//! 2. Unset counts default to the number of work items
//! 3. The default worker count is capped by the available parallelism

use std::num::NonZeroUsize;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::tracing_init::canonical_level;

/// Default log level when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Most workers a single run may spawn.
pub const MAX_WORKERS: usize = 1024;

/// Largest pending-invocation buffer the queue channel can hold.
pub const MAX_QUEUE_CAPACITY: usize = tokio::sync::Semaphore::MAX_PERMITS;

/// Unvalidated settings, as supplied by the user.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// The user command run once per work item.
    pub command: String,
    pub worker_count: Option<usize>,
    pub queue_capacity: Option<usize>,
    /// Per-invocation timeout in seconds.
    pub timeout_secs: Option<u64>,
    pub log_level: String,
}

impl RunSettings {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            worker_count: None,
            queue_capacity: None,
            timeout_secs: None,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.worker_count = Some(workers);
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Validate the settings and fill in defaults for `item_count` items.
    pub fn resolve(self, item_count: usize) -> Result<RunConfig> {
        if item_count == 0 {
            return Err(Error::Config("no work items to run".to_string()));
        }
        let log_level = canonical_level(&self.log_level)?.to_string();

        let worker_count = match self.worker_count {
            Some(n) => within("worker count", n, MAX_WORKERS)?,
            None => item_count.min(available_parallelism()).min(MAX_WORKERS),
        };
        let queue_capacity = match self.queue_capacity {
            Some(n) => within("queue capacity", n, MAX_QUEUE_CAPACITY)?,
            None => item_count.min(MAX_QUEUE_CAPACITY),
        };
        let timeout = match self.timeout_secs {
            Some(0) => {
                return Err(Error::Config(
                    "timeout must be a positive number of seconds".to_string(),
                ));
            }
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(RunConfig {
            command: self.command,
            worker_count,
            queue_capacity,
            timeout,
            log_level,
        })
    }
}

/// Validated, read-only configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub command: String,
    pub worker_count: usize,
    pub queue_capacity: usize,
    pub timeout: Option<Duration>,
    pub log_level: String,
}

fn within(what: &str, value: usize, max: usize) -> Result<usize> {
    if value == 0 {
        return Err(Error::Config(format!(
            "{what} must be a positive integer (got {value})"
        )));
    }
    if value > max {
        return Err(Error::Config(format!(
            "{what} must be at most {max} (got {value})"
        )));
    }
    Ok(value)
}

fn available_parallelism() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

//! hydra core library
//!
//! Runs one shell command in every git submodule of a repository, several at
//! a time:
//! - Submodule discovery from `.gitmodules`
//! - Invocation building and run configuration
//! - The concurrent dispatcher (queue, worker pool, completion barrier)
//! - Structured result reporting and tracing setup

pub mod config;
pub mod dispatch;
pub mod error;
pub mod gitmodules;
pub mod invocation;
pub mod tracing_init;

pub use config::{RunConfig, RunSettings};
pub use dispatch::{Dispatcher, RunSummary};
pub use error::{Error, Result};
pub use gitmodules::{ItemKey, Submodule};
pub use invocation::{CommandBuilder, Invocation, WorkItem};

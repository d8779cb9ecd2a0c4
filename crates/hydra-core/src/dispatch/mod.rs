//! Concurrent task dispatch: bounded queue, worker pool, completion barrier.
//!
//! - [`TaskQueue`]: bounded, closable FIFO of pending invocations.
//! - [`WorkerPool`]: fixed set of Tokio workers draining the queue.
//! - [`CompletionBarrier`]: releases once every worker has exited.
//! - [`Dispatcher`]: ties the above together for one run.
//! - [`Reporter`]: observer receiving per-task and end-of-run events.

pub mod barrier;
pub mod dispatcher;
pub mod pool;
pub mod queue;
pub mod report;
pub mod runner;

pub use barrier::{CompletionBarrier, FinishSignal, WorkerExit};
pub use dispatcher::Dispatcher;
pub use pool::{PoolReport, WorkerPool};
pub use queue::{QueueError, QueueReceiver, TaskQueue};
pub use report::{CollectingReporter, DispatchEvent, Reporter, RunSummary, TracingReporter};
pub use runner::{CommandRunner, ExecutionResult, Outcome, ShellRunner};

//! Result reporting.
//!
//! Workers emit [`DispatchEvent`]s to a [`Reporter`]. The reporter only
//! observes: it cannot influence scheduling and never sees raw process handles.

use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::invocation::WorkItem;

use super::runner::ExecutionResult;

/// Aggregate outcome of a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub workers: usize,
}

impl RunSummary {
    pub const fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Observable dispatcher events.
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// A worker took an invocation off the queue and is about to run it.
    TaskStarted {
        worker_id: usize,
        invocation_id: u64,
        item: WorkItem,
    },
    /// An invocation finished, successfully or not.
    TaskFinished {
        worker_id: usize,
        result: ExecutionResult,
    },
    /// Every worker has exited. Always the last event of a run.
    RunCompleted { summary: RunSummary },
}

/// Sink for dispatcher events. Called concurrently from every worker.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &DispatchEvent);
}

/// Reports events as structured `tracing` events.
///
/// Captured output is attached to failures at error level and to successes
/// at debug level only.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &DispatchEvent) {
        match event {
            DispatchEvent::TaskStarted {
                worker_id, item, ..
            } => {
                info!(worker_id, item = %item, "Task started");
            }
            DispatchEvent::TaskFinished { worker_id, result } => {
                let elapsed_ms = u64::try_from(result.elapsed.as_millis()).unwrap_or(u64::MAX);
                match result.cause() {
                    None => {
                        info!(worker_id, item = %result.item, elapsed_ms, "Task succeeded");
                        debug!(
                            worker_id,
                            item = %result.item,
                            output = %result.combined_output(),
                            "Task output"
                        );
                    }
                    Some(cause) => {
                        error!(
                            worker_id,
                            item = %result.item,
                            elapsed_ms,
                            cause,
                            output = %result.combined_output(),
                            "Task failed"
                        );
                    }
                }
            }
            DispatchEvent::RunCompleted { summary } => {
                info!(
                    total = summary.total,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    workers = summary.workers,
                    "All work complete"
                );
            }
        }
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<DispatchEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far.
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, event: &DispatchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

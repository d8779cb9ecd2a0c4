//! Fixed-size worker pool draining the task queue.
//!
//! Each worker is a Tokio task that pulls invocations until the queue reports
//! end-of-stream. A failing invocation is reported and the worker moves on;
//! nothing a single invocation does can stop its worker or its siblings.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::MAX_WORKERS;
use crate::error::{Error, Result};

use super::barrier::{CompletionBarrier, FinishSignal};
use super::queue::QueueReceiver;
use super::report::{DispatchEvent, Reporter};
use super::runner::CommandRunner;

/// Totals collected from every worker once the pool has drained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolReport {
    pub workers: usize,
    pub processed: usize,
    pub failed: usize,
}

/// A running set of workers.
pub struct WorkerPool {
    barrier: CompletionBarrier,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `worker_count` workers sharing `queue`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<R: CommandRunner>(
        queue: QueueReceiver,
        worker_count: usize,
        runner: Arc<R>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self> {
        if worker_count == 0 || worker_count > MAX_WORKERS {
            return Err(Error::Config(format!(
                "worker count must be between 1 and {MAX_WORKERS} (got {worker_count})"
            )));
        }

        let (barrier, signals) = CompletionBarrier::new(worker_count);
        let handles = signals
            .into_iter()
            .map(|signal| {
                tokio::spawn(worker_loop(
                    signal,
                    queue.clone(),
                    Arc::clone(&runner),
                    Arc::clone(&reporter),
                ))
            })
            .collect();

        info!(workers = worker_count, "Worker pool started");
        Ok(Self { barrier, handles })
    }

    /// Wait until every worker has exited.
    ///
    /// Workers only exit once the queue is closed and empty, so the caller
    /// must close the queue first or this never returns.
    pub async fn await_all(self) -> Result<PoolReport> {
        let workers = self.handles.len();
        let exits = self.barrier.await_all().await;

        // Every worker has signalled; joining only surfaces panics.
        for (worker_id, handle) in self.handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                return Err(Error::WorkerPanicked {
                    worker_id,
                    reason: e.to_string(),
                });
            }
        }

        let report = exits.iter().fold(
            PoolReport {
                workers,
                ..PoolReport::default()
            },
            |mut acc, exit| {
                acc.processed += exit.processed;
                acc.failed += exit.failed;
                acc
            },
        );
        debug!(
            workers = report.workers,
            processed = report.processed,
            failed = report.failed,
            "Worker pool drained"
        );
        Ok(report)
    }
}

async fn worker_loop<R: CommandRunner>(
    mut signal: FinishSignal,
    queue: QueueReceiver,
    runner: Arc<R>,
    reporter: Arc<dyn Reporter>,
) {
    let worker_id = signal.worker_id();
    debug!(worker_id, "Worker started");

    while let Some(invocation) = queue.dequeue().await {
        reporter.report(&DispatchEvent::TaskStarted {
            worker_id,
            invocation_id: invocation.id,
            item: invocation.item.clone(),
        });

        let result = runner.run(&invocation).await;
        signal.record(result.is_success());

        reporter.report(&DispatchEvent::TaskFinished { worker_id, result });
    }

    debug!(worker_id, "Worker exiting, queue drained");
}

//! Orchestration of one run: enqueue every item, drain, wait, report.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::invocation::{CommandBuilder, WorkItem};

use super::pool::WorkerPool;
use super::queue::TaskQueue;
use super::report::{DispatchEvent, Reporter, RunSummary};
use super::runner::{CommandRunner, ShellRunner};

/// Runs one command across a list of work items.
///
/// Holds no per-run state, so a dispatcher can be reused for several runs.
pub struct Dispatcher<R: CommandRunner = ShellRunner> {
    config: RunConfig,
    root: PathBuf,
    runner: Arc<R>,
    reporter: Arc<dyn Reporter>,
}

impl Dispatcher<ShellRunner> {
    /// Dispatcher that runs invocations as child processes under `root`.
    pub fn new(config: RunConfig, root: impl Into<PathBuf>, reporter: Arc<dyn Reporter>) -> Self {
        let runner = ShellRunner::new(config.timeout);
        Self::with_runner(config, root, runner, reporter)
    }
}

impl<R: CommandRunner> Dispatcher<R> {
    pub fn with_runner(
        config: RunConfig,
        root: impl Into<PathBuf>,
        runner: R,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            config,
            root: root.into(),
            runner: Arc::new(runner),
            reporter,
        }
    }

    /// Run the configured command once per item and wait for all of them.
    ///
    /// Individual failures are reported through the reporter and counted in
    /// the summary; they never make this return an error.
    pub async fn run(&self, items: &[WorkItem]) -> Result<RunSummary> {
        if items.is_empty() {
            return Err(Error::Config("no work items to run".to_string()));
        }

        info!(
            items = items.len(),
            workers = self.config.worker_count,
            queue_capacity = self.config.queue_capacity,
            command = %self.config.command,
            "Dispatching"
        );

        let (mut queue, receiver) = TaskQueue::bounded(self.config.queue_capacity)?;
        let pool = WorkerPool::start(
            receiver,
            self.config.worker_count,
            Arc::clone(&self.runner),
            Arc::clone(&self.reporter),
        )?;

        let mut builder = CommandBuilder::new(&self.root, &self.config.command);
        let mut enqueue_error = None;
        for item in items {
            let invocation = builder.build(item);
            debug!(invocation_id = invocation.id, item = %item, "Enqueueing");
            if let Err(e) = queue.enqueue(invocation).await {
                warn!(item = %item, error = %e, "Failed to enqueue");
                enqueue_error = Some(e);
                break;
            }
        }
        queue.close();

        let report = pool.await_all().await?;
        if let Some(e) = enqueue_error {
            return Err(e.into());
        }

        let summary = RunSummary {
            total: report.processed,
            succeeded: report.processed - report.failed,
            failed: report.failed,
            workers: report.workers,
        };
        self.reporter.report(&DispatchEvent::RunCompleted { summary });
        Ok(summary)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::RunSettings;
    use crate::dispatch::report::CollectingReporter;
    use tempfile::TempDir;

    fn items(names: &[&str]) -> Vec<WorkItem> {
        names.iter().map(|n| WorkItem::from(*n)).collect()
    }

    #[tokio::test]
    async fn empty_item_list_rejected() {
        let config = RunSettings::new("true").resolve(1).unwrap();
        let dispatcher = Dispatcher::new(config, ".", Arc::new(CollectingReporter::new()));
        let err = dispatcher.run(&[]).await.unwrap_err();
        assert!(err.is_config());
    }

    #[tokio::test]
    async fn completion_is_last_event() {
        let dir = TempDir::new().unwrap();
        let names = ["a", "b", "c"];
        for name in names {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        let reporter = Arc::new(CollectingReporter::new());
        let config = RunSettings::new("true").resolve(names.len()).unwrap();
        let dispatcher = Dispatcher::new(config, dir.path(), reporter.clone());

        let summary = dispatcher.run(&items(&names)).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 3);

        let events = reporter.events();
        assert_eq!(events.len(), 7);
        assert!(matches!(events.last(), Some(DispatchEvent::RunCompleted { .. })));
    }

    #[tokio::test]
    async fn dispatcher_can_run_twice() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("a")).unwrap();
        let reporter = Arc::new(CollectingReporter::new());
        let config = RunSettings::new("true").resolve(1).unwrap();
        let dispatcher = Dispatcher::new(config, dir.path(), reporter.clone());

        let first = dispatcher.run(&items(&["a"])).await.unwrap();
        let second = dispatcher.run(&items(&["a"])).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(reporter.events().len(), 6);
    }
}

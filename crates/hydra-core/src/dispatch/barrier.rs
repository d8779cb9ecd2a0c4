//! Wait-for-N completion barrier.
//!
//! Each worker holds a [`FinishSignal`]. Dropping it, whether the worker
//! returned normally or unwound, sends exactly one [`WorkerExit`] to the
//! [`CompletionBarrier`], which releases once it has seen one signal per
//! expected worker.

use tokio::sync::mpsc;
use tracing::{debug, warn};

/// What a worker reports when it exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerExit {
    pub worker_id: usize,
    /// Invocations this worker ran to completion.
    pub processed: usize,
    /// How many of those failed.
    pub failed: usize,
}

/// Per-worker handle that signals the barrier on drop.
#[derive(Debug)]
pub struct FinishSignal {
    tx: mpsc::Sender<WorkerExit>,
    exit: WorkerExit,
}

impl FinishSignal {
    /// Record one finished invocation.
    pub const fn record(&mut self, success: bool) {
        self.exit.processed += 1;
        if !success {
            self.exit.failed += 1;
        }
    }

    pub const fn worker_id(&self) -> usize {
        self.exit.worker_id
    }
}

impl Drop for FinishSignal {
    fn drop(&mut self) {
        let exit = self.exit;
        if std::thread::panicking() {
            warn!(worker_id = exit.worker_id, "Worker unwinding, signalling completion");
        }
        // Capacity equals the number of signals, so this only fails when the
        // barrier itself is gone.
        if self.tx.try_send(exit).is_err() {
            debug!(worker_id = exit.worker_id, "Completion barrier dropped before worker exit");
        }
    }
}

/// Releases once every expected worker has signalled.
#[derive(Debug)]
pub struct CompletionBarrier {
    rx: mpsc::Receiver<WorkerExit>,
    expected: usize,
}

impl CompletionBarrier {
    /// Create a barrier for `expected` workers together with their signals,
    /// one per worker id `0..expected`.
    pub fn new(expected: usize) -> (Self, Vec<FinishSignal>) {
        let (tx, rx) = mpsc::channel(expected.max(1));
        let signals = (0..expected)
            .map(|worker_id| FinishSignal {
                tx: tx.clone(),
                exit: WorkerExit {
                    worker_id,
                    processed: 0,
                    failed: 0,
                },
            })
            .collect();
        (Self { rx, expected }, signals)
    }

    /// Wait until every worker has exited and return their exit reports in
    /// the order they arrived.
    pub async fn await_all(mut self) -> Vec<WorkerExit> {
        let mut exits = Vec::with_capacity(self.expected);
        while exits.len() < self.expected {
            match self.rx.recv().await {
                Some(exit) => {
                    debug!(
                        worker_id = exit.worker_id,
                        processed = exit.processed,
                        remaining = self.expected - exits.len() - 1,
                        "Worker finished"
                    );
                    exits.push(exit);
                }
                // Every signal is dropped exactly once, so this cannot
                // happen while signals are outstanding.
                None => {
                    warn!(
                        expected = self.expected,
                        received = exits.len(),
                        "Completion channel closed early"
                    );
                    break;
                }
            }
        }
        exits
    }
}

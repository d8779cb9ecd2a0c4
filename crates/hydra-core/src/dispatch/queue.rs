//! Bounded, closable FIFO of pending invocations.
//!
//! The producer side ([`TaskQueue`]) waits while the queue is full. The consumer
//! side ([`QueueReceiver`]) is cloned once per worker; every clone shares one
//! underlying receiver, so each invocation is handed to exactly one worker.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};

use crate::config::MAX_QUEUE_CAPACITY;
use crate::invocation::Invocation;

/// Producer half of the task queue.
pub struct TaskQueue {
    tx: Option<mpsc::Sender<Invocation>>,
}

/// Consumer half of the task queue, shared by all workers.
#[derive(Clone)]
pub struct QueueReceiver {
    rx: Arc<Mutex<mpsc::Receiver<Invocation>>>,
}

impl TaskQueue {
    /// Create a queue holding at most `capacity` pending invocations.
    pub fn bounded(capacity: usize) -> Result<(Self, QueueReceiver), QueueError> {
        if capacity == 0 {
            return Err(QueueError::ZeroCapacity);
        }
        if capacity > MAX_QUEUE_CAPACITY {
            return Err(QueueError::CapacityTooLarge { max: MAX_QUEUE_CAPACITY });
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok((
            Self { tx: Some(tx) },
            QueueReceiver {
                rx: Arc::new(Mutex::new(rx)),
            },
        ))
    }

    /// Add an invocation, waiting for a free slot if the queue is full.
    pub async fn enqueue(&self, invocation: Invocation) -> Result<(), QueueError> {
        let tx = self.tx.as_ref().ok_or(QueueError::Closed)?;
        tx.send(invocation).await.map_err(|_| QueueError::Disconnected)
    }

    /// Signal that nothing more will be enqueued. Buffered invocations still
    /// drain; workers see end-of-stream once the buffer is empty.
    ///
    /// Must be called exactly once.
    pub fn close(&mut self) {
        debug_assert!(!self.is_closed(), "task queue closed twice");
        self.tx = None;
    }

    pub const fn is_closed(&self) -> bool {
        self.tx.is_none()
    }
}

impl QueueReceiver {
    /// Take the next invocation, or `None` once the queue is closed and empty.
    pub async fn dequeue(&self) -> Option<Invocation> {
        self.rx.lock().await.recv().await
    }
}

/// Errors from task queue misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum QueueError {
    /// `enqueue` was called after `close`.
    #[error("Task queue has been closed")]
    Closed,
    /// Every consumer is gone, nobody will ever run the invocation.
    #[error("Task queue has no consumers left")]
    Disconnected,
    #[error("Task queue capacity must be positive")]
    ZeroCapacity,
    #[error("Task queue capacity must be at most {max}")]
    CapacityTooLarge { max: usize },
}

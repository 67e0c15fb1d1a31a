//! Unbounded FIFO job queue with a single consumer.
//!
//! `JobQueue` is the cloneable producer side; `JobReceiver` is the only
//! consumer and is deliberately not `Clone`, so a second consumer cannot exist.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::QueueClosed;
use crate::ids::{ChatId, MessageId, UserId};

/// One admitted download, consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub url: String,
    /// `None` lets the backend pick its default variant.
    pub selected_format_id: Option<String>,
    pub reply_to: MessageId,
    /// Token that produced this job, deleted when the job is done.
    pub token: Option<String>,
}

/// Advisory queue position: jobs outstanding right after the enqueue.
///
/// Concurrent producers can observe equal or skipped values; never use it
/// for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QueueTicket(pub usize);

impl std::fmt::Display for QueueTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone)]
pub struct JobQueue {
    tx: mpsc::UnboundedSender<Job>,
    depth: Arc<AtomicUsize>,
}

pub struct JobReceiver {
    rx: mpsc::UnboundedReceiver<Job>,
    depth: Arc<AtomicUsize>,
}

impl JobQueue {
    pub fn unbounded() -> (JobQueue, JobReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let depth = Arc::new(AtomicUsize::new(0));
        (
            JobQueue {
                tx,
                depth: Arc::clone(&depth),
            },
            JobReceiver { rx, depth },
        )
    }

    /// Never blocks. Fails only once the receiver has been dropped.
    pub fn enqueue(&self, job: Job) -> Result<QueueTicket, QueueClosed> {
        let ticket = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        if self.tx.send(job).is_err() {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            return Err(QueueClosed);
        }
        Ok(QueueTicket(ticket))
    }

    /// Jobs sent but not yet dequeued.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }
}

impl JobReceiver {
    /// Wait for the next job in arrival order. `None` once every producer is gone.
    pub async fn dequeue(&mut self) -> Option<Job> {
        let job = self.rx.recv().await?;
        self.depth.fetch_sub(1, Ordering::SeqCst);
        Some(job)
    }
}

//! Download orchestrator: admission, quality selection and the per-job state
//! machine run by the single queue consumer.
//!
//! Phases: `Probing → (AwaitingSelection | Ready) → Downloading → Delivering →
//! Done | Failed`. Probing and prompting run concurrently per request; only
//! the consumer downloads and delivers, one job at a time.

mod admit;
mod chat_book;
mod commands;
mod execute;
mod heartbeat;
pub mod messages;
pub mod payload;
mod phase;
mod select;
mod status;

pub use admit::{DownloadRequest, RequestOutcome};
pub use chat_book::{ChatBook, ChatRecord};
pub use commands::ExportOutcome;
pub use phase::JobPhase;
pub use select::SelectionOutcome;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::backend::{BackendFault, MediaBackend};
use crate::config::MdlConfig;
use crate::error::QueueClosed;
use crate::gateway::MessagingGateway;
use crate::ids::{ChatId, MessageId, UserId};
use crate::queue::{Job, JobQueue, JobReceiver, QueueTicket};
use crate::store::{TokenStore, UsageLog};

/// Behavioral toggles.
#[derive(Debug, Clone)]
pub struct OrchestratorFlags {
    pub show_size_in_prompt: bool,
    pub probe_heartbeat: bool,
    pub heartbeat_interval: Duration,
    /// Options above this size are withheld from everyone but the owner.
    pub max_ungated_size_bytes: Option<u64>,
}

impl Default for OrchestratorFlags {
    fn default() -> Self {
        Self {
            show_size_in_prompt: true,
            probe_heartbeat: false,
            heartbeat_interval: Duration::from_secs(5),
            max_ungated_size_bytes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub flags: OrchestratorFlags,
    /// Bound on every Media Backend call.
    pub network_timeout: Duration,
    pub max_upload_bytes: u64,
    pub clean_url_hosts: Vec<String>,
    pub owner_id: Option<UserId>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        let cfg = MdlConfig::default();
        Self::from_config(&cfg, None)
    }
}

impl OrchestratorSettings {
    pub fn from_config(cfg: &MdlConfig, owner_id: Option<UserId>) -> Self {
        let o = &cfg.orchestrator;
        Self {
            flags: OrchestratorFlags {
                show_size_in_prompt: o.show_size_in_prompt,
                probe_heartbeat: o.probe_heartbeat,
                heartbeat_interval: Duration::from_secs(o.heartbeat_interval_secs.max(1)),
                max_ungated_size_bytes: o.max_ungated_size_bytes,
            },
            network_timeout: cfg.network_timeout(),
            max_upload_bytes: cfg.max_upload_bytes,
            clean_url_hosts: cfg.clean_url_hosts.clone(),
            owner_id,
        }
    }

    pub fn is_owner(&self, user: UserId) -> bool {
        self.owner_id == Some(user)
    }
}

struct Inner {
    gateway: Arc<dyn MessagingGateway>,
    backend: Arc<dyn MediaBackend>,
    tokens: Arc<dyn TokenStore>,
    usage: Arc<dyn UsageLog>,
    queue: JobQueue,
    chats: ChatBook,
    settings: OrchestratorSettings,
}

/// Cheap to clone; every inbound update handler gets its own handle.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Build the orchestrator and its queue. The returned receiver must be
    /// handed to exactly one `run_consumer`.
    pub fn new(
        gateway: Arc<dyn MessagingGateway>,
        backend: Arc<dyn MediaBackend>,
        tokens: Arc<dyn TokenStore>,
        usage: Arc<dyn UsageLog>,
        settings: OrchestratorSettings,
    ) -> (Self, JobReceiver) {
        let (queue, receiver) = JobQueue::unbounded();
        let inner = Inner {
            gateway,
            backend,
            tokens,
            usage,
            queue,
            chats: ChatBook::new(),
            settings,
        };
        (
            Self {
                inner: Arc::new(inner),
            },
            receiver,
        )
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.inner.settings
    }

    pub fn chats(&self) -> &ChatBook {
        &self.inner.chats
    }

    /// Jobs admitted but not yet picked up by the consumer.
    pub fn queue_depth(&self) -> usize {
        self.inner.queue.depth()
    }

    /// Process jobs in arrival order. Runs for as long as the orchestrator
    /// (which holds a producer handle) is alive.
    pub async fn run_consumer(&self, mut receiver: JobReceiver) {
        tracing::info!("queue consumer started");
        while self.run_next(&mut receiver).await.is_some() {}
        tracing::info!("queue consumer stopped");
    }

    /// Take the next job and run it to a terminal phase, which is returned.
    pub async fn run_next(&self, receiver: &mut JobReceiver) -> Option<JobPhase> {
        let job = receiver.dequeue().await?;
        Some(self.execute(job).await)
    }

    pub fn spawn_consumer(&self, receiver: JobReceiver) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.run_consumer(receiver).await })
    }

    /// Run a backend call under the network timeout.
    async fn bounded<T, F>(&self, call: F) -> Result<T, BackendFault>
    where
        F: Future<Output = Result<T, BackendFault>>,
    {
        let limit = self.inner.settings.network_timeout;
        match tokio::time::timeout(limit, call).await {
            Ok(res) => res,
            Err(_) => Err(BackendFault::timeout(limit)),
        }
    }

    /// Send a text; a failure is logged and otherwise ignored.
    async fn reply(&self, chat: ChatId, text: &str, reply_to: Option<MessageId>) {
        if let Err(e) = self.inner.gateway.send_text(chat, text, reply_to).await {
            tracing::warn!(chat_id = %chat, "could not send message: {}", e);
        }
    }

    /// Hand a job to the consumer and report the advisory position.
    async fn enqueue_job(&self, job: Job) -> Result<QueueTicket, QueueClosed> {
        let chat = job.chat_id;
        phase::enter(chat, &job.url, JobPhase::Ready);
        self.inner.chats.note_enqueued(chat);
        match self.inner.queue.enqueue(job) {
            Ok(depth) => {
                let ticket = self.inner.chats.set_ticket(chat, depth);
                tracing::debug!(chat_id = %chat, ticket = ticket.0, "job enqueued");
                self.reply(chat, &messages::queued(ticket), None).await;
                Ok(ticket)
            }
            Err(e) => {
                self.inner.chats.note_finished(chat);
                tracing::error!(chat_id = %chat, "{}", e);
                self.reply(chat, messages::QUEUE_UNAVAILABLE, None).await;
                Err(e)
            }
        }
    }

    /// Best-effort token removal.
    async fn forget_token(&self, token: &str) {
        match self.inner.tokens.delete(token).await {
            Ok(_) => tracing::debug!(token, "token removed"),
            Err(e) => tracing::warn!(token, "could not remove token: {}", e),
        }
    }
}

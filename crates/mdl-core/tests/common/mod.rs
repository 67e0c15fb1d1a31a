//! Shared fakes for orchestrator integration tests.
//!
//! Both fakes append to one `Journal`, so tests can assert the relative order
//! of backend calls and chat messages.

#![allow(dead_code)]

pub mod backend;
pub mod gateway;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use mdl_core::ids::{ChatId, MessageId, UserId};
use mdl_core::orchestrator::{
    DownloadRequest, JobPhase, Orchestrator, OrchestratorSettings, RequestOutcome,
};
use mdl_core::queue::JobReceiver;
use mdl_core::store::{BotDb, TokenStore, UsageLog};
use tempfile::TempDir;
use tokio::task::JoinHandle;

pub use backend::{FetchScript, ScriptedBackend};
pub use gateway::RecordingGateway;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Text {
        chat: ChatId,
        id: MessageId,
        text: String,
        reply_to: Option<MessageId>,
    },
    Menu {
        chat: ChatId,
        id: MessageId,
        menu: mdl_core::gateway::Menu,
    },
    Pin(MessageId),
    Unpin(MessageId),
    Delete(MessageId),
    Video {
        chat: ChatId,
        file_name: String,
        reply_to: Option<MessageId>,
    },
    Document {
        chat: ChatId,
        file_name: String,
    },
    FetchStarted {
        url: String,
        format_id: Option<String>,
    },
    FetchFinished {
        url: String,
    },
}

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Event>>>);

impl Journal {
    pub fn push(&self, e: Event) {
        self.0.lock().unwrap().push(e);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Text { chat: c, text, .. } if c == chat => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn menus(&self) -> Vec<mdl_core::gateway::Menu> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Menu { menu, .. } => Some(menu),
                _ => None,
            })
            .collect()
    }

    pub fn fetches(&self) -> Vec<(String, Option<String>)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::FetchStarted { url, format_id } => Some((url, format_id)),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    pub fn position(&self, pred: impl Fn(&Event) -> bool) -> Option<usize> {
        self.events().iter().position(pred)
    }

    /// Every pinned message is unpinned exactly once and then deleted exactly once.
    pub fn assert_pins_balanced(&self) {
        let events = self.events();
        for (i, e) in events.iter().enumerate() {
            let Event::Pin(id) = e else { continue };
            let unpins: Vec<usize> = positions(&events, |x| *x == Event::Unpin(*id));
            let deletes: Vec<usize> = positions(&events, |x| *x == Event::Delete(*id));
            assert_eq!(unpins.len(), 1, "message {id} unpinned {} times", unpins.len());
            assert_eq!(deletes.len(), 1, "message {id} deleted {} times", deletes.len());
            assert!(i < unpins[0] && unpins[0] < deletes[0], "pin → unpin → delete order for {id}");
        }
    }
}

fn positions(events: &[Event], pred: impl Fn(&Event) -> bool) -> Vec<usize> {
    events
        .iter()
        .enumerate()
        .filter(|(_, e)| pred(e))
        .map(|(i, _)| i)
        .collect()
}

/// Orchestrator wired to the fakes and an in-memory database.
pub struct Harness {
    pub orch: Orchestrator,
    rx: Option<JobReceiver>,
    pub gateway: Arc<RecordingGateway>,
    pub backend: Arc<ScriptedBackend>,
    pub db: BotDb,
    pub journal: Journal,
    pub dir: TempDir,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_settings(settings()).await
    }

    pub async fn with_settings(settings: OrchestratorSettings) -> Self {
        let db = BotDb::open_memory().await.unwrap();
        Self::build(settings, Arc::new(db.clone()), db).await
    }

    /// Use a custom token store (e.g. one that always fails).
    pub async fn with_token_store(settings: OrchestratorSettings, tokens: Arc<dyn TokenStore>) -> Self {
        let db = BotDb::open_memory().await.unwrap();
        Self::build(settings, tokens, db).await
    }

    async fn build(settings: OrchestratorSettings, tokens: Arc<dyn TokenStore>, db: BotDb) -> Self {
        let journal = Journal::default();
        let dir = tempfile::tempdir().unwrap();
        let gateway = Arc::new(RecordingGateway::new(journal.clone()));
        let backend = Arc::new(ScriptedBackend::new(journal.clone(), dir.path()));
        let usage: Arc<dyn UsageLog> = Arc::new(db.clone());
        let (orch, rx) = Orchestrator::new(gateway.clone(), backend.clone(), tokens, usage, settings);
        Self {
            orch,
            rx: Some(rx),
            gateway,
            backend,
            db,
            journal,
            dir,
        }
    }

    pub async fn request(&self, chat: i64, url: &str) -> RequestOutcome {
        self.orch
            .handle_request(DownloadRequest {
                chat_id: ChatId(chat),
                user_id: UserId(chat),
                url: url.to_string(),
                reply_to: MessageId(1000 + chat as i32),
            })
            .await
    }

    /// Run exactly one queued job on the test task.
    pub async fn run_next(&mut self) -> Option<JobPhase> {
        let rx = self.rx.as_mut().expect("consumer already spawned");
        self.orch.run_next(rx).await
    }

    pub fn spawn_consumer(&mut self) -> JoinHandle<()> {
        let rx = self.rx.take().expect("consumer already spawned");
        self.orch.spawn_consumer(rx)
    }

    pub async fn token_count(&self) -> u64 {
        self.db.count().await.unwrap()
    }
}

pub fn settings() -> OrchestratorSettings {
    let mut s = OrchestratorSettings::default();
    s.network_timeout = Duration::from_secs(10);
    s.clean_url_hosts = vec!["faphouse.com".to_string()];
    s
}

/// Poll until `pred` holds or fail after `limit`.
pub async fn wait_until(limit: Duration, mut pred: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + limit;
    while !pred() {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in {limit:?}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

//! Messaging gateway fake that journals every call.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Mutex;

use mdl_core::error::GatewayError;
use mdl_core::gateway::{Menu, MessagingGateway};
use mdl_core::ids::{ChatId, MessageId};

use super::{Event, Journal};

pub struct RecordingGateway {
    journal: Journal,
    next_id: AtomicI32,
    pub fail_pins: AtomicBool,
    pub fail_unpins: AtomicBool,
    pub fail_photo_menus: AtomicBool,
    /// File names whose upload fails.
    pub failing_videos: Mutex<HashSet<String>>,
}

impl RecordingGateway {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            next_id: AtomicI32::new(1),
            fail_pins: AtomicBool::new(false),
            fail_unpins: AtomicBool::new(false),
            fail_photo_menus: AtomicBool::new(false),
            failing_videos: Mutex::new(HashSet::new()),
        }
    }

    fn next(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError> {
        let id = self.next();
        self.journal.push(Event::Text {
            chat,
            id,
            text: text.to_string(),
            reply_to,
        });
        Ok(id)
    }

    async fn send_menu(
        &self,
        chat: ChatId,
        menu: &Menu,
        _reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError> {
        if menu.photo_url.is_some() && self.fail_photo_menus.load(Ordering::SeqCst) {
            return Err(GatewayError::InvalidUrl("thumbnail rejected".into()));
        }
        let id = self.next();
        self.journal.push(Event::Menu {
            chat,
            id,
            menu: menu.clone(),
        });
        Ok(id)
    }

    async fn pin(&self, _chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.journal.push(Event::Pin(message));
        if self.fail_pins.load(Ordering::SeqCst) {
            return Err(GatewayError::Request("not enough rights to pin".into()));
        }
        Ok(())
    }

    async fn unpin(&self, _chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.journal.push(Event::Unpin(message));
        if self.fail_unpins.load(Ordering::SeqCst) {
            return Err(GatewayError::Request("message to unpin not found".into()));
        }
        Ok(())
    }

    async fn delete(&self, _chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.journal.push(Event::Delete(message));
        Ok(())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        path: &Path,
        _caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError> {
        let name = file_name(path);
        if self.failing_videos.lock().unwrap().contains(&name) {
            return Err(GatewayError::Request(format!("upload of {name} failed")));
        }
        self.journal.push(Event::Video {
            chat,
            file_name: name,
            reply_to,
        });
        Ok(self.next())
    }

    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        _caption: Option<&str>,
    ) -> Result<MessageId, GatewayError> {
        assert!(path.exists(), "document must exist when sent");
        self.journal.push(Event::Document {
            chat,
            file_name: file_name(path),
        });
        Ok(self.next())
    }
}

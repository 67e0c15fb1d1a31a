//! Chat commands that do not go through the queue: `/start` and owner `/export`.

use super::messages;
use super::payload::START_DOWNLOAD_PAYLOAD;
use super::Orchestrator;
use crate::export::export_all;
use crate::gateway::{Menu, MenuOption};
use crate::ids::{ChatId, MessageId, UserId};
use crate::store::{UsageEntry, UsageEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    NotAuthorized,
    /// Number of documents sent.
    Sent(usize),
    Failed,
}

impl Orchestrator {
    /// Greet the user. The first `/start` of a private user is logged as `first_seen`.
    pub async fn handle_start(&self, chat: ChatId, user: UserId, is_group: bool, reply_to: MessageId) {
        if is_group {
            self.reply(chat, messages::WELCOME_GROUP, Some(reply_to)).await;
            return;
        }

        match self.inner.usage.has_user(user).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(user_id = %user, "new user");
                let entry = UsageEntry::new(UsageEvent::FirstSeen, user, chat, "");
                self.record_usage(&entry).await;
            }
            Err(e) => tracing::warn!(user_id = %user, "usage lookup failed: {}", e),
        }

        let menu = Menu {
            text: messages::WELCOME.to_string(),
            photo_url: None,
            options: vec![MenuOption {
                label: messages::DOWNLOAD_BUTTON.to_string(),
                payload: START_DOWNLOAD_PAYLOAD.to_string(),
            }],
        };
        if let Err(e) = self.inner.gateway.send_menu(chat, &menu, Some(reply_to)).await {
            tracing::warn!(chat_id = %chat, "could not send welcome menu: {}", e);
        }
    }

    /// Send the token table and usage log as CSV documents, owner only.
    pub async fn handle_export(&self, chat: ChatId, user: UserId) -> ExportOutcome {
        if !self.inner.settings.is_owner(user) {
            tracing::warn!(chat_id = %chat, user_id = %user, "export refused");
            self.reply(chat, messages::NOT_AUTHORIZED, None).await;
            return ExportOutcome::NotAuthorized;
        }

        let dir = match tempfile::tempdir() {
            Ok(d) => d,
            Err(e) => {
                tracing::error!("could not create export dir: {}", e);
                self.reply(chat, messages::EXPORT_FAILED, None).await;
                return ExportOutcome::Failed;
            }
        };
        let files = match export_all(dir.path(), self.inner.tokens.as_ref(), self.inner.usage.as_ref()).await {
            Ok(f) => f,
            Err(e) => {
                tracing::error!("export failed: {:#}", e);
                self.reply(chat, messages::EXPORT_FAILED, None).await;
                return ExportOutcome::Failed;
            }
        };

        let mut sent = 0;
        for (path, caption) in [(&files.tokens, "Tokens"), (&files.usage, "Usage log")] {
            match self.inner.gateway.send_document(chat, path, Some(caption)).await {
                Ok(_) => sent += 1,
                Err(e) => tracing::warn!(path = %path.display(), "could not send export: {}", e),
            }
        }
        if sent == 0 {
            self.reply(chat, messages::EXPORT_FAILED, None).await;
            return ExportOutcome::Failed;
        }
        ExportOutcome::Sent(sent)
    }
}

//! Quality-selection callbacks: token → URL, then a job with the chosen format.

use super::messages;
use super::payload::{self, START_DOWNLOAD_PAYLOAD};
use super::Orchestrator;
use crate::error::MalformedCallback;
use crate::ids::{ChatId, MessageId, UserId};
use crate::queue::{Job, QueueTicket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// The payload could not be decoded. The caller answers the callback
    /// with `messages::INVALID_SELECTION`; nothing else is sent.
    Malformed(MalformedCallback),
    /// The welcome menu's "Download" button.
    LinkRequested,
    UnknownToken,
    Enqueued {
        ticket: QueueTicket,
        format_id: String,
    },
    StorageFailed,
    QueueClosed,
}

impl Orchestrator {
    /// `reply_to` is the message the menu was attached to.
    pub async fn handle_selection(
        &self,
        chat: ChatId,
        user: UserId,
        payload: &str,
        reply_to: MessageId,
    ) -> SelectionOutcome {
        if payload == START_DOWNLOAD_PAYLOAD {
            self.reply(chat, messages::SEND_LINK, None).await;
            return SelectionOutcome::LinkRequested;
        }

        let selection = match payload::decode(payload) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(chat_id = %chat, user_id = %user, "{}", e);
                return SelectionOutcome::Malformed(e);
            }
        };

        let url = match self.inner.tokens.get(&selection.token).await {
            Ok(Some(url)) => url,
            Ok(None) => {
                tracing::info!(chat_id = %chat, token = %selection.token, "unknown token");
                self.reply(chat, messages::VIDEO_NOT_FOUND, None).await;
                return SelectionOutcome::UnknownToken;
            }
            Err(e) => {
                tracing::error!(chat_id = %chat, token = %selection.token, "token lookup failed: {}", e);
                self.reply(chat, messages::STORAGE_LOOKUP_FAILED, None).await;
                return SelectionOutcome::StorageFailed;
            }
        };

        let format_id = selection.format_id;
        let job = Job {
            chat_id: chat,
            user_id: user,
            url,
            selected_format_id: Some(format_id.clone()),
            reply_to,
            token: Some(selection.token),
        };
        match self.enqueue_job(job).await {
            Ok(ticket) => SelectionOutcome::Enqueued { ticket, format_id },
            Err(_) => SelectionOutcome::QueueClosed,
        }
    }
}

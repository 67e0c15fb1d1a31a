//! Pinned status messages ("downloading", "sending").

use crate::gateway::MessagingGateway;
use crate::ids::{ChatId, MessageId};

/// A status message that was sent and pinned. `retire` consumes it, so each
/// announced message gets exactly one unpin-then-delete attempt.
#[must_use = "a status message must be retired"]
#[derive(Debug)]
pub(crate) struct StatusMessage {
    chat: ChatId,
    id: MessageId,
}

impl StatusMessage {
    /// Send `text` and pin it. Returns `None` if the message could not be
    /// sent; a failed pin is logged and the message is still retired later.
    pub(crate) async fn announce(
        gateway: &dyn MessagingGateway,
        chat: ChatId,
        text: &str,
    ) -> Option<Self> {
        let id = match gateway.send_text(chat, text, None).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(chat_id = %chat, "could not send status message: {}", e);
                return None;
            }
        };
        if let Err(e) = gateway.pin(chat, id).await {
            tracing::warn!(chat_id = %chat, message_id = %id, "could not pin status message: {}", e);
        }
        Some(Self { chat, id })
    }

    /// Unpin, then delete. Failures are logged and never change the job outcome.
    pub(crate) async fn retire(self, gateway: &dyn MessagingGateway) {
        if let Err(e) = gateway.unpin(self.chat, self.id).await {
            tracing::warn!(chat_id = %self.chat, message_id = %self.id, "could not unpin status message: {}", e);
        }
        if let Err(e) = gateway.delete(self.chat, self.id).await {
            tracing::warn!(chat_id = %self.chat, message_id = %self.id, "could not delete status message: {}", e);
        }
    }
}

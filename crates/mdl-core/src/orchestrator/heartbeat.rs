//! "Processing..." heartbeat shown while a probe runs.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use super::messages::PROCESSING;
use crate::gateway::MessagingGateway;
use crate::ids::{ChatId, MessageId};

/// Re-sends the processing message every `interval`, deleting the previous
/// one, until stopped. The last message is deleted on stop.
pub(crate) struct Heartbeat {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Heartbeat {
    pub(crate) fn start(gateway: Arc<dyn MessagingGateway>, chat: ChatId, interval: Duration) -> Self {
        let (stop, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut previous: Option<MessageId> = None;
            loop {
                match gateway.send_text(chat, PROCESSING, None).await {
                    Ok(id) => {
                        if let Some(old) = previous.replace(id) {
                            delete_quietly(gateway.as_ref(), chat, old).await;
                        }
                    }
                    Err(e) => tracing::debug!(chat_id = %chat, "heartbeat send failed: {}", e),
                }
                tokio::select! {
                    _ = tokio::time::sleep(interval) => {}
                    _ = &mut stop_rx => break,
                }
            }
            if let Some(last) = previous {
                delete_quietly(gateway.as_ref(), chat, last).await;
            }
        });
        Self { stop, task }
    }

    pub(crate) async fn stop(self) {
        let _ = self.stop.send(());
        if let Err(e) = self.task.await {
            tracing::warn!("heartbeat task ended abnormally: {}", e);
        }
    }
}

async fn delete_quietly(gateway: &dyn MessagingGateway, chat: ChatId, id: MessageId) {
    if let Err(e) = gateway.delete(chat, id).await {
        tracing::debug!(chat_id = %chat, message_id = %id, "heartbeat delete failed: {}", e);
    }
}

//! Messaging Gateway interface: everything the orchestrator says to a chat.

use async_trait::async_trait;
use std::path::Path;

use crate::error::GatewayError;
use crate::ids::{ChatId, MessageId};

/// One inline button: visible label plus the opaque payload sent back on press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuOption {
    pub label: String,
    pub payload: String,
}

/// A message with one button per row. Sent as a photo with caption when
/// `photo_url` is set, as plain text otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu {
    pub text: String,
    pub photo_url: Option<String>,
    pub options: Vec<MenuOption>,
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError>;

    async fn send_menu(
        &self,
        chat: ChatId,
        menu: &Menu,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError>;

    async fn pin(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError>;

    async fn unpin(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError>;

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError>;

    /// Upload a local file as a streamable video.
    async fn send_video(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError>;

    /// Upload a local file as a generic document (owner exports).
    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageId, GatewayError>;
}

//! Telegram side of the bot: the `MessagingGateway` implementation and the
//! update dispatcher.

mod handlers;
mod texts;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ReplyParameters,
};
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;

use mdl_core::error::GatewayError;
use mdl_core::gateway::{Menu, MenuOption, MessagingGateway};
use mdl_core::ids::{ChatId, MessageId};
use mdl_core::orchestrator::Orchestrator;

use handlers::Command;
pub use handlers::DonateLink;

/// Bot client whose HTTP requests (uploads included) are bounded by `timeout`.
pub fn build_bot(token: &str, timeout: Duration) -> Result<Bot> {
    let client = teloxide::net::default_reqwest_settings()
        .timeout(timeout)
        .build()?;
    Ok(Bot::with_client(token, client))
}

/// Serve updates until Ctrl-C.
pub async fn dispatch(bot: Bot, orch: Orchestrator, donate: DonateLink) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!("could not register bot commands: {}", e);
    }
    Dispatcher::builder(bot, handlers::schema())
        .dependencies(dptree::deps![orch, donate])
        .default_handler(|_| async {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "error in update handler",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

pub struct TelegramGateway {
    bot: Bot,
}

impl TelegramGateway {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn tg_chat(chat: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(chat.0)
}

fn tg_message(id: MessageId) -> teloxide::types::MessageId {
    teloxide::types::MessageId(id.0)
}

fn reply_parameters(reply_to: Option<MessageId>) -> Option<ReplyParameters> {
    reply_to.map(|id| ReplyParameters::new(tg_message(id)))
}

fn request_error(e: RequestError) -> GatewayError {
    GatewayError::Request(e.to_string())
}

/// One button per row.
fn keyboard(options: &[MenuOption]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(options.iter().map(|o| {
        vec![InlineKeyboardButton::callback(
            o.label.clone(),
            o.payload.clone(),
        )]
    }))
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_text(
        &self,
        chat: ChatId,
        text: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError> {
        let mut req = self.bot.send_message(tg_chat(chat), text);
        if let Some(params) = reply_parameters(reply_to) {
            req = req.reply_parameters(params);
        }
        let msg = req.await.map_err(request_error)?;
        Ok(MessageId(msg.id.0))
    }

    async fn send_menu(
        &self,
        chat: ChatId,
        menu: &Menu,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError> {
        let markup = keyboard(&menu.options);
        let sent = match &menu.photo_url {
            Some(photo) => {
                let url = url::Url::parse(photo)
                    .map_err(|e| GatewayError::InvalidUrl(format!("{photo}: {e}")))?;
                let mut req = self
                    .bot
                    .send_photo(tg_chat(chat), InputFile::url(url))
                    .caption(menu.text.as_str())
                    .reply_markup(markup);
                if let Some(params) = reply_parameters(reply_to) {
                    req = req.reply_parameters(params);
                }
                req.await
            }
            None => {
                let mut req = self
                    .bot
                    .send_message(tg_chat(chat), menu.text.as_str())
                    .reply_markup(markup);
                if let Some(params) = reply_parameters(reply_to) {
                    req = req.reply_parameters(params);
                }
                req.await
            }
        };
        let msg = sent.map_err(request_error)?;
        Ok(MessageId(msg.id.0))
    }

    async fn pin(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.bot
            .pin_chat_message(tg_chat(chat), tg_message(message))
            .disable_notification(true)
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn unpin(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.bot
            .unpin_chat_message(tg_chat(chat))
            .message_id(tg_message(message))
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn delete(&self, chat: ChatId, message: MessageId) -> Result<(), GatewayError> {
        self.bot
            .delete_message(tg_chat(chat), tg_message(message))
            .await
            .map_err(request_error)?;
        Ok(())
    }

    async fn send_video(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, GatewayError> {
        let mut req = self
            .bot
            .send_video(tg_chat(chat), InputFile::file(path.to_path_buf()))
            .supports_streaming(true);
        if let Some(text) = caption {
            req = req.caption(text);
        }
        if let Some(params) = reply_parameters(reply_to) {
            req = req.reply_parameters(params);
        }
        let msg = req.await.map_err(request_error)?;
        Ok(MessageId(msg.id.0))
    }

    async fn send_document(
        &self,
        chat: ChatId,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<MessageId, GatewayError> {
        let mut req = self
            .bot
            .send_document(tg_chat(chat), InputFile::file(path.to_path_buf()));
        if let Some(text) = caption {
            req = req.caption(text);
        }
        let msg = req.await.map_err(request_error)?;
        Ok(MessageId(msg.id.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::InlineKeyboardButtonKind;

    #[test]
    fn keyboard_has_one_button_per_row() {
        let options = vec![
            MenuOption {
                label: "360p".into(),
                payload: "q:0a1b2c3d:18".into(),
            },
            MenuOption {
                label: "720p".into(),
                payload: "q:0a1b2c3d:22".into(),
            },
        ];
        let markup = keyboard(&options);
        assert_eq!(markup.inline_keyboard.len(), 2);
        let first = &markup.inline_keyboard[0];
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].text, "360p");
        assert_eq!(
            first[0].kind,
            InlineKeyboardButtonKind::CallbackData("q:0a1b2c3d:18".into())
        );
    }

    #[test]
    fn ids_map_one_to_one() {
        assert_eq!(tg_chat(ChatId(-100123)).0, -100123);
        assert_eq!(tg_message(MessageId(42)).0, 42);
        assert!(reply_parameters(None).is_none());
        assert_eq!(
            reply_parameters(Some(MessageId(7))).map(|p| p.message_id.0),
            Some(7)
        );
    }
}

//! Update routing: commands, plain text and inline-button callbacks.
//!
//! Downloads are spawned so a slow probe never holds up the dispatcher's
//! per-chat worker.

use anyhow::Result;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::{BotCommands, ParseError};

use mdl_core::ids::{ChatId, MessageId, UserId};
use mdl_core::orchestrator::{messages, DownloadRequest, Orchestrator, SelectionOutcome};

use super::texts;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "show the welcome menu")]
    Start,
    #[command(description = "show this help message")]
    Help,
    #[command(description = "about this bot")]
    About,
    #[command(description = "how to support the bot")]
    Donate,
    #[command(description = "download media from a link", parse_with = link_argument)]
    Download(String),
    #[command(description = "export tokens and usage log (owner only)")]
    Export,
}

/// The whole argument, possibly empty; the orchestrator answers an empty one
/// with a usage hint.
fn link_argument(input: String) -> Result<(String,), ParseError> {
    Ok((input.trim().to_string(),))
}

/// Configured `/donate` link, injected as a dispatcher dependency.
#[derive(Debug, Clone, Default)]
pub struct DonateLink(pub Option<String>);

pub fn schema() -> UpdateHandler<anyhow::Error> {
    let commands = teloxide::filter_command::<Command, _>().endpoint(on_command);
    let texts_and_commands = Update::filter_message()
        .branch(commands)
        .branch(dptree::endpoint(on_text));
    let callbacks = Update::filter_callback_query().endpoint(on_callback);
    dptree::entry().branch(texts_and_commands).branch(callbacks)
}

fn chat_of(msg: &Message) -> ChatId {
    ChatId(msg.chat.id.0)
}

/// Sender of a message; channel posts have none and count as the chat itself.
fn user_of(msg: &Message) -> UserId {
    msg.from
        .as_ref()
        .map(|u| UserId(u.id.0 as i64))
        .unwrap_or(UserId(msg.chat.id.0))
}

fn spawn_request(orch: Orchestrator, msg: &Message, url: String) {
    let req = DownloadRequest {
        chat_id: chat_of(msg),
        user_id: user_of(msg),
        url,
        reply_to: MessageId(msg.id.0),
    };
    tokio::spawn(async move {
        let chat = req.chat_id;
        let outcome = orch.handle_request(req).await;
        tracing::debug!(chat_id = %chat, outcome = ?outcome, "request handled");
    });
}

async fn on_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    orch: Orchestrator,
    donate: DonateLink,
) -> Result<()> {
    let chat = chat_of(&msg);
    tracing::debug!(chat_id = %chat, command = ?cmd, "command");
    match cmd {
        Command::Start => {
            let is_group = msg.chat.is_group() || msg.chat.is_supergroup();
            orch.handle_start(chat, user_of(&msg), is_group, MessageId(msg.id.0))
                .await;
        }
        Command::Help => {
            bot.send_message(msg.chat.id, texts::HELP).await?;
        }
        Command::About => {
            bot.send_message(msg.chat.id, texts::ABOUT).await?;
        }
        Command::Donate => {
            bot.send_message(msg.chat.id, texts::donate(donate.0.as_deref()))
                .await?;
        }
        Command::Download(arg) => spawn_request(orch, &msg, arg),
        Command::Export => {
            let outcome = orch.handle_export(chat, user_of(&msg)).await;
            tracing::info!(chat_id = %chat, outcome = ?outcome, "export");
        }
    }
    Ok(())
}

/// Any other text is taken as a link.
async fn on_text(msg: Message, orch: Orchestrator) -> Result<()> {
    if let Some(text) = msg.text() {
        spawn_request(orch, &msg, text.to_string());
    }
    Ok(())
}

async fn on_callback(bot: Bot, q: CallbackQuery, orch: Orchestrator) -> Result<()> {
    let (Some(data), Some(menu)) = (q.data.as_deref(), q.message.as_ref()) else {
        bot.answer_callback_query(q.id.clone()).await?;
        return Ok(());
    };
    let chat = ChatId(menu.chat().id.0);
    let user = UserId(q.from.id.0 as i64);
    let outcome = orch
        .handle_selection(chat, user, data, MessageId(menu.id().0))
        .await;

    let answer = bot.answer_callback_query(q.id.clone());
    match outcome {
        SelectionOutcome::Malformed(_) => {
            answer
                .text(messages::INVALID_SELECTION)
                .show_alert(true)
                .await?;
        }
        _ => {
            answer.await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_download_argument() {
        assert_eq!(
            Command::parse("/download https://example.com/v", "mdl_bot").unwrap(),
            Command::Download("https://example.com/v".to_string())
        );
        assert_eq!(
            Command::parse("/download", "mdl_bot").unwrap(),
            Command::Download(String::new())
        );
    }

    #[test]
    fn parses_plain_commands() {
        assert_eq!(Command::parse("/start", "mdl_bot").unwrap(), Command::Start);
        assert_eq!(Command::parse("/export", "mdl_bot").unwrap(), Command::Export);
        assert_eq!(Command::parse("/donate", "mdl_bot").unwrap(), Command::Donate);
        assert!(Command::parse("/stats", "mdl_bot").is_err());
    }
}

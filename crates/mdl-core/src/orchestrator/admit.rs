//! Admission of new requests: validate, probe, gate, then either enqueue
//! directly or show a quality menu.

use std::sync::Arc;

use super::heartbeat::Heartbeat;
use super::messages;
use super::payload;
use super::phase::{self, JobPhase};
use super::Orchestrator;
use crate::classify::{classify, FailureClass};
use crate::error::ProbeError;
use crate::gateway::{Menu, MenuOption};
use crate::ids::{ChatId, MessageId, UserId};
use crate::queue::{Job, QueueTicket};
use crate::resolver::{self, FormatOption, ProbeResult};

/// A URL submitted as a plain message or through `/download <url>`.
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub chat_id: ChatId,
    pub user_id: UserId,
    /// Raw text as typed; trimmed before validation.
    pub url: String,
    /// The user's message; replies are threaded to it.
    pub reply_to: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Empty `/download` argument.
    MissingUrl,
    InvalidUrl,
    ProbeFailed(FailureClass),
    /// Every option was above the size gate for this user.
    Gated,
    Prompted { token: String, options: usize },
    Enqueued {
        ticket: QueueTicket,
        format_id: Option<String>,
    },
    StorageFailed,
    QueueClosed,
    GatewayFailed,
}

/// Only absolute http(s) URLs with a host are accepted.
fn parse_media_url(text: &str) -> Option<url::Url> {
    if !(text.starts_with("http://") || text.starts_with("https://")) {
        return None;
    }
    let parsed = url::Url::parse(text).ok()?;
    parsed.host_str()?;
    Some(parsed)
}

impl Orchestrator {
    pub async fn handle_request(&self, req: DownloadRequest) -> RequestOutcome {
        let chat = req.chat_id;
        let url = req.url.trim();
        if url.is_empty() {
            self.reply(chat, messages::DOWNLOAD_USAGE, Some(req.reply_to)).await;
            return RequestOutcome::MissingUrl;
        }
        let Some(parsed) = parse_media_url(url) else {
            tracing::debug!(chat_id = %chat, text = url, "rejected non-URL text");
            self.reply(chat, messages::INVALID_URL, Some(req.reply_to)).await;
            return RequestOutcome::InvalidUrl;
        };

        let settings = &self.inner.settings;
        if let Some(tip) = messages::clean_url_tip(&parsed, &settings.clean_url_hosts) {
            self.reply(chat, &tip, None).await;
        }

        phase::enter(chat, url, JobPhase::Probing);
        let heartbeat = settings.flags.probe_heartbeat.then(|| {
            Heartbeat::start(
                Arc::clone(&self.inner.gateway),
                chat,
                settings.flags.heartbeat_interval,
            )
        });
        let probed = self.probe(url).await;
        if let Some(hb) = heartbeat {
            hb.stop().await;
        }

        let probe = match probed {
            Ok(p) => p,
            Err(err) => {
                let class = classify(&err.cause);
                tracing::warn!(chat_id = %chat, url, class = ?class, "{}", err);
                phase::enter(chat, url, JobPhase::Failed);
                self.reply(chat, &class.user_message(), Some(req.reply_to)).await;
                return RequestOutcome::ProbeFailed(class);
            }
        };

        self.reply(
            chat,
            &messages::video_info(probe.approx_size_bytes, probe.duration_secs),
            Some(req.reply_to),
        )
        .await;

        let offered = self.gate(&probe.formats, req.user_id);
        if offered.is_empty() && !probe.formats.is_empty() {
            tracing::info!(chat_id = %chat, url, "all options above the size gate");
            phase::enter(chat, url, JobPhase::Failed);
            self.reply(chat, messages::GATED, Some(req.reply_to)).await;
            return RequestOutcome::Gated;
        }

        match offered.as_slice() {
            [] => self.admit_direct(&req, url, None).await,
            [only] => {
                let id = only.format_id.clone();
                self.admit_direct(&req, url, Some(id)).await
            }
            _ => self.prompt(&req, url, &probe, &offered).await,
        }
    }

    async fn probe(&self, url: &str) -> Result<ProbeResult, ProbeError> {
        let backend = self.inner.backend.as_ref();
        self.bounded(async {
            resolver::resolve(backend, url)
                .await
                .map_err(|e| e.cause)
        })
        .await
        .map_err(|cause| ProbeError { cause })
    }

    /// Options this user may pick. Unknown sizes (0) are never gated.
    fn gate<'a>(&self, formats: &'a [FormatOption], user: UserId) -> Vec<&'a FormatOption> {
        let settings = &self.inner.settings;
        match settings.flags.max_ungated_size_bytes {
            Some(max) if !settings.is_owner(user) => formats
                .iter()
                .filter(|f| f.approx_size_bytes <= max)
                .collect(),
            _ => formats.iter().collect(),
        }
    }

    async fn admit_direct(
        &self,
        req: &DownloadRequest,
        url: &str,
        format_id: Option<String>,
    ) -> RequestOutcome {
        let job = Job {
            chat_id: req.chat_id,
            user_id: req.user_id,
            url: url.to_string(),
            selected_format_id: format_id.clone(),
            reply_to: req.reply_to,
            token: None,
        };
        match self.enqueue_job(job).await {
            Ok(ticket) => RequestOutcome::Enqueued { ticket, format_id },
            Err(_) => RequestOutcome::QueueClosed,
        }
    }

    async fn prompt(
        &self,
        req: &DownloadRequest,
        url: &str,
        probe: &ProbeResult,
        offered: &[&FormatOption],
    ) -> RequestOutcome {
        let chat = req.chat_id;
        phase::enter(chat, url, JobPhase::AwaitingSelection);

        let token = match self.inner.tokens.put(url).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(chat_id = %chat, url, "could not store token: {}", e);
                self.reply(chat, messages::STORAGE_UNAVAILABLE, Some(req.reply_to)).await;
                return RequestOutcome::StorageFailed;
            }
        };

        let show_size = self.inner.settings.flags.show_size_in_prompt;
        let options: Vec<MenuOption> = offered
            .iter()
            .filter_map(|f| match payload::encode(&token, &f.format_id) {
                Some(payload) => Some(MenuOption {
                    label: messages::option_label(&f.label, f.approx_size_bytes, show_size),
                    payload,
                }),
                None => {
                    tracing::warn!(format_id = %f.format_id, "selection payload too long, option omitted");
                    None
                }
            })
            .collect();

        if options.is_empty() {
            self.forget_token(&token).await;
            return self.admit_direct(req, url, None).await;
        }

        let count = options.len();
        let mut menu = Menu {
            text: match probe.thumbnail_url {
                Some(_) => messages::prompt_caption(
                    &probe.title,
                    probe.approx_size_bytes,
                    probe.duration_secs,
                ),
                None => messages::SELECT_QUALITY.to_string(),
            },
            photo_url: probe.thumbnail_url.clone(),
            options,
        };

        let gateway = self.inner.gateway.as_ref();
        let mut sent = gateway.send_menu(chat, &menu, Some(req.reply_to)).await;
        let retry_as_text = match &sent {
            Err(e) if menu.photo_url.is_some() => {
                tracing::warn!(chat_id = %chat, "photo menu failed, retrying as text: {}", e);
                true
            }
            _ => false,
        };
        if retry_as_text {
            menu.photo_url = None;
            sent = gateway.send_menu(chat, &menu, Some(req.reply_to)).await;
        }

        match sent {
            Ok(_) => {
                tracing::debug!(chat_id = %chat, token = %token, options = count, "quality menu shown");
                RequestOutcome::Prompted {
                    token,
                    options: count,
                }
            }
            Err(e) => {
                tracing::error!(chat_id = %chat, "could not show quality menu: {}", e);
                self.forget_token(&token).await;
                self.reply(chat, messages::GENERIC_ERROR, Some(req.reply_to)).await;
                RequestOutcome::GatewayFailed
            }
        }
    }
}

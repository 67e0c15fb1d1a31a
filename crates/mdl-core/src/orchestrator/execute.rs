//! Consumer side of a job: download, deliver, report, clean up.

use std::path::{Path, PathBuf};
use std::time::Instant;

use super::messages;
use super::phase::{self, JobPhase};
use super::status::StatusMessage;
use super::Orchestrator;
use crate::backend::BackendFault;
use crate::classify::classify;
use crate::error::{DeliveryError, FetchError};
use crate::queue::Job;
use crate::store::{UsageEntry, UsageEvent};

impl Orchestrator {
    /// Run one dequeued job to its terminal phase.
    pub(super) async fn execute(&self, job: Job) -> JobPhase {
        let started = Instant::now();
        let chat = job.chat_id;
        let gateway = self.inner.gateway.as_ref();

        phase::enter(chat, &job.url, JobPhase::Downloading);
        let status = StatusMessage::announce(gateway, chat, messages::DOWNLOADING).await;
        let fetched = self.fetch(&job).await;
        if let Some(status) = status {
            status.retire(gateway).await;
        }
        let download_secs = started.elapsed().as_secs_f64();

        let terminal = match fetched {
            Ok(files) => {
                self.deliver(&job, &files, download_secs).await;
                JobPhase::Done
            }
            Err(FetchError(fault)) => {
                self.fail(&job, &fault).await;
                JobPhase::Failed
            }
        };

        phase::enter(chat, &job.url, terminal);
        if let Some(token) = &job.token {
            self.forget_token(token).await;
        }
        self.inner.chats.note_finished(chat);
        tracing::debug!(
            chat_id = %chat,
            elapsed_secs = started.elapsed().as_secs_f64(),
            "job finished"
        );
        terminal
    }

    async fn fetch(&self, job: &Job) -> Result<Vec<PathBuf>, FetchError> {
        let backend = self.inner.backend.as_ref();
        let files = self
            .bounded(backend.fetch(&job.url, job.selected_format_id.as_deref()))
            .await
            .map_err(FetchError)?;
        if files.is_empty() {
            return Err(FetchError(BackendFault::new("the media backend produced no file")));
        }
        Ok(files)
    }

    async fn deliver(&self, job: &Job, files: &[PathBuf], download_secs: f64) {
        let chat = job.chat_id;
        let gateway = self.inner.gateway.as_ref();
        phase::enter(chat, &job.url, JobPhase::Delivering);

        let upload_started = Instant::now();
        let status = StatusMessage::announce(gateway, chat, messages::SENDING).await;
        let mut sent_bytes = 0u64;
        let mut sent_files = 0usize;
        for path in files {
            match self.deliver_one(job, path).await {
                Ok(size) => {
                    sent_bytes += size;
                    sent_files += 1;
                    tracing::info!(chat_id = %chat, path = %path.display(), size, "file delivered");
                }
                Err(e) => {
                    tracing::warn!(chat_id = %chat, "delivery failed: {}", e);
                    let text = match &e {
                        DeliveryError::TooLarge { size, limit, .. } => messages::too_large(*size, *limit),
                        _ => messages::SEND_FAILED.to_string(),
                    };
                    self.reply(chat, &text, Some(job.reply_to)).await;
                }
            }
            remove_local(path).await;
        }
        if let Some(status) = status {
            status.retire(gateway).await;
        }
        self.reply(chat, messages::COMPLETE, Some(job.reply_to)).await;

        let event = if sent_files > 0 {
            UsageEvent::Delivered
        } else {
            UsageEvent::Failed
        };
        let entry = UsageEntry::new(event, job.user_id, chat, job.url.as_str()).with_transfer(
            sent_bytes,
            download_secs,
            upload_started.elapsed().as_secs_f64(),
        );
        self.record_usage(&entry).await;
    }

    /// Send one file; returns its size.
    async fn deliver_one(&self, job: &Job, path: &Path) -> Result<u64, DeliveryError> {
        let size = tokio::fs::metadata(path)
            .await
            .map_err(|source| DeliveryError::Io {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let limit = self.inner.settings.max_upload_bytes;
        if size > limit {
            return Err(DeliveryError::TooLarge {
                path: path.to_path_buf(),
                size,
                limit,
            });
        }
        self.inner
            .gateway
            .send_video(job.chat_id, path, None, Some(job.reply_to))
            .await
            .map_err(|source| DeliveryError::Gateway {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(size)
    }

    async fn fail(&self, job: &Job, fault: &BackendFault) {
        let class = classify(fault);
        tracing::warn!(chat_id = %job.chat_id, url = %job.url, class = ?class, "fetch failed: {}", fault);
        self.reply(job.chat_id, &class.user_message(), Some(job.reply_to)).await;
        let entry = UsageEntry::new(UsageEvent::Failed, job.user_id, job.chat_id, job.url.as_str());
        self.record_usage(&entry).await;
    }

    pub(super) async fn record_usage(&self, entry: &UsageEntry) {
        if let Err(e) = self.inner.usage.record(entry).await {
            tracing::warn!(user_id = %entry.user_id, "could not record usage: {}", e);
        }
    }
}

async fn remove_local(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "local file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), "could not remove local file: {}", e),
    }
}

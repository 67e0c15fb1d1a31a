//! Types stored in the bot database.

use serde::Serialize;

use crate::ids::{ChatId, UserId};

/// A stored (token, url) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    pub id: String,
    pub url: String,
    pub created_at: i64,
}

/// Kind of usage event, stored as a string in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageEvent {
    FirstSeen,
    Delivered,
    Failed,
}

impl UsageEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            UsageEvent::FirstSeen => "first_seen",
            UsageEvent::Delivered => "delivered",
            UsageEvent::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "first_seen" => UsageEvent::FirstSeen,
            "delivered" => UsageEvent::Delivered,
            _ => UsageEvent::Failed,
        }
    }
}

/// One row of the usage log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageEntry {
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub url: String,
    pub event: UsageEvent,
    pub file_size_bytes: u64,
    pub download_secs: f64,
    pub upload_secs: f64,
    pub total_secs: f64,
    pub speed_bytes_per_sec: f64,
    pub created_at: i64,
}

impl UsageEntry {
    pub fn new(event: UsageEvent, user_id: UserId, chat_id: ChatId, url: impl Into<String>) -> Self {
        Self {
            user_id,
            chat_id,
            url: url.into(),
            event,
            file_size_bytes: 0,
            download_secs: 0.0,
            upload_secs: 0.0,
            total_secs: 0.0,
            speed_bytes_per_sec: 0.0,
            created_at: super::db::unix_timestamp(),
        }
    }

    /// Fill the transfer statistics; speed is derived from size and download time.
    pub fn with_transfer(mut self, size: u64, download_secs: f64, upload_secs: f64) -> Self {
        self.file_size_bytes = size;
        self.download_secs = download_secs;
        self.upload_secs = upload_secs;
        self.total_secs = download_secs + upload_secs;
        self.speed_bytes_per_sec = if download_secs > 0.0 {
            size as f64 / download_secs
        } else {
            0.0
        };
        self
    }
}

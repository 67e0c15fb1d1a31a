//! Usage log operations: append, list, first-seen lookup.

use async_trait::async_trait;
use sqlx::Row;

use super::db::BotDb;
use super::types::{UsageEntry, UsageEvent};
use super::UsageLog;
use crate::error::StorageError;
use crate::ids::{ChatId, UserId};

#[async_trait]
impl UsageLog for BotDb {
    async fn record(&self, entry: &UsageEntry) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO usage (
                user_id, chat_id, url, event, file_size_bytes,
                download_secs, upload_secs, total_secs, speed_bytes_per_sec, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(entry.user_id.0)
        .bind(entry.chat_id.0)
        .bind(&entry.url)
        .bind(entry.event.as_str())
        .bind(entry.file_size_bytes as i64)
        .bind(entry.download_secs)
        .bind(entry.upload_secs)
        .bind(entry.total_secs)
        .bind(entry.speed_bytes_per_sec)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<UsageEntry>, StorageError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, chat_id, url, event, file_size_bytes,
                   download_secs, upload_secs, total_secs, speed_bytes_per_sec, created_at
            FROM usage
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let event: String = row.get("event");
            let size: i64 = row.get("file_size_bytes");
            out.push(UsageEntry {
                user_id: UserId(row.get("user_id")),
                chat_id: ChatId(row.get("chat_id")),
                url: row.get("url"),
                event: UsageEvent::parse(&event),
                file_size_bytes: size.max(0) as u64,
                download_secs: row.get("download_secs"),
                upload_secs: row.get("upload_secs"),
                total_secs: row.get("total_secs"),
                speed_bytes_per_sec: row.get("speed_bytes_per_sec"),
                created_at: row.get("created_at"),
            });
        }
        Ok(out)
    }

    async fn has_user(&self, user: UserId) -> Result<bool, StorageError> {
        let row = sqlx::query("SELECT 1 FROM usage WHERE user_id = ?1 AND event = ?2 LIMIT 1")
            .bind(user.0)
            .bind(UsageEvent::FirstSeen.as_str())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

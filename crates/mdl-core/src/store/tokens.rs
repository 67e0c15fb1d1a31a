//! Token operations: mint, look up, delete, sweep.

use async_trait::async_trait;
use sqlx::Row;
use std::time::Duration;

use super::db::{unix_timestamp, BotDb};
use super::types::TokenRecord;
use super::TokenStore;
use crate::error::StorageError;

/// Token length in characters. Leaves room for a format id in a 64-byte payload.
pub const TOKEN_LEN: usize = 8;
/// Collisions are retried this many times before giving up.
pub const TOKEN_PUT_ATTEMPTS: u32 = 3;

fn fresh_token() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(TOKEN_LEN);
    id
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

impl BotDb {
    /// Insert `url` under tokens from `next_token`, retrying on collision.
    pub(crate) async fn put_with<F>(&self, url: &str, mut next_token: F) -> Result<String, StorageError>
    where
        F: FnMut() -> String + Send,
    {
        for attempt in 1..=TOKEN_PUT_ATTEMPTS {
            let token = next_token();
            let res = sqlx::query("INSERT INTO tokens (id, url, created_at) VALUES (?1, ?2, ?3)")
                .bind(&token)
                .bind(url)
                .bind(unix_timestamp())
                .execute(&self.pool)
                .await;
            match res {
                Ok(_) => return Ok(token),
                Err(e) if is_unique_violation(&e) => {
                    tracing::warn!(attempt, "token collision, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::TokenSpaceExhausted {
            attempts: TOKEN_PUT_ATTEMPTS,
        })
    }

    /// Backdate a token (sweep tests).
    #[cfg(test)]
    pub(crate) async fn set_token_created_at(&self, token: &str, at: i64) -> Result<(), StorageError> {
        sqlx::query("UPDATE tokens SET created_at = ?1 WHERE id = ?2")
            .bind(at)
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for BotDb {
    async fn put(&self, url: &str) -> Result<String, StorageError> {
        self.put_with(url, fresh_token).await
    }

    async fn get(&self, token: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT url FROM tokens WHERE id = ?1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("url")))
    }

    async fn delete(&self, token: &str) -> Result<bool, StorageError> {
        let res = sqlx::query("DELETE FROM tokens WHERE id = ?1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM tokens")
            .fetch_one(&self.pool)
            .await?;
        let n: i64 = row.get("n");
        Ok(n.max(0) as u64)
    }

    async fn list(&self) -> Result<Vec<TokenRecord>, StorageError> {
        let rows = sqlx::query("SELECT id, url, created_at FROM tokens ORDER BY created_at ASC, id ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| TokenRecord {
                id: row.get("id"),
                url: row.get("url"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn sweep_older_than(&self, age: Duration) -> Result<u64, StorageError> {
        let age = i64::try_from(age.as_secs()).unwrap_or(i64::MAX);
        let cutoff = unix_timestamp().saturating_sub(age);
        let res = sqlx::query("DELETE FROM tokens WHERE created_at < ?1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

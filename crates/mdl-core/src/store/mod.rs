//! Persistent token store and usage log (SQLite via sqlx).
//!
//! Tokens map a short opaque key to the URL it stands for, so a selection
//! payload can survive a process restart without carrying the URL itself.

pub mod db;
pub mod types;
mod tokens;
mod usage;


pub use db::BotDb;
pub use tokens::{TOKEN_LEN, TOKEN_PUT_ATTEMPTS};
pub use types::*;

use async_trait::async_trait;
use std::time::Duration;

use crate::error::StorageError;
use crate::ids::UserId;

#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Mint a fresh token for `url` and persist it.
    async fn put(&self, url: &str) -> Result<String, StorageError>;

    async fn get(&self, token: &str) -> Result<Option<String>, StorageError>;

    /// Returns whether a row was removed.
    async fn delete(&self, token: &str) -> Result<bool, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;

    /// All tokens, oldest first.
    async fn list(&self) -> Result<Vec<TokenRecord>, StorageError>;

    /// Remove tokens created more than `age` ago. Returns how many were removed.
    async fn sweep_older_than(&self, age: Duration) -> Result<u64, StorageError>;
}

#[async_trait]
pub trait UsageLog: Send + Sync {
    async fn record(&self, entry: &UsageEntry) -> Result<(), StorageError>;

    /// All entries, oldest first.
    async fn entries(&self) -> Result<Vec<UsageEntry>, StorageError>;

    /// Whether `user` already has a `first_seen` entry.
    async fn has_user(&self, user: UserId) -> Result<bool, StorageError>;
}

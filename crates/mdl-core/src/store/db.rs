//! SQLite-backed bot database.
//!
//! Handles connection, migrations, and timestamp helpers. Token and usage
//! operations live in `tokens` and `usage`.

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::logging::state_dir;

/// Percent-encode a path for use in a sqlite:// URI so spaces and special chars don't break parsing.
fn path_to_sqlite_uri(path: &Path) -> String {
    let s = path.to_string_lossy();
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '%' => out.push_str("%25"),
            ' ' => out.push_str("%20"),
            '#' => out.push_str("%23"),
            '?' => out.push_str("%3F"),
            '&' => out.push_str("%26"),
            c => out.push(c),
        }
    }
    format!("sqlite://{}", out)
}

/// Handle to the token/usage database.
///
/// The database file lives under the XDG state directory:
/// `~/.local/state/mdl/mdl.db` on Debian.
#[derive(Clone)]
pub struct BotDb {
    pub(crate) pool: Pool<Sqlite>,
}

impl BotDb {
    /// Open (or create) the default database and run migrations.
    pub async fn open_default() -> Result<Self> {
        Self::open_at(state_dir()?.join("mdl.db")).await
    }

    /// Open (or create) the database at a specific path. Creates parent dirs if needed.
    pub async fn open_at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let uri = path_to_sqlite_uri(path) + "?mode=rwc";
        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect(&uri)
            .await?;
        let db = BotDb { pool };
        db.migrate().await?;
        tracing::debug!(path = %path.display(), "bot database ready");
        Ok(db)
    }

    /// In-memory database (no disk I/O). A single connection so every query
    /// sees the same memory database.
    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let db = BotDb { pool };
        db.migrate().await?;
        Ok(db)
    }

    async fn migrate(&self) -> Result<()> {
        // - `tokens.id` is the short key embedded in selection payloads.
        // - `usage` is append-only; `event` is one of first_seen/delivered/failed.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tokens (
                id TEXT PRIMARY KEY,
                url TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usage (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                chat_id INTEGER NOT NULL,
                url TEXT NOT NULL,
                event TEXT NOT NULL,
                file_size_bytes INTEGER NOT NULL DEFAULT 0,
                download_secs REAL NOT NULL DEFAULT 0,
                upload_secs REAL NOT NULL DEFAULT 0,
                total_secs REAL NOT NULL DEFAULT 0,
                speed_bytes_per_sec REAL NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_usage_user ON usage (user_id, event);")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Current time as Unix seconds (for DB timestamps).
pub(crate) fn unix_timestamp() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod uri_tests {
    use super::*;

    #[test]
    fn sqlite_uri_escapes_special_chars() {
        let uri = path_to_sqlite_uri(Path::new("/tmp/my dir/a#b?.db"));
        assert_eq!(uri, "sqlite:///tmp/my%20dir/a%23b%3F.db");
    }
}

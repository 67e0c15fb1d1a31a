//! CSV export of the token table and the usage log (owner `/export`, `mdl export`).

use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::store::{TokenRecord, TokenStore, UsageEntry, UsageLog};

pub const TOKENS_FILE: &str = "tokens.csv";
pub const USAGE_FILE: &str = "usage.csv";

const TOKEN_HEADERS: [&str; 3] = ["id", "url", "created_at"];
const USAGE_HEADERS: [&str; 10] = [
    "user_id",
    "chat_id",
    "url",
    "event",
    "file_size_bytes",
    "download_secs",
    "upload_secs",
    "total_secs",
    "speed_bytes_per_sec",
    "created_at",
];

/// Paths written by `export_all`.
#[derive(Debug, Clone)]
pub struct ExportFiles {
    pub tokens: PathBuf,
    pub usage: PathBuf,
}

/// Write rows under an explicit header so empty tables still produce one.
fn write_csv<T: Serialize>(path: &Path, headers: &[&str], rows: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create export dir {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));
    writer.write_record(headers)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_tokens_csv(path: &Path, tokens: &[TokenRecord]) -> Result<()> {
    write_csv(path, &TOKEN_HEADERS, tokens)
}

pub fn write_usage_csv(path: &Path, entries: &[UsageEntry]) -> Result<()> {
    write_csv(path, &USAGE_HEADERS, entries)
}

/// Dump both tables into `dir` as `tokens.csv` and `usage.csv`.
pub async fn export_all(dir: &Path, tokens: &dyn TokenStore, usage: &dyn UsageLog) -> Result<ExportFiles> {
    let token_rows = tokens.list().await?;
    let usage_rows = usage.entries().await?;
    let (token_count, usage_count) = (token_rows.len(), usage_rows.len());
    let files = ExportFiles {
        tokens: dir.join(TOKENS_FILE),
        usage: dir.join(USAGE_FILE),
    };
    tokio::task::spawn_blocking({
        let files = files.clone();
        move || -> Result<()> {
            write_tokens_csv(&files.tokens, &token_rows)?;
            write_usage_csv(&files.usage, &usage_rows)
        }
    })
    .await
    .context("export task join")??;
    tracing::info!(
        dir = %dir.display(),
        tokens = token_count,
        usage = usage_count,
        "export written"
    );
    Ok(files)
}

//! `mdl export <dir>` – dump the token table and usage log as CSV.

use anyhow::Result;
use mdl_core::export::export_all;
use mdl_core::store::BotDb;
use std::path::Path;

pub async fn run_export(db: &BotDb, dir: &Path) -> Result<()> {
    let files = export_all(dir, db, db).await?;
    println!("{}", files.tokens.display());
    println!("{}", files.usage.display());
    Ok(())
}

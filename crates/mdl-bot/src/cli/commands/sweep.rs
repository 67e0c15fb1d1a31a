//! `mdl sweep` – drop tokens of quality menus nobody answered.

use anyhow::Result;
use mdl_core::config::MdlConfig;
use mdl_core::store::{BotDb, TokenStore};
use std::time::Duration;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

pub async fn run_sweep(db: &BotDb, cfg: &MdlConfig, older_than_days: Option<u64>) -> Result<()> {
    let age = match older_than_days {
        Some(days) => Duration::from_secs(days.saturating_mul(SECS_PER_DAY)),
        None => cfg.token_ttl(),
    };
    let removed = db.sweep_older_than(age).await?;
    let left = db.count().await?;
    println!("Removed {removed} token(s), {left} left.");
    Ok(())
}

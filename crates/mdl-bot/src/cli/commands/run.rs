//! `mdl run` – serve Telegram updates with one download consumer.

use anyhow::{Context, Result};
use mdl_core::backend::YtDlpBackend;
use mdl_core::config::{MdlConfig, Secrets};
use mdl_core::orchestrator::{Orchestrator, OrchestratorSettings};
use mdl_core::store::{BotDb, TokenStore};
use std::sync::Arc;

use crate::telegram::{self, DonateLink, TelegramGateway};

pub async fn run_bot(cfg: &MdlConfig, db: BotDb) -> Result<()> {
    let secrets = Secrets::from_env()?;
    tracing::debug!("secrets: {:?}", secrets);
    if secrets.owner_id.is_none() {
        tracing::warn!("no owner configured, /export is disabled");
    }

    // Tokens of menus that were never answered.
    let swept = db.sweep_older_than(cfg.token_ttl()).await?;
    if swept > 0 {
        tracing::info!("swept {} stale token(s)", swept);
    }

    let download_dir = cfg.download_dir();
    tokio::fs::create_dir_all(&download_dir)
        .await
        .with_context(|| format!("create download dir {}", download_dir.display()))?;

    let bot = telegram::build_bot(&secrets.bot_token, cfg.network_timeout())?;
    let gateway = Arc::new(TelegramGateway::new(bot.clone()));
    let backend = Arc::new(YtDlpBackend::from_config(cfg));
    let db = Arc::new(db);
    let settings = OrchestratorSettings::from_config(cfg, secrets.owner_id);
    let (orch, receiver) = Orchestrator::new(gateway, backend, db.clone(), db, settings);

    let consumer = orch.spawn_consumer(receiver);
    tracing::info!(download_dir = %download_dir.display(), "bot starting");
    telegram::dispatch(bot, orch, DonateLink(cfg.donate_url.clone())).await;

    // Jobs still queued are dropped with the process.
    consumer.abort();
    tracing::info!("bot stopped");
    Ok(())
}

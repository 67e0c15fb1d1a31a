//! CLI for the MDL bot.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mdl_core::config::{self, MdlConfig};
use mdl_core::logging;
use mdl_core::store::BotDb;
use std::path::{Path, PathBuf};

use commands::{run_bot, run_export, run_sweep};

/// Top-level CLI for the MDL bot.
#[derive(Debug, Parser)]
#[command(name = "mdl")]
#[command(about = "MDL: chat bot that downloads media from links", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/mdl/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Database file to use instead of ~/.local/state/mdl/mdl.db.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Log to stderr instead of the state-dir log file.
    #[arg(long, global = true)]
    pub stderr_log: bool,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Connect to Telegram and serve requests until interrupted.
    ///
    /// Needs MDL_BOT_TOKEN; MDL_OWNER_ID enables /export.
    Run,

    /// Write tokens.csv and usage.csv into a directory.
    Export {
        /// Target directory (created if missing).
        dir: PathBuf,
    },

    /// Remove quality-menu tokens older than the configured TTL.
    Sweep {
        /// Override `token_ttl_days` from the config.
        #[arg(long, value_name = "DAYS")]
        older_than_days: Option<u64>,
    },
}

fn load_config(path: Option<&Path>) -> Result<MdlConfig> {
    match path {
        Some(p) => config::load_or_init_at(p),
        None => config::load_or_init(),
    }
}

async fn open_db(path: Option<&Path>) -> Result<BotDb> {
    match path {
        Some(p) => BotDb::open_at(p).await,
        None => BotDb::open_default().await,
    }
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        if cli.stderr_log {
            logging::init_logging_stderr();
        } else if let Err(e) = logging::init_logging() {
            logging::init_logging_stderr();
            tracing::warn!("file logging unavailable, using stderr: {:#}", e);
        }

        let cfg = load_config(cli.config.as_deref())?;
        tracing::debug!("loaded config: {:?}", cfg);
        let db = open_db(cli.db.as_deref()).await?;

        match cli.command {
            CliCommand::Run => run_bot(&cfg, db).await?,
            CliCommand::Export { dir } => run_export(&db, &dir).await?,
            CliCommand::Sweep { older_than_days } => run_sweep(&db, &cfg, older_than_days).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;

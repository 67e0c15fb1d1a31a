//! CLI command handlers, one file per command.

mod export;
mod run;
mod sweep;

pub use export::run_export;
pub use run::run_bot;
pub use sweep::run_sweep;

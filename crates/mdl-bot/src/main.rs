mod cli;
mod telegram;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Logging is initialized inside, once `--stderr-log` is known.
    if let Err(err) = CliCommand::run_from_args().await {
        eprintln!("mdl error: {:#}", err);
        std::process::exit(1);
    }
}

//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_run() {
    let cli = parse(&["mdl", "run"]);
    assert!(matches!(cli.command, CliCommand::Run));
    assert!(cli.config.is_none());
    assert!(cli.db.is_none());
    assert!(!cli.stderr_log);
}

#[test]
fn cli_parse_global_flags_after_subcommand() {
    let cli = parse(&[
        "mdl",
        "run",
        "--config",
        "/etc/mdl.toml",
        "--db",
        "/var/lib/mdl/mdl.db",
        "--stderr-log",
    ]);
    assert_eq!(cli.config, Some(PathBuf::from("/etc/mdl.toml")));
    assert_eq!(cli.db, Some(PathBuf::from("/var/lib/mdl/mdl.db")));
    assert!(cli.stderr_log);
}

#[test]
fn cli_parse_export() {
    match parse(&["mdl", "export", "out"]).command {
        CliCommand::Export { dir } => assert_eq!(dir, PathBuf::from("out")),
        _ => panic!("expected Export"),
    }
}

#[test]
fn cli_parse_export_requires_dir() {
    assert!(Cli::try_parse_from(["mdl", "export"]).is_err());
}

#[test]
fn cli_parse_sweep() {
    match parse(&["mdl", "sweep"]).command {
        CliCommand::Sweep { older_than_days } => assert_eq!(older_than_days, None),
        _ => panic!("expected Sweep"),
    }
    match parse(&["mdl", "sweep", "--older-than-days", "7"]).command {
        CliCommand::Sweep { older_than_days } => assert_eq!(older_than_days, Some(7)),
        _ => panic!("expected Sweep"),
    }
}

#[test]
fn cli_requires_subcommand() {
    assert!(Cli::try_parse_from(["mdl"]).is_err());
}

#[test]
fn cli_is_well_formed() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}

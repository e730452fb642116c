//! CLI parse tests.

use super::{Cli, CliCommand};
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn cli_parse_serve() {
    let cli = parse(&["jfd", "serve"]);
    assert!(matches!(cli.command, CliCommand::Serve));
    assert!(cli.config.is_none());
}

#[test]
fn cli_parse_fetch_default_subdir() {
    match parse(&["jfd", "fetch", "http://jf/web/#/details?id=1"]).command {
        CliCommand::Fetch { url, subdir } => {
            assert_eq!(url, "http://jf/web/#/details?id=1");
            assert_eq!(subdir, "");
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_start_with_subdir() {
    match parse(&["jfd", "start", "http://jf/web/#/details?id=1", "--subdir", "tv/kids"]).command {
        CliCommand::Start { url, subdir } => {
            assert_eq!(url, "http://jf/web/#/details?id=1");
            assert_eq!(subdir, "tv/kids");
        }
        _ => panic!("expected Start"),
    }
}

#[test]
fn cli_parse_flags() {
    assert!(matches!(parse(&["jfd", "pause"]).command, CliCommand::Pause));
    assert!(matches!(parse(&["jfd", "resume"]).command, CliCommand::Resume));
    assert!(matches!(parse(&["jfd", "abort"]).command, CliCommand::Abort));
}

#[test]
fn cli_parse_status_json() {
    match parse(&["jfd", "status", "--json"]).command {
        CliCommand::Status { json } => assert!(json),
        _ => panic!("expected Status"),
    }
    match parse(&["jfd", "status"]).command {
        CliCommand::Status { json } => assert!(!json),
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_parse_global_config() {
    let cli = parse(&["jfd", "serve", "--config", "/etc/jfd.toml"]);
    assert_eq!(cli.config.unwrap().to_str(), Some("/etc/jfd.toml"));
}

#[test]
fn cli_rejects_missing_url() {
    assert!(Cli::try_parse_from(["jfd", "start"]).is_err());
    assert!(Cli::try_parse_from(["jfd", "pause", "3"]).is_err());
}

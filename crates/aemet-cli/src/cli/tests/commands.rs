use super::parse;
use crate::cli::{Cli, CliCommand, WindowArgs};
use aemet_core::config::AemetConfig;
use aemet_core::error::ConfigError;
use chrono::NaiveDate;
use clap::Parser;
use std::path::Path;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn cli_parse_fetch() {
    match parse(&[
        "aemet-sync",
        "fetch",
        "--station",
        "0200E",
        "--start",
        "1980-01-01",
        "--end",
        "1980-07-01",
    ]) {
        CliCommand::Fetch {
            station,
            window,
            out_dir,
        } => {
            assert_eq!(station, "0200E");
            assert_eq!(window.start, d(1980, 1, 1));
            assert_eq!(window.end, d(1980, 7, 1));
            assert!(window.months.is_none());
            assert!(out_dir.is_none());
        }
        _ => panic!("expected Fetch"),
    }
}

#[test]
fn cli_parse_fetch_months_and_out_dir() {
    match parse(&[
        "aemet-sync",
        "fetch",
        "--station",
        "3195",
        "--start",
        "2000-01-01",
        "--end",
        "2001-01-01",
        "--months",
        "6",
        "--out-dir",
        "/tmp/out",
    ]) {
        CliCommand::Fetch {
            window, out_dir, ..
        } => {
            assert_eq!(window.months, Some(6));
            assert_eq!(out_dir.as_deref(), Some(Path::new("/tmp/out")));
        }
        _ => panic!("expected Fetch with --months"),
    }
}

#[test]
fn cli_parse_batch() {
    match parse(&[
        "aemet-sync",
        "batch",
        "0200E",
        "3195",
        "--start",
        "1980-01-01",
        "--end",
        "1980-07-01",
        "--jobs",
        "4",
    ]) {
        CliCommand::Batch { stations, jobs, .. } => {
            assert_eq!(stations, vec!["0200E", "3195"]);
            assert_eq!(jobs, 4);
        }
        _ => panic!("expected Batch"),
    }
}

#[test]
fn cli_parse_batch_default_jobs() {
    match parse(&[
        "aemet-sync", "batch", "0200E", "--start", "1980-01-01", "--end", "1980-07-01",
    ]) {
        CliCommand::Batch { jobs, .. } => assert_eq!(jobs, 1),
        _ => panic!("expected Batch"),
    }
}

#[test]
fn cli_parse_aggregate() {
    match parse(&[
        "aemet-sync",
        "aggregate",
        "--station",
        "0200E",
        "--start",
        "1980-01-01",
        "--end",
        "1980-07-01",
    ]) {
        CliCommand::Aggregate { station, .. } => assert_eq!(station, "0200E"),
        _ => panic!("expected Aggregate"),
    }
}

#[test]
fn cli_parse_status() {
    match parse(&["aemet-sync", "status"]) {
        CliCommand::Status => {}
        _ => panic!("expected Status"),
    }
}

#[test]
fn cli_rejects_bad_input() {
    // batch needs at least one station
    assert!(Cli::try_parse_from([
        "aemet-sync", "batch", "--start", "1980-01-01", "--end", "1980-07-01"
    ])
    .is_err());
    assert!(Cli::try_parse_from([
        "aemet-sync", "fetch", "--station", "0200E", "--start", "1980-13-01", "--end", "1980-07-01"
    ])
    .is_err());
    assert!(Cli::try_parse_from(["aemet-sync", "fetch", "--station", "0200E"]).is_err());
}

#[test]
fn window_uses_config_chunk_size() {
    let cfg = AemetConfig {
        chunk_months: 6,
        ..AemetConfig::default()
    };
    let window = WindowArgs {
        start: d(1980, 1, 1),
        end: d(1981, 1, 1),
        months: None,
    };
    assert_eq!(window.request("0200E", &cfg).unwrap().months, 6);

    let explicit = WindowArgs {
        months: Some(1),
        ..window.clone()
    };
    assert_eq!(explicit.request("0200E", &cfg).unwrap().months, 1);

    let reversed = WindowArgs {
        start: d(1981, 1, 1),
        end: d(1980, 1, 1),
        months: None,
    };
    assert!(matches!(
        reversed.request("0200E", &cfg),
        Err(ConfigError::InvalidRange { .. })
    ));
}

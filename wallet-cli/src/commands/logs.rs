//! Logs command - inspect the wallet's operational event log
//!
//! Every wallet command records one event in logs.duckdb: `command_executed`
//! on success, `<command>_failed` with an error kind otherwise. These
//! subcommands answer "what failed, and why" without exposing amounts.

use anyhow::{bail, Result};
use chrono::{Duration, TimeZone, Utc};
use clap::{Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::Confirm;
use wallet_core::services::{EntryPoint, LogEntry, LogFilter, LoggingService};
use wallet_core::ErrorKind;

use super::get_wallet_dir;
use crate::output;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recorded wallet events, newest first
    Show {
        /// Only events from this wallet command (e.g. purchase, register)
        #[arg(long)]
        command: Option<String>,
        /// Only failures of this kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        /// Only failed operations
        #[arg(long)]
        failures: bool,
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Count failures per command and error kind
    Failures {
        /// Look back this many days
        #[arg(long, default_value = "7")]
        days: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Drop events older than the retention window
    Prune {
        /// Keep events from the last N days
        #[arg(long, default_value = "30")]
        keep_days: u32,
        /// Do not ask for confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Error kinds accepted by `--kind`
#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum KindArg {
    InvalidInput,
    NotFound,
    Conflict,
    InsufficientFunds,
    Unauthorized,
    StorageFailure,
}

impl From<KindArg> for ErrorKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::InvalidInput => ErrorKind::InvalidInput,
            KindArg::NotFound => ErrorKind::NotFound,
            KindArg::Conflict => ErrorKind::Conflict,
            KindArg::InsufficientFunds => ErrorKind::InsufficientFunds,
            KindArg::Unauthorized => ErrorKind::Unauthorized,
            KindArg::StorageFailure => ErrorKind::StorageFailure,
        }
    }
}

pub fn run(command: LogsCommands) -> Result<()> {
    let service = open_log()?;
    match command {
        LogsCommands::Show {
            command,
            kind,
            failures,
            limit,
            json,
        } => show(&service, build_filter(command, kind, failures, limit), json),
        LogsCommands::Failures { days, json } => failures(&service, days, json),
        LogsCommands::Prune { keep_days, yes } => prune(&service, keep_days, yes),
    }
}

fn open_log() -> Result<LoggingService> {
    let wallet_dir = get_wallet_dir()?;
    if !wallet_dir.exists() {
        bail!("No wallet found at {}", wallet_dir.display());
    }
    LoggingService::new(&wallet_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn build_filter(
    command: Option<String>,
    kind: Option<KindArg>,
    failures: bool,
    limit: usize,
) -> LogFilter {
    let mut filter = LogFilter::new(limit);
    if let Some(command) = command {
        filter = filter.command(command);
    }
    if let Some(kind) = kind {
        filter = filter.error_kind(ErrorKind::from(kind).as_str());
    }
    if failures {
        filter = filter.failures_only();
    }
    filter
}

fn show(service: &LoggingService, filter: LogFilter, json: bool) -> Result<()> {
    let events = service.find(&filter)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&events)?);
        return Ok(());
    }
    if events.is_empty() {
        output::info("No matching events.");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["When", "Command", "Outcome", "Detail"]);
    for event in &events {
        table.add_row(vec![
            local_time(event.timestamp),
            event.command.clone().unwrap_or_else(|| "-".to_string()),
            outcome(event),
            event.error_message.clone().unwrap_or_default(),
        ]);
    }
    println!("{}", table);
    Ok(())
}

fn outcome(event: &LogEntry) -> String {
    match &event.error_kind {
        Some(kind) => kind.red().to_string(),
        None if event.event == "command_executed" => "ok".green().to_string(),
        None => event.event.clone(),
    }
}

fn failures(service: &LoggingService, days: u32, json: bool) -> Result<()> {
    let since = Utc::now() - Duration::days(i64::from(days));
    let counts = service.failure_breakdown(since.timestamp_millis())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
        return Ok(());
    }
    if counts.is_empty() {
        output::success(&format!("No failures in the last {} days.", days));
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Command", "Kind", "Count", "Last seen"]);
    for row in &counts {
        table.add_row(vec![
            row.command.clone().unwrap_or_else(|| "-".to_string()),
            row.error_kind.clone(),
            row.count.to_string(),
            local_time(row.last_seen),
        ]);
    }
    println!("{}", table);

    let total: u64 = counts.iter().map(|c| c.count).sum();
    output::info(&format!("{} failures in the last {} days", total, days));
    Ok(())
}

fn prune(service: &LoggingService, keep_days: u32, yes: bool) -> Result<()> {
    if !yes {
        if atty::isnt(atty::Stream::Stdin) {
            bail!("Pruning needs confirmation; pass --yes when not running interactively.");
        }
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Remove events older than {} days from {}?",
                keep_days,
                service.db_path().display()
            ))
            .default(false)
            .interact()?;
        if !confirmed {
            output::warning("Nothing removed.");
            return Ok(());
        }
    }

    let cutoff = Utc::now() - Duration::days(i64::from(keep_days));
    let removed = service.delete_before(cutoff.timestamp_millis())?;
    let remaining = service.count()?;
    output::success(&format!("Removed {} events, {} kept.", removed, remaining));
    Ok(())
}

fn local_time(timestamp_ms: i64) -> String {
    chrono::Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

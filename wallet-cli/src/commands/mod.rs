//! CLI command implementations

pub mod logs;
pub mod player;
pub mod transaction;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use dialoguer::Password;
use serde::Serialize;
use wallet_core::services::{EntryPoint, LogEvent, LoggingService};
use wallet_core::{Error, OperationResult, WalletContext};

use crate::output;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let wallet_dir = get_wallet_dir().ok()?;
    std::fs::create_dir_all(&wallet_dir).ok()?;
    LoggingService::new(&wallet_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        if let Err(e) = l.log(event) {
            log::debug!("event log write failed: {}", e);
        }
    }
}

/// Wallet directory from WALLET_DIR or ~/.wallet
pub fn get_wallet_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("WALLET_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".wallet"))
        .ok_or_else(|| anyhow!("Could not find home directory; set WALLET_DIR"))
}

/// Open the wallet, creating its directory on first use
pub fn get_context() -> Result<WalletContext> {
    let wallet_dir = get_wallet_dir()?;
    std::fs::create_dir_all(&wallet_dir)
        .with_context(|| format!("Failed to create wallet directory: {:?}", wallet_dir))?;

    WalletContext::new(&wallet_dir).context("Failed to open wallet")
}

/// Use the password from --password / WALLET_PASSWORD, or prompt for it
pub fn get_password_or_prompt(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }

    if atty::isnt(atty::Stream::Stdin) {
        anyhow::bail!("No password provided. Use --password or WALLET_PASSWORD.");
    }

    Ok(Password::new().with_prompt(prompt).interact()?)
}

/// Record the outcome of a wallet operation and render it.
///
/// `--json` prints the `OperationResult` envelope; otherwise `render` prints
/// the success value. Failures exit non-zero in both modes.
pub fn finish<T: Serialize + Clone>(
    command: &str,
    result: wallet_core::domain::Result<T>,
    json: bool,
    render: impl FnOnce(&T),
) -> Result<()> {
    let logger = get_logger();

    match &result {
        Ok(_) => log_event(&logger, LogEvent::new("command_executed").with_command(command)),
        Err(e) => log_event(
            &logger,
            LogEvent::new(format!("{}_failed", command))
                .with_command(command)
                .with_error(e),
        ),
    }

    if json {
        let envelope = OperationResult::from(result.clone());
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return result.map(|_| ()).map_err(into_reported);
    }

    match result {
        Ok(value) => {
            render(&value);
            Ok(())
        }
        Err(e) => {
            if e.is_retryable() {
                output::warning("Storage is temporarily unavailable; the operation can be retried.");
            }
            Err(into_reported(e))
        }
    }
}

fn into_reported(error: Error) -> anyhow::Error {
    anyhow!("{} ({})", error, error.kind().as_str())
}

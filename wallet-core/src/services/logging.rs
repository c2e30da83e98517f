//! Logging service - structured event logging to DuckDB
//!
//! Stores operational events in logs.duckdb. Events carry a name, the
//! command that produced them and, for failures, the error kind and message.
//! Amounts, balances, usernames and secrets are never logged.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use chrono::Utc;
use duckdb::Connection;
use serde::{Deserialize, Serialize};

use crate::domain::Error;
use crate::migrations::EVENT_LOG_MIGRATIONS;
use crate::services::migration::MigrationService;

/// Counter for generating unique IDs within the same millisecond
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a unique ID based on timestamp + counter
fn generate_id() -> u64 {
    // Lower 16 bits: counter (65536 unique IDs per millisecond)
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed) & 0xFFFF;
    ((now_ms() as u64) << 16) | counter
}

/// Current unix timestamp in milliseconds
fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn detect_platform() -> &'static str {
    if cfg!(target_os = "macos") {
        "macos"
    } else if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else {
        "unknown"
    }
}

/// Where an event originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryPoint {
    Cli,
    Embedded,
}

impl EntryPoint {
    fn as_str(&self) -> &'static str {
        match self {
            EntryPoint::Cli => "cli",
            EntryPoint::Embedded => "embedded",
        }
    }
}

/// A log event to be recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl LogEvent {
    pub fn new(event: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            command: None,
            error_kind: None,
            error_message: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attach a ledger error.
    ///
    /// Only the kind and a fixed message are kept. Amounts, balances,
    /// usernames and caller-supplied ids stay out of the log; storage
    /// failures keep the failing operation name.
    pub fn with_error(mut self, error: &Error) -> Self {
        let message = match error {
            Error::InvalidAmount(_) => "Invalid amount".to_string(),
            Error::Validation(_) => "Validation error".to_string(),
            Error::AccountNotFound(_) => "Account not found".to_string(),
            Error::UsernameTaken(_) => "Username already taken".to_string(),
            Error::DuplicateTransaction(_) => "Transaction already recorded".to_string(),
            Error::InsufficientFunds { .. } => "Insufficient funds".to_string(),
            Error::InvalidCredentials | Error::Storage(_) => error.to_string(),
        };
        self.error_kind = Some(error.kind().as_str().to_string());
        self.error_message = Some(message);
        self
    }
}

/// A log entry as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: u64,
    pub timestamp: i64,
    pub entry_point: String,
    pub app_version: String,
    pub platform: String,
    pub event: String,
    pub command: Option<String>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
}

impl LogEntry {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            timestamp: row.get(1)?,
            entry_point: row.get(2)?,
            app_version: row.get(3)?,
            platform: row.get(4)?,
            event: row.get(5)?,
            command: row.get(6)?,
            error_kind: row.get(7)?,
            error_message: row.get(8)?,
        })
    }
}

/// Conditions for [`LoggingService::find`]
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub command: Option<String>,
    pub error_kind: Option<String>,
    pub failures_only: bool,
    pub limit: usize,
}

impl LogFilter {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Self::default()
        }
    }

    pub fn command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    pub fn error_kind(mut self, kind: impl Into<String>) -> Self {
        self.error_kind = Some(kind.into());
        self
    }

    pub fn failures_only(mut self) -> Self {
        self.failures_only = true;
        self
    }
}

/// How often one command failed with one error kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureCount {
    pub command: Option<String>,
    pub error_kind: String,
    pub count: u64,
    /// Unix ms of the latest occurrence
    pub last_seen: i64,
}

const LOG_COLUMNS: &str = "id, timestamp, entry_point, app_version, platform, \
                           event, command, error_kind, error_message";

/// Service for structured event logging
pub struct LoggingService {
    conn: Mutex<Connection>,
    db_path: PathBuf,
    entry_point: EntryPoint,
    app_version: String,
    platform: &'static str,
}

impl LoggingService {
    /// Open or create logs.duckdb in the wallet directory and run any
    /// pending event-log migrations.
    pub fn new(
        wallet_dir: &Path,
        entry_point: EntryPoint,
        app_version: impl Into<String>,
    ) -> Result<Self> {
        let db_path = wallet_dir.join("logs.duckdb");
        let conn = Connection::open(&db_path)?;
        MigrationService::with_set(&conn, EVENT_LOG_MIGRATIONS).run_pending()?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path,
            entry_point,
            app_version: app_version.into(),
            platform: detect_platform(),
        })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| anyhow!("Lock poisoned: {}", e))
    }

    /// Record an event. Entry point, app version and platform come from
    /// the service.
    pub fn log(&self, event: LogEvent) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO sys_logs (
                id, timestamp, entry_point, app_version, platform,
                event, command, error_kind, error_message
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            duckdb::params![
                generate_id(),
                now_ms(),
                self.entry_point.as_str(),
                &self.app_version,
                self.platform,
                &event.event,
                &event.command,
                &event.error_kind,
                &event.error_message,
            ],
        )?;
        Ok(())
    }

    pub fn log_event(&self, event: &str) -> Result<()> {
        self.log(LogEvent::new(event))
    }

    /// Log a CLI command execution
    pub fn log_command(&self, command: &str) -> Result<()> {
        self.log(LogEvent::new("command_executed").with_command(command))
    }

    /// Log a failed ledger or registry operation
    pub fn log_error(&self, event: &str, command: &str, error: &Error) -> Result<()> {
        self.log(LogEvent::new(event).with_command(command).with_error(error))
    }

    /// Most recent entries, newest first
    pub fn get_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.find(&LogFilter::new(limit))
    }

    /// Most recent entries that carry an error
    pub fn get_errors(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.find(&LogFilter::new(limit).failures_only())
    }

    /// Entries matching every condition in the filter, newest first
    pub fn find(&self, filter: &LogFilter) -> Result<Vec<LogEntry>> {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Box<dyn duckdb::ToSql>> = Vec::new();

        if let Some(command) = &filter.command {
            conditions.push("command = ?");
            params.push(Box::new(command.clone()));
        }
        if let Some(kind) = &filter.error_kind {
            conditions.push("error_kind = ?");
            params.push(Box::new(kind.clone()));
        }
        if filter.failures_only {
            conditions.push("error_kind IS NOT NULL");
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let sql = format!(
            "SELECT {} FROM sys_logs {} ORDER BY timestamp DESC, id DESC LIMIT ?",
            LOG_COLUMNS, where_clause
        );
        params.push(Box::new(filter.limit as i64));
        let param_refs: Vec<&dyn duckdb::ToSql> = params.iter().map(|b| b.as_ref()).collect();

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(param_refs.as_slice(), LogEntry::from_row)?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Failures since `since_ms`, counted per command and error kind,
    /// most frequent first
    pub fn failure_breakdown(&self, since_ms: i64) -> Result<Vec<FailureCount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT command, error_kind, COUNT(*), MAX(timestamp) FROM sys_logs
             WHERE error_kind IS NOT NULL AND timestamp >= ?
             GROUP BY command, error_kind
             ORDER BY COUNT(*) DESC, command, error_kind",
        )?;
        let rows = stmt.query_map([since_ms], |row| {
            Ok(FailureCount {
                command: row.get(0)?,
                error_kind: row.get(1)?,
                count: row.get(2)?,
                last_seen: row.get(3)?,
            })
        })?;

        let mut counts = Vec::new();
        for row in rows {
            counts.push(row?);
        }
        Ok(counts)
    }

    pub fn count(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM sys_logs", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Delete logs older than the given unix timestamp (ms)
    pub fn delete_before(&self, timestamp_ms: i64) -> Result<u64> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM sys_logs WHERE timestamp < ?", [timestamp_ms])?;
        Ok(deleted as u64)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

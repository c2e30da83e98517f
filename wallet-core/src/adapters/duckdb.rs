//! DuckDB storage adapter
//!
//! One database instance, many connections: every unit of work checks out
//! a connection cloned from the root connection and runs inside its own
//! DuckDB transaction. Account rows are locked through an in-process
//! [`RowLocks`] table before the transaction opens, so a unit's snapshot
//! always includes every commit made by the previous holder of the row.

use std::ops::Deref;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, Utc};
use duckdb::{params, Connection};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::row_lock::{HeldRows, RowLocks};
use crate::domain::result::{Error, Result};
use crate::domain::{Account, EntryKind, LedgerEntry};
use crate::ports::{AccountStore, LedgerStore};
use crate::services::{MigrationResult, MigrationService};

/// Maximum number of retries when database file is locked
const MAX_RETRIES: u32 = 5;

/// Initial retry delay in milliseconds (doubles each retry: 50, 100, 200, 400, 800ms)
const INITIAL_RETRY_DELAY_MS: u64 = 50;

/// Idle connections kept for reuse when no limit is configured
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 8;

const ENTRY_COLUMNS: &str =
    "transaction_id, account_id, kind, amount::VARCHAR, applied_at";

const ACCOUNT_COLUMNS: &str =
    "account_id, username, password_hash, display_name, balance::VARCHAR, created_at";

/// Check if an error message indicates a file locking issue that should be retried
fn is_retryable_error(err_msg: &str) -> bool {
    let lower = err_msg.to_lowercase();
    // Windows error messages
    lower.contains("being used by another process")
        || lower.contains("cannot access the file")
        // Unix/macOS error messages
        || lower.contains("resource temporarily unavailable")
        || lower.contains("database is locked")
        || lower.contains("file is already open")
        || lower.contains("could not set lock on file")
}

/// Primary key or unique index collision
fn is_constraint_violation(err: &duckdb::Error) -> bool {
    let lower = err.to_string().to_lowercase();
    lower.contains("duplicate key")
        || lower.contains("violates primary key")
        || lower.contains("violates unique constraint")
        || lower.contains("unique constraint violation")
        // Concurrent inserts of the same key surface at commit
        || lower.contains("write-write conflict on key")
}

/// Log the driver error and keep only the failing operation in the returned error
fn storage_failure(operation: &'static str, err: duckdb::Error) -> Error {
    log::error!("duckdb {} failed: {}", operation, err);
    Error::storage(operation)
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::storage("decode timestamp"))
}

/// Decode a `DECIMAL(38, 2)` rendered as text.
///
/// DuckDB always prints both fractional digits; trailing zeros are dropped
/// first so whole values near the 96-bit limit still decode exactly.
fn parse_decimal(s: &str) -> Result<Decimal> {
    let trimmed = match s.find('.') {
        Some(_) => s.trim_end_matches('0').trim_end_matches('.'),
        None => s,
    };
    Decimal::from_str_exact(trimmed).map_err(|_| Error::storage("decode decimal"))
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| Error::storage("decode account id"))
}

/// Connections cloned from one root connection, reused across units
struct ConnectionPool {
    root: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
}

impl ConnectionPool {
    fn checkout(self: &Arc<Self>) -> Result<PooledConnection> {
        let reused = self
            .idle
            .lock()
            .map_err(|_| Error::storage("connection pool lock poisoned"))?
            .pop();

        let conn = match reused {
            Some(conn) => conn,
            None => {
                let root = self
                    .root
                    .lock()
                    .map_err(|_| Error::storage("connection pool lock poisoned"))?;
                root.try_clone()
                    .map_err(|e| storage_failure("open connection", e))?
            }
        };

        Ok(PooledConnection {
            conn: Some(conn),
            pool: Arc::clone(self),
            broken: false,
        })
    }

    fn give_back(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(conn);
            }
        }
    }
}

/// A checked-out connection, returned to the pool on drop unless broken
pub struct PooledConnection {
    conn: Option<Connection>,
    pool: Arc<ConnectionPool>,
    broken: bool,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("pooled connection is present until drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if !self.broken {
                self.pool.give_back(conn);
            }
        }
    }
}

/// Unit of work for [`DuckDbStore`]
///
/// Field order matters: the transaction is rolled back in `Drop`, then the
/// connection returns to the pool, then the row locks are released.
pub struct DuckDbUnit {
    conn: PooledConnection,
    rows: HeldRows,
    open: bool,
    appended: Vec<String>,
}

impl DuckDbUnit {
    fn lock_row(&mut self, locks: &Arc<RowLocks>, account_id: Uuid) -> Result<()> {
        if self.rows.lock(locks, account_id) && self.open {
            // Snapshot predates this lock; DuckDB's write-write conflict check still guards the row.
            log::debug!("row {} locked after unit opened", account_id);
        }
        self.ensure_open()
    }

    fn ensure_open(&mut self) -> Result<()> {
        if !self.open {
            self.conn
                .execute_batch("BEGIN TRANSACTION")
                .map_err(|e| storage_failure("begin unit", e))?;
            self.open = true;
        }
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        if let Err(e) = self.conn.execute_batch("ROLLBACK") {
            self.conn.broken = true;
            return Err(storage_failure("abort unit", e));
        }
        Ok(())
    }
}

impl Drop for DuckDbUnit {
    fn drop(&mut self) {
        if self.open {
            log::warn!("unit dropped without commit, rolling back");
            let _ = self.rollback();
        }
    }
}

/// DuckDB-backed account store and transaction log
pub struct DuckDbStore {
    pool: Arc<ConnectionPool>,
    locks: Arc<RowLocks>,
}

impl DuckDbStore {
    /// Open (or create) the database file and run pending migrations
    ///
    /// Includes retry logic with exponential backoff for file locking errors,
    /// which occur while another process still holds the database file.
    pub fn open(db_path: &Path, max_idle_connections: usize) -> anyhow::Result<Self> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            match Self::try_open_connection(db_path) {
                Ok(conn) => return Self::from_connection(conn, max_idle_connections),
                Err(e) => {
                    let err_msg = e.to_string();
                    if is_retryable_error(&err_msg) && attempt < MAX_RETRIES - 1 {
                        // Exponential backoff: 50ms, 100ms, 200ms, 400ms
                        let delay =
                            Duration::from_millis(INITIAL_RETRY_DELAY_MS * 2u64.pow(attempt));
                        log::warn!(
                            "database busy, retrying in {}ms (attempt {}/{}): {}",
                            delay.as_millis(),
                            attempt + 1,
                            MAX_RETRIES,
                            err_msg
                        );
                        thread::sleep(delay);
                        last_error = Some(e);
                        continue;
                    }
                    // Non-retryable error or max retries reached
                    return Err(e);
                }
            }
        }

        // Should only reach here if all retries failed
        Err(last_error
            .unwrap_or_else(|| anyhow!("Failed to open database after {} retries", MAX_RETRIES)))
    }

    /// Volatile database, mainly for tests and embedding
    pub fn open_in_memory(max_idle_connections: usize) -> anyhow::Result<Self> {
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        let conn = Connection::open_in_memory_with_flags(config)?;
        Self::from_connection(conn, max_idle_connections)
    }

    fn try_open_connection(db_path: &Path) -> anyhow::Result<Connection> {
        // Disable extension autoloading; nothing here needs extensions
        let config = duckdb::Config::default().enable_autoload_extension(false)?;
        Ok(Connection::open_with_flags(db_path, config)?)
    }

    fn from_connection(conn: Connection, max_idle_connections: usize) -> anyhow::Result<Self> {
        let result = MigrationService::new(&conn).run_pending()?;
        if !result.applied.is_empty() {
            log::info!("applied migrations: {}", result.applied.join(", "));
        }

        Ok(Self {
            pool: Arc::new(ConnectionPool {
                root: Mutex::new(conn),
                idle: Mutex::new(Vec::new()),
                max_idle: max_idle_connections,
            }),
            locks: RowLocks::new(),
        })
    }

    /// Run any migrations that are not yet applied
    pub fn run_migrations(&self) -> anyhow::Result<MigrationResult> {
        let conn = self
            .pool
            .root
            .lock()
            .map_err(|e| anyhow!("Lock poisoned: {}", e))?;
        MigrationService::new(&conn).run_pending()
    }

    /// Total committed ledger entries across all accounts
    pub fn count_entries(&self) -> Result<u64> {
        let conn = self.pool.checkout()?;
        conn.query_row("SELECT COUNT(*) FROM ledger_entries", [], |row| row.get(0))
            .map_err(|e| storage_failure("count entries", e))
    }

    fn query_account(&self, filter: &str, value: &str) -> Result<Option<Account>> {
        let conn = self.pool.checkout()?;
        let sql = format!("SELECT {} FROM accounts WHERE {} = ?", ACCOUNT_COLUMNS, filter);
        let raw = conn.query_row(&sql, [value], |row| {
            Ok(RawAccount {
                id: row.get(0)?,
                username: row.get(1)?,
                credential_hash: row.get(2)?,
                display_name: row.get(3)?,
                balance: row.get(4)?,
                created_at: row.get(5)?,
            })
        });

        match raw {
            Ok(raw) => raw.into_account().map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_failure("read account", e)),
        }
    }
}

/// Account row as read from DuckDB, before decoding
struct RawAccount {
    id: String,
    username: String,
    credential_hash: String,
    display_name: String,
    balance: String,
    created_at: String,
}

impl RawAccount {
    fn into_account(self) -> Result<Account> {
        Ok(Account {
            id: parse_uuid(&self.id)?,
            username: self.username,
            credential_hash: self.credential_hash,
            display_name: self.display_name,
            balance: parse_decimal(&self.balance)?,
            created_at: parse_timestamp(&self.created_at)?,
        })
    }
}

/// Ledger row as read from DuckDB, before decoding
struct RawEntry {
    transaction_id: String,
    account_id: String,
    kind: String,
    amount: String,
    applied_at: String,
}

impl RawEntry {
    fn from_row(row: &duckdb::Row) -> duckdb::Result<Self> {
        Ok(Self {
            transaction_id: row.get(0)?,
            account_id: row.get(1)?,
            kind: row.get(2)?,
            amount: row.get(3)?,
            applied_at: row.get(4)?,
        })
    }

    fn into_entry(self) -> Result<LedgerEntry> {
        Ok(LedgerEntry {
            transaction_id: self.transaction_id,
            account_id: parse_uuid(&self.account_id)?,
            kind: self
                .kind
                .parse::<EntryKind>()
                .map_err(|_| Error::storage("decode entry kind"))?,
            amount: parse_decimal(&self.amount)?,
            applied_at: parse_timestamp(&self.applied_at)?,
        })
    }
}

impl LedgerStore for DuckDbStore {
    type Unit = DuckDbUnit;

    fn begin_unit(&self) -> Result<DuckDbUnit> {
        // The DuckDB transaction opens lazily, after the first row lock.
        Ok(DuckDbUnit {
            conn: self.pool.checkout()?,
            rows: HeldRows::default(),
            open: false,
            appended: Vec::new(),
        })
    }

    fn read_balance(&self, unit: &mut DuckDbUnit, account_id: Uuid) -> Result<Option<Decimal>> {
        unit.lock_row(&self.locks, account_id)?;
        let balance = unit.conn.query_row(
            "SELECT balance::VARCHAR FROM accounts WHERE account_id = ?",
            [account_id.to_string()],
            |row| row.get::<_, String>(0),
        );

        match balance {
            Ok(raw) => parse_decimal(&raw).map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_failure("read balance", e)),
        }
    }

    fn write_balance(&self, unit: &mut DuckDbUnit, account_id: Uuid, balance: Decimal) -> Result<()> {
        unit.lock_row(&self.locks, account_id)?;
        let updated = unit
            .conn
            .execute(
                "UPDATE accounts SET balance = CAST(? AS DECIMAL(38, 2)) WHERE account_id = ?",
                params![balance.to_string(), account_id.to_string()],
            )
            .map_err(|e| storage_failure("write balance", e))?;

        if updated == 0 {
            return Err(Error::AccountNotFound(account_id));
        }
        Ok(())
    }

    fn append_entry(&self, unit: &mut DuckDbUnit, entry: &LedgerEntry) -> Result<()> {
        unit.ensure_open()?;
        unit.conn
            .execute(
                "INSERT INTO ledger_entries (transaction_id, account_id, kind, amount, applied_at)
                 VALUES (?, ?, ?, CAST(? AS DECIMAL(38, 2)), ?)",
                params![
                    entry.transaction_id,
                    entry.account_id.to_string(),
                    entry.kind.as_str(),
                    entry.amount.to_string(),
                    format_timestamp(&entry.applied_at),
                ],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    Error::DuplicateTransaction(entry.transaction_id.clone())
                } else {
                    storage_failure("append entry", e)
                }
            })?;

        unit.appended.push(entry.transaction_id.clone());
        Ok(())
    }

    fn find_entry(&self, unit: &mut DuckDbUnit, transaction_id: &str) -> Result<Option<LedgerEntry>> {
        unit.ensure_open()?;
        let sql = format!(
            "SELECT {} FROM ledger_entries WHERE transaction_id = ?",
            ENTRY_COLUMNS
        );
        match unit.conn.query_row(&sql, [transaction_id], RawEntry::from_row) {
            Ok(raw) => raw.into_entry().map(Some),
            Err(duckdb::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_failure("find entry", e)),
        }
    }

    fn commit(&self, mut unit: DuckDbUnit) -> Result<()> {
        if !unit.open {
            return Ok(());
        }
        // On failure the unit stays open and its Drop rolls back.
        unit.conn.execute_batch("COMMIT").map_err(|e| {
            if is_constraint_violation(&e) {
                Error::DuplicateTransaction(unit.appended.join(", "))
            } else {
                storage_failure("commit unit", e)
            }
        })?;
        unit.open = false;
        Ok(())
    }

    fn abort(&self, mut unit: DuckDbUnit) -> Result<()> {
        unit.rollback()
    }

    fn list_entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let conn = self.pool.checkout()?;
        let sql = format!(
            "SELECT {} FROM ledger_entries WHERE account_id = ?
             ORDER BY seq",
            ENTRY_COLUMNS
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| storage_failure("list entries", e))?;
        let rows = stmt
            .query_map([account_id.to_string()], RawEntry::from_row)
            .map_err(|e| storage_failure("list entries", e))?;

        let mut entries = Vec::new();
        for raw in rows {
            let raw = raw.map_err(|e| storage_failure("list entries", e))?;
            entries.push(raw.into_entry()?);
        }
        Ok(entries)
    }
}

impl AccountStore for DuckDbStore {
    fn insert_account(&self, account: &Account) -> Result<()> {
        let conn = self.pool.checkout()?;
        conn.execute(
            "INSERT INTO accounts (account_id, username, password_hash, display_name, balance, created_at)
             VALUES (?, ?, ?, ?, CAST(? AS DECIMAL(38, 2)), ?)",
            params![
                account.id.to_string(),
                account.username,
                account.credential_hash,
                account.display_name,
                account.balance.to_string(),
                format_timestamp(&account.created_at),
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                Error::UsernameTaken(account.username.clone())
            } else {
                storage_failure("insert account", e)
            }
        })?;
        Ok(())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.query_account("username", username)
    }

    fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.query_account("account_id", &id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MAX_MONEY;

    fn store() -> DuckDbStore {
        DuckDbStore::open_in_memory(DEFAULT_MAX_IDLE_CONNECTIONS).unwrap()
    }

    fn seeded(store: &DuckDbStore, balance: i64) -> Uuid {
        let account = Account::new("alice", "hash", "Alice", Decimal::new(balance, 0));
        store.insert_account(&account).unwrap();
        account.id
    }

    #[test]
    fn test_account_round_trip() {
        let store = store();
        let account = Account::new("alice", "$argon2id$x", "Alice", Decimal::new(10050, 2));
        store.insert_account(&account).unwrap();

        let loaded = store.get_account(account.id).unwrap().unwrap();
        assert_eq!(loaded.username, "alice");
        assert_eq!(loaded.credential_hash, "$argon2id$x");
        assert_eq!(loaded.balance, Decimal::new(10050, 2));

        let by_name = store.find_by_username("alice").unwrap().unwrap();
        assert_eq!(by_name.id, account.id);
        assert!(store.find_by_username("Alice").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_conflict() {
        let store = store();
        seeded(&store, 1);
        let dup = Account::new("alice", "hash", "Imposter", Decimal::ONE);
        assert_eq!(
            store.insert_account(&dup).unwrap_err(),
            Error::UsernameTaken("alice".to_string())
        );
    }

    #[test]
    fn test_unit_commit_persists_both_writes() {
        let store = store();
        let id = seeded(&store, 100);

        let mut unit = store.begin_unit().unwrap();
        assert_eq!(store.read_balance(&mut unit, id).unwrap(), Some(Decimal::new(100, 0)));
        store.write_balance(&mut unit, id, Decimal::new(70, 0)).unwrap();
        store
            .append_entry(&mut unit, &LedgerEntry::new("t1", id, EntryKind::Purchase, Decimal::new(30, 0)))
            .unwrap();
        store.commit(unit).unwrap();

        assert_eq!(store.get_account(id).unwrap().unwrap().balance, Decimal::new(70, 0));
        let entries = store.list_entries(id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Purchase);
        assert_eq!(entries[0].amount, Decimal::new(30, 0));
    }

    #[test]
    fn test_abort_rolls_back_staged_writes() {
        let store = store();
        let id = seeded(&store, 100);

        let mut unit = store.begin_unit().unwrap();
        store.read_balance(&mut unit, id).unwrap();
        store.write_balance(&mut unit, id, Decimal::new(5, 0)).unwrap();
        store
            .append_entry(&mut unit, &LedgerEntry::new("t1", id, EntryKind::Purchase, Decimal::new(95, 0)))
            .unwrap();
        store.abort(unit).unwrap();

        assert_eq!(store.get_account(id).unwrap().unwrap().balance, Decimal::new(100, 0));
        assert_eq!(store.count_entries().unwrap(), 0);
    }

    #[test]
    fn test_dropped_unit_rolls_back() {
        let store = store();
        let id = seeded(&store, 100);
        {
            let mut unit = store.begin_unit().unwrap();
            store.read_balance(&mut unit, id).unwrap();
            store.write_balance(&mut unit, id, Decimal::new(1, 0)).unwrap();
        }
        assert_eq!(store.get_account(id).unwrap().unwrap().balance, Decimal::new(100, 0));

        // Row lock was released with the unit
        let mut unit = store.begin_unit().unwrap();
        assert_eq!(store.read_balance(&mut unit, id).unwrap(), Some(Decimal::new(100, 0)));
        store.abort(unit).unwrap();
    }

    #[test]
    fn test_negative_balance_rejected_by_storage() {
        let store = store();
        let id = seeded(&store, 10);
        let mut unit = store.begin_unit().unwrap();
        store.read_balance(&mut unit, id).unwrap();
        let err = store.write_balance(&mut unit, id, Decimal::new(-1, 0)).unwrap_err();
        assert_eq!(err, Error::storage("write balance"));
        store.abort(unit).unwrap();
    }

    #[test]
    fn test_duplicate_transaction_id_rejected() {
        let store = store();
        let id = seeded(&store, 10);
        let entry = LedgerEntry::new("t1", id, EntryKind::Win, Decimal::ONE);

        let mut unit = store.begin_unit().unwrap();
        store.append_entry(&mut unit, &entry).unwrap();
        store.commit(unit).unwrap();

        let mut unit = store.begin_unit().unwrap();
        let err = store.append_entry(&mut unit, &entry).unwrap_err();
        assert_eq!(err, Error::DuplicateTransaction("t1".to_string()));
        store.abort(unit).unwrap();

        let mut unit = store.begin_unit().unwrap();
        let found = store.find_entry(&mut unit, "t1").unwrap().unwrap();
        assert!(found.matches(id, EntryKind::Win, Decimal::ONE));
        store.abort(unit).unwrap();
    }

    #[test]
    fn test_missing_account() {
        let store = store();
        let missing = Uuid::new_v4();
        let mut unit = store.begin_unit().unwrap();
        assert_eq!(store.read_balance(&mut unit, missing).unwrap(), None);
        assert_eq!(
            store.write_balance(&mut unit, missing, Decimal::ONE).unwrap_err(),
            Error::AccountNotFound(missing)
        );
        store.abort(unit).unwrap();
        assert!(store.get_account(missing).unwrap().is_none());
    }

    #[test]
    fn test_max_money_survives_round_trip() {
        let store = store();
        let id = seeded(&store, 1);
        let amount = MAX_MONEY - Decimal::ONE;

        let mut unit = store.begin_unit().unwrap();
        store.read_balance(&mut unit, id).unwrap();
        store.write_balance(&mut unit, id, MAX_MONEY).unwrap();
        store
            .append_entry(&mut unit, &LedgerEntry::new("big", id, EntryKind::Win, amount))
            .unwrap();
        store.commit(unit).unwrap();

        let mut unit = store.begin_unit().unwrap();
        assert_eq!(store.read_balance(&mut unit, id).unwrap(), Some(MAX_MONEY));
        let found = store.find_entry(&mut unit, "big").unwrap().unwrap();
        assert_eq!(found.amount, amount);
        store.abort(unit).unwrap();

        assert_eq!(store.get_account(id).unwrap().unwrap().balance, MAX_MONEY);
        let entries = store.list_entries(id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].amount, amount);
    }

    #[test]
    fn test_large_whole_balance_round_trip() {
        // Printed with a ".00" suffix that alone would not fit the mantissa
        let whole = MAX_MONEY.trunc();
        let store = store();
        let account = Account::new("whale", "hash", "Whale", whole);
        store.insert_account(&account).unwrap();

        let loaded = store.find_by_username("whale").unwrap().unwrap();
        assert_eq!(loaded.balance, whole);

        let mut unit = store.begin_unit().unwrap();
        assert_eq!(store.read_balance(&mut unit, account.id).unwrap(), Some(whole));
        store.abort(unit).unwrap();
    }

    #[test]
    fn test_parse_decimal_drops_fraction_padding() {
        assert_eq!(parse_decimal("100.00").unwrap(), Decimal::new(100, 0));
        assert_eq!(parse_decimal("0.00").unwrap(), Decimal::ZERO);
        assert_eq!(parse_decimal("12.50").unwrap(), Decimal::new(125, 1));
        assert_eq!(parse_decimal("700").unwrap(), Decimal::new(700, 0));
        assert_eq!(
            parse_decimal("792281625142643375935439503.00").unwrap(),
            MAX_MONEY.trunc()
        );
        assert_eq!(parse_decimal("abc").unwrap_err(), Error::storage("decode decimal"));
    }

    #[test]
    fn test_entries_listed_in_insertion_order() {
        let store = store();
        let id = seeded(&store, 10);
        // Same timestamp, ids sorting opposite to insertion
        let first = LedgerEntry::new("zz", id, EntryKind::Win, Decimal::ONE);
        let second = LedgerEntry {
            transaction_id: "aa".to_string(),
            ..first.clone()
        };

        for entry in [&first, &second] {
            let mut unit = store.begin_unit().unwrap();
            store.read_balance(&mut unit, id).unwrap();
            store.append_entry(&mut unit, entry).unwrap();
            store.commit(unit).unwrap();
        }

        let ids: Vec<_> = store
            .list_entries(id)
            .unwrap()
            .into_iter()
            .map(|e| e.transaction_id)
            .collect();
        assert_eq!(ids, vec!["zz", "aa"]);
    }

    #[test]
    fn test_migrations_already_applied_on_open() {
        let store = store();
        let result = store.run_migrations().unwrap();
        assert!(result.applied.is_empty());
    }

    #[test]
    fn test_retryable_error_detection() {
        assert!(is_retryable_error("database is locked"));
        assert!(is_retryable_error("IO Error: Could not set lock on file \"wallet.duckdb\""));
        assert!(!is_retryable_error("Permission denied"));
    }
}

//! Database migrations - embedded SQL files
//!
//! Migrations are compiled into the binary at build time using include_str!.
//! Each set is a list of (name, sql_content) tuples applied in order; the
//! first entry of every set bootstraps `sys_migrations`.

/// A named, ordered list of migrations
pub type MigrationSet = &'static [(&'static str, &'static str)];

/// Name of the bootstrap migration shared by every set
pub const BOOTSTRAP: &str = "000_migrations.sql";

/// Wallet database: accounts and the transaction log.
///
/// IMPORTANT: When adding a new migration:
/// 1. Create the SQL file: NNN_description.sql
/// 2. Add an entry here in order
pub const MIGRATIONS: MigrationSet = &[
    (BOOTSTRAP, include_str!("000_migrations.sql")),
    ("001_accounts.sql", include_str!("001_accounts.sql")),
    ("002_ledger_entries.sql", include_str!("002_ledger_entries.sql")),
];

/// Operational event log database (`logs.duckdb`)
pub const EVENT_LOG_MIGRATIONS: MigrationSet = &[
    (BOOTSTRAP, include_str!("000_migrations.sql")),
    ("001_event_log.sql", include_str!("event_log/001_event_log.sql")),
];

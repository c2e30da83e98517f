//! Configuration management
//!
//! Reads `settings.json` from the wallet directory:
//! ```json
//! {
//!   "ledger": { "duplicateTransactions": "reject" },
//!   "passwordHashing": { "timeCost": 2, "memoryCost": 19456, "parallelism": 1 },
//!   "database": { "maxIdleConnections": 8 }
//! }
//! ```

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::adapters::duckdb::DEFAULT_MAX_IDLE_CONNECTIONS;
use crate::domain::Argon2Params;
use crate::services::DuplicatePolicy;

/// Environment override for the duplicate transaction policy
pub const DUPLICATE_POLICY_ENV: &str = "WALLET_DUPLICATE_POLICY";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    ledger: LedgerSettings,
    #[serde(default)]
    password_hashing: Argon2Params,
    #[serde(default)]
    database: DatabaseSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedgerSettings {
    #[serde(default)]
    duplicate_transactions: DuplicatePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatabaseSettings {
    #[serde(default = "default_max_idle")]
    max_idle_connections: usize,
}

fn default_max_idle() -> usize {
    DEFAULT_MAX_IDLE_CONNECTIONS
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            max_idle_connections: DEFAULT_MAX_IDLE_CONNECTIONS,
        }
    }
}

/// Wallet configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub duplicate_policy: DuplicatePolicy,
    pub password_hashing: Argon2Params,
    pub max_idle_connections: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_settings(SettingsFile::default())
    }
}

impl Config {
    /// Load config from the wallet directory
    ///
    /// A missing or malformed settings file falls back to defaults. The
    /// duplicate policy can be overridden with `WALLET_DUPLICATE_POLICY`.
    pub fn load(wallet_dir: &Path) -> Result<Self> {
        let settings_path = wallet_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!("ignoring malformed {}: {}", settings_path.display(), e);
                SettingsFile::default()
            })
        } else {
            SettingsFile::default()
        };

        let mut config = Self::from_settings(raw);
        config.apply_env_override(std::env::var(DUPLICATE_POLICY_ENV).ok().as_deref());
        Ok(config)
    }

    fn from_settings(raw: SettingsFile) -> Self {
        Self {
            duplicate_policy: raw.ledger.duplicate_transactions,
            password_hashing: raw.password_hashing,
            max_idle_connections: raw.database.max_idle_connections,
        }
    }

    fn apply_env_override(&mut self, value: Option<&str>) {
        let Some(value) = value else { return };
        match value.parse() {
            Ok(policy) => self.duplicate_policy = policy,
            Err(_) => log::warn!("ignoring {}={}", DUPLICATE_POLICY_ENV, value),
        }
    }
}

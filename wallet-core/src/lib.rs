//! Wallet Core - player wallet ledger
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core business entities (Account, LedgerEntry, errors, boundary values)
//! - **ports**: Trait definitions for storage (LedgerStore, AccountStore)
//! - **services**: Ledger engine, account registry, credentials, logging, migrations
//! - **adapters**: Concrete implementations (DuckDB, in-memory)

pub mod adapters;
pub mod config;
pub mod domain;
pub mod migrations;
pub mod ports;
pub mod services;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::DuckDbStore;
use config::Config;
use domain::requests::parse_player_id;
use services::{AccountRegistry, CredentialHasher, LedgerEngine};

// Re-export commonly used types at crate root
pub use domain::result::{Error, ErrorKind, OperationResult};
pub use domain::{
    Account, AccountSummary, BalanceView, EntryKind, LedgerEntry, LoginRequest, RegisterRequest,
    Registered, TransactionRequest,
};
pub use services::DuplicatePolicy;

/// Main context for wallet operations
///
/// Holds the configuration, the shared storage handle and the services
/// built on it. The request-level methods take and return the boundary
/// values of the wallet API.
pub struct WalletContext {
    pub config: Config,
    pub store: Arc<DuckDbStore>,
    pub registry: AccountRegistry<DuckDbStore>,
    pub ledger: LedgerEngine<DuckDbStore>,
}

impl WalletContext {
    /// Open the wallet stored in `wallet_dir` (wallet.duckdb + settings.json)
    pub fn new(wallet_dir: &Path) -> Result<Self> {
        let config = Config::load(wallet_dir)?;
        let db_path = wallet_dir.join("wallet.duckdb");
        let store = Arc::new(DuckDbStore::open(&db_path, config.max_idle_connections)?);
        Ok(Self::with_store(config, store))
    }

    /// Volatile wallet, mainly for tests and embedding
    pub fn in_memory(config: Config) -> Result<Self> {
        let store = Arc::new(DuckDbStore::open_in_memory(config.max_idle_connections)?);
        Ok(Self::with_store(config, store))
    }

    fn with_store(config: Config, store: Arc<DuckDbStore>) -> Self {
        let registry = AccountRegistry::new(
            Arc::clone(&store),
            CredentialHasher::new(config.password_hashing),
        );
        let ledger = LedgerEngine::new(Arc::clone(&store), config.duplicate_policy);

        Self {
            config,
            store,
            registry,
            ledger,
        }
    }

    pub fn register(&self, request: &RegisterRequest) -> domain::Result<Registered> {
        let player_id = self.registry.register(
            &request.username,
            &request.password,
            &request.name,
            request.balance,
        )?;
        Ok(Registered { player_id })
    }

    pub fn login(&self, request: &LoginRequest) -> domain::Result<BalanceView> {
        self.registry.authenticate(&request.username, &request.password)
    }

    pub fn purchase(&self, request: &TransactionRequest) -> domain::Result<BalanceView> {
        let player_id = request.account_id()?;
        let balance = self
            .ledger
            .apply_debit(player_id, &request.transaction_id, request.amount)?;
        Ok(BalanceView { player_id, balance })
    }

    pub fn win(&self, request: &TransactionRequest) -> domain::Result<BalanceView> {
        let player_id = request.account_id()?;
        let balance = self
            .ledger
            .apply_credit(player_id, &request.transaction_id, request.amount)?;
        Ok(BalanceView { player_id, balance })
    }

    pub fn history(&self, player_id: &str) -> domain::Result<Vec<LedgerEntry>> {
        self.ledger.history(parse_player_id(player_id)?)
    }

    pub fn account(&self, player_id: &str) -> domain::Result<AccountSummary> {
        self.registry.account(parse_player_id(player_id)?)
    }
}

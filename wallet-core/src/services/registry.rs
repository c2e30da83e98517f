//! Account registry - account creation and credential checks
//!
//! The registry writes an account once, at registration. Balances change
//! afterwards only through the ledger engine.

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{validate_amount, Account, AccountSummary, BalanceView, MAX_MONEY};
use crate::ports::AccountStore;
use crate::services::credentials::CredentialHasher;

pub struct AccountRegistry<S: AccountStore> {
    store: Arc<S>,
    hasher: CredentialHasher,
}

impl<S: AccountStore> AccountRegistry<S> {
    pub fn new(store: Arc<S>, hasher: CredentialHasher) -> Self {
        Self { store, hasher }
    }

    /// Create an account and return its id.
    ///
    /// The initial balance must be positive with at most two fractional
    /// digits. A username collision (including one lost to a concurrent
    /// registration at the storage index) is `UsernameTaken`.
    pub fn register(
        &self,
        username: &str,
        secret: &str,
        display_name: &str,
        initial_balance: Decimal,
    ) -> Result<Uuid> {
        if username.trim().is_empty() {
            return Err(Error::validation("username cannot be empty"));
        }
        if secret.is_empty() {
            return Err(Error::validation("password cannot be empty"));
        }
        if display_name.trim().is_empty() {
            return Err(Error::validation("name cannot be empty"));
        }
        validate_amount(initial_balance).map_err(|_| {
            Error::invalid_amount(format!(
                "initial balance must be a positive amount up to {} with at most 2 decimals",
                MAX_MONEY
            ))
        })?;

        if self.store.find_by_username(username)?.is_some() {
            return Err(Error::UsernameTaken(username.to_string()));
        }

        let hash = self.hasher.hash(secret)?;
        let account = Account::new(username, hash, display_name, initial_balance.normalize());
        account.validate().map_err(Error::validation)?;

        self.store.insert_account(&account)?;
        log::info!("registered account {}", account.id);
        Ok(account.id)
    }

    /// Resolve credentials to the account id and current balance.
    ///
    /// Unknown usernames and wrong secrets fail identically.
    pub fn authenticate(&self, username: &str, secret: &str) -> Result<BalanceView> {
        let account = match self.store.find_by_username(username)? {
            Some(account) => account,
            None => return Err(Error::InvalidCredentials),
        };

        if !self.hasher.verify(secret, &account.credential_hash) {
            return Err(Error::InvalidCredentials);
        }

        Ok(BalanceView {
            player_id: account.id,
            balance: account.balance,
        })
    }

    /// Public view of an account; the credential hash never leaves the store
    pub fn account(&self, account_id: Uuid) -> Result<AccountSummary> {
        self.store
            .get_account(account_id)?
            .map(|a| a.summary())
            .ok_or(Error::AccountNotFound(account_id))
    }
}

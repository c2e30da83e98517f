//! In-memory storage adapter
//!
//! Writes are staged in the unit and applied under the state mutex at
//! commit, so an aborted or dropped unit leaves nothing behind. Units over
//! the same account serialize on the shared [`RowLocks`] table.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rust_decimal::Decimal;
use uuid::Uuid;

use super::row_lock::{HeldRows, RowLocks};
use crate::domain::result::{Error, Result};
use crate::domain::{Account, LedgerEntry};
use crate::ports::{AccountStore, LedgerStore};

#[derive(Debug, Default)]
struct MemoryState {
    accounts: HashMap<Uuid, Account>,
    usernames: HashMap<String, Uuid>,
    entries: HashMap<String, LedgerEntry>,
    /// Transaction ids in commit order
    log: Vec<String>,
}

/// Volatile store with the same unit semantics as the DuckDB adapter
#[derive(Debug)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
    locks: Arc<RowLocks>,
}

/// Unit of work for [`InMemoryStore`]
#[derive(Debug)]
pub struct MemoryUnit {
    rows: HeldRows,
    balances: HashMap<Uuid, Decimal>,
    entries: Vec<LedgerEntry>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState::default()),
            locks: RowLocks::new(),
        }
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| Error::storage("memory state lock poisoned"))
    }

    /// Committed balance, bypassing units (inspection only)
    pub fn balance(&self, account_id: Uuid) -> Result<Option<Decimal>> {
        Ok(self.state()?.accounts.get(&account_id).map(|a| a.balance))
    }

    /// Number of committed ledger entries
    pub fn entry_count(&self) -> Result<usize> {
        Ok(self.state()?.log.len())
    }
}

impl LedgerStore for InMemoryStore {
    type Unit = MemoryUnit;

    fn begin_unit(&self) -> Result<MemoryUnit> {
        Ok(MemoryUnit {
            rows: HeldRows::default(),
            balances: HashMap::new(),
            entries: Vec::new(),
        })
    }

    fn read_balance(&self, unit: &mut MemoryUnit, account_id: Uuid) -> Result<Option<Decimal>> {
        unit.rows.lock(&self.locks, account_id);
        if let Some(staged) = unit.balances.get(&account_id) {
            return Ok(Some(*staged));
        }
        Ok(self.state()?.accounts.get(&account_id).map(|a| a.balance))
    }

    fn write_balance(&self, unit: &mut MemoryUnit, account_id: Uuid, balance: Decimal) -> Result<()> {
        unit.rows.lock(&self.locks, account_id);
        if balance < Decimal::ZERO {
            log::error!("refusing negative balance write for account {}", account_id);
            return Err(Error::storage("write balance"));
        }
        if !self.state()?.accounts.contains_key(&account_id) {
            return Err(Error::AccountNotFound(account_id));
        }
        unit.balances.insert(account_id, balance);
        Ok(())
    }

    fn append_entry(&self, unit: &mut MemoryUnit, entry: &LedgerEntry) -> Result<()> {
        let staged = unit
            .entries
            .iter()
            .any(|e| e.transaction_id == entry.transaction_id);
        if staged || self.state()?.entries.contains_key(&entry.transaction_id) {
            return Err(Error::DuplicateTransaction(entry.transaction_id.clone()));
        }
        unit.entries.push(entry.clone());
        Ok(())
    }

    fn find_entry(&self, unit: &mut MemoryUnit, transaction_id: &str) -> Result<Option<LedgerEntry>> {
        if let Some(e) = unit.entries.iter().find(|e| e.transaction_id == transaction_id) {
            return Ok(Some(e.clone()));
        }
        Ok(self.state()?.entries.get(transaction_id).cloned())
    }

    fn commit(&self, unit: MemoryUnit) -> Result<()> {
        let mut state = self.state()?;

        // Transaction ids are not covered by row locks; re-check under the state mutex.
        if let Some(dup) = unit
            .entries
            .iter()
            .find(|e| state.entries.contains_key(&e.transaction_id))
        {
            return Err(Error::DuplicateTransaction(dup.transaction_id.clone()));
        }

        if let Some(missing) = unit.balances.keys().find(|id| !state.accounts.contains_key(*id)) {
            return Err(Error::AccountNotFound(*missing));
        }

        for (account_id, balance) in &unit.balances {
            if let Some(account) = state.accounts.get_mut(account_id) {
                account.balance = *balance;
            }
        }
        for entry in unit.entries {
            state.log.push(entry.transaction_id.clone());
            state.entries.insert(entry.transaction_id.clone(), entry);
        }
        Ok(())
    }

    fn abort(&self, unit: MemoryUnit) -> Result<()> {
        drop(unit);
        Ok(())
    }

    fn list_entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let state = self.state()?;
        Ok(state
            .log
            .iter()
            .filter_map(|id| state.entries.get(id))
            .filter(|e| e.account_id == account_id)
            .cloned()
            .collect())
    }
}

impl AccountStore for InMemoryStore {
    fn insert_account(&self, account: &Account) -> Result<()> {
        let mut state = self.state()?;
        if state.usernames.contains_key(&account.username) {
            return Err(Error::UsernameTaken(account.username.clone()));
        }
        state.usernames.insert(account.username.clone(), account.id);
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    fn find_by_username(&self, username: &str) -> Result<Option<Account>> {
        let state = self.state()?;
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.accounts.get(id))
            .cloned())
    }

    fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.state()?.accounts.get(&id).cloned())
    }
}

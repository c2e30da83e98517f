//! Ledger engine - atomic balance mutations
//!
//! Every debit or credit runs read-validate-write-log inside one storage
//! unit: the balance is read under the account's row lock, checked, written
//! back and the ledger entry appended, then the unit commits. Any failure
//! aborts the unit, so either both writes land or neither does.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};
use crate::domain::{
    validate_amount, validate_balance, validate_transaction_id, EntryKind, LedgerEntry,
};
use crate::ports::LedgerStore;

/// How the engine treats a transaction id that is already in the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// No prior-existence check. The log's key still rejects the append,
    /// after the balance write, and the whole unit aborts.
    #[default]
    Permissive,
    /// Look the id up before any write and fail fast.
    Reject,
    /// Return the current balance without applying when the recorded entry
    /// is the same mutation; reject it otherwise.
    Replay,
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DuplicatePolicy::Permissive => "permissive",
            DuplicatePolicy::Reject => "reject",
            DuplicatePolicy::Replay => "replay",
        })
    }
}

impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "permissive" | "allow" => Ok(DuplicatePolicy::Permissive),
            "reject" => Ok(DuplicatePolicy::Reject),
            "replay" => Ok(DuplicatePolicy::Replay),
            other => Err(Error::validation(format!(
                "unknown duplicate policy '{}'",
                other
            ))),
        }
    }
}

/// A requested balance change
#[derive(Debug, Clone)]
struct Mutation<'a> {
    account_id: Uuid,
    transaction_id: &'a str,
    kind: EntryKind,
    amount: Decimal,
}

enum Outcome {
    Applied(Decimal),
    Replayed(Decimal),
}

/// The only writer of account balances and ledger entries
pub struct LedgerEngine<S: LedgerStore> {
    store: Arc<S>,
    duplicates: DuplicatePolicy,
}

impl<S: LedgerStore> LedgerEngine<S> {
    pub fn new(store: Arc<S>, duplicates: DuplicatePolicy) -> Self {
        Self { store, duplicates }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicates
    }

    /// Debit (purchase). Returns the post-debit balance.
    ///
    /// Fails with `InsufficientFunds` when the in-unit balance is below
    /// `amount`; nothing is written in that case.
    pub fn apply_debit(&self, account_id: Uuid, transaction_id: &str, amount: Decimal) -> Result<Decimal> {
        self.apply(Mutation {
            account_id,
            transaction_id,
            kind: EntryKind::Purchase,
            amount,
        })
    }

    /// Credit (win). Returns the post-credit balance.
    pub fn apply_credit(&self, account_id: Uuid, transaction_id: &str, amount: Decimal) -> Result<Decimal> {
        self.apply(Mutation {
            account_id,
            transaction_id,
            kind: EntryKind::Win,
            amount,
        })
    }

    /// Committed entries for an account, oldest first
    pub fn history(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>> {
        let mut unit = self.store.begin_unit()?;
        let exists = self.store.read_balance(&mut unit, account_id);
        self.store.abort(unit)?;
        if exists?.is_none() {
            return Err(Error::AccountNotFound(account_id));
        }
        self.store.list_entries(account_id)
    }

    fn apply(&self, mutation: Mutation<'_>) -> Result<Decimal> {
        // Fail fast, before touching storage
        validate_amount(mutation.amount)?;
        validate_transaction_id(mutation.transaction_id)?;

        let mut unit = self.store.begin_unit()?;
        let outcome = self.apply_in_unit(&mut unit, &mutation);

        match outcome {
            Ok(Outcome::Applied(balance)) => {
                self.store.commit(unit)?;
                log::debug!(
                    "{} {} applied to account {}",
                    mutation.kind,
                    mutation.transaction_id,
                    mutation.account_id
                );
                Ok(balance)
            }
            Ok(Outcome::Replayed(balance)) => {
                self.store.abort(unit)?;
                log::info!(
                    "{} {} already applied to account {}, replayed",
                    mutation.kind,
                    mutation.transaction_id,
                    mutation.account_id
                );
                Ok(balance)
            }
            Err(e) => {
                if let Err(abort_err) = self.store.abort(unit) {
                    log::warn!(
                        "abort after failed {} {} also failed: {}",
                        mutation.kind,
                        mutation.transaction_id,
                        abort_err
                    );
                }
                log::warn!(
                    "{} {} rejected for account {}: {}",
                    mutation.kind,
                    mutation.transaction_id,
                    mutation.account_id,
                    e.kind().as_str()
                );
                Err(e)
            }
        }
    }

    fn apply_in_unit(&self, unit: &mut S::Unit, m: &Mutation<'_>) -> Result<Outcome> {
        let balance = self
            .store
            .read_balance(unit, m.account_id)?
            .ok_or(Error::AccountNotFound(m.account_id))?;

        match self.duplicates {
            DuplicatePolicy::Permissive => {}
            DuplicatePolicy::Reject => {
                if self.store.find_entry(unit, m.transaction_id)?.is_some() {
                    return Err(Error::DuplicateTransaction(m.transaction_id.to_string()));
                }
            }
            DuplicatePolicy::Replay => {
                if let Some(existing) = self.store.find_entry(unit, m.transaction_id)? {
                    if existing.matches(m.account_id, m.kind, m.amount) {
                        return Ok(Outcome::Replayed(balance));
                    }
                    return Err(Error::DuplicateTransaction(m.transaction_id.to_string()));
                }
            }
        }

        let new_balance = match m.kind {
            EntryKind::Purchase => {
                if balance < m.amount {
                    return Err(Error::InsufficientFunds {
                        balance,
                        requested: m.amount,
                    });
                }
                balance - m.amount
            }
            EntryKind::Win => {
                let credited = balance
                    .checked_add(m.amount)
                    .ok_or_else(|| Error::invalid_amount("credit would overflow the balance"))?;
                validate_balance(credited)?;
                credited
            }
        };

        self.store.write_balance(unit, m.account_id, new_balance)?;
        self.store.append_entry(
            unit,
            &LedgerEntry::new(m.transaction_id, m.account_id, m.kind, m.amount),
        )?;

        Ok(Outcome::Applied(new_balance))
    }
}

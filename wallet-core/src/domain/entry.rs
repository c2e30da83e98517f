//! Ledger entry domain model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

/// Maximum number of fractional digits carried by amounts and balances
pub const MONEY_SCALE: u32 = 2;

/// Largest amount or balance that survives storage at `MONEY_SCALE`.
///
/// Storage keeps two decimal places, so the value times 100 must fit the
/// 96-bit mantissa (about `Decimal::MAX / 100`).
pub const MAX_MONEY: Decimal =
    Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, MONEY_SCALE);

/// Direction of a balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Debit
    Purchase,
    /// Credit
    Win,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Purchase => "purchase",
            EntryKind::Win => "win",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "purchase" => Ok(EntryKind::Purchase),
            "win" => Ok(EntryKind::Win),
            other => Err(Error::validation(format!("unknown entry kind '{}'", other))),
        }
    }
}

/// An immutable record of one applied balance mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub transaction_id: String,
    pub account_id: Uuid,
    pub kind: EntryKind,
    /// Always strictly positive; the direction comes from `kind`
    pub amount: Decimal,
    pub applied_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        transaction_id: impl Into<String>,
        account_id: Uuid,
        kind: EntryKind,
        amount: Decimal,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            account_id,
            kind,
            amount,
            applied_at: Utc::now(),
        }
    }

    /// True when this entry records the same mutation (ignoring the timestamp)
    pub fn matches(&self, account_id: Uuid, kind: EntryKind, amount: Decimal) -> bool {
        self.account_id == account_id && self.kind == kind && self.amount == amount
    }
}

/// Validate a mutation amount: strictly positive, at most two decimal
/// places, no larger than `MAX_MONEY`
pub fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::invalid_amount(format!(
            "amount must be greater than zero, got {}",
            amount
        )));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(Error::invalid_amount(format!(
            "amount {} has more than {} decimal places",
            amount, MONEY_SCALE
        )));
    }
    if amount > MAX_MONEY {
        return Err(Error::invalid_amount(format!(
            "amount exceeds the maximum of {}",
            MAX_MONEY
        )));
    }
    Ok(())
}

/// Check that a balance produced by a credit stays within `MAX_MONEY`
pub fn validate_balance(balance: Decimal) -> Result<()> {
    if balance > MAX_MONEY {
        return Err(Error::invalid_amount(format!(
            "balance would exceed the maximum of {}",
            MAX_MONEY
        )));
    }
    Ok(())
}

/// Validate a caller-supplied transaction identifier
pub fn validate_transaction_id(transaction_id: &str) -> Result<()> {
    if transaction_id.trim().is_empty() {
        return Err(Error::validation("transaction id cannot be empty"));
    }
    Ok(())
}

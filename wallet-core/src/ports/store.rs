//! Storage ports consumed by the ledger engine and the account registry

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::result::Result;
use crate::domain::{Account, LedgerEntry};

/// Balance and transaction-log storage with atomic multi-write units
///
/// A unit is an explicit value returned by [`begin_unit`](Self::begin_unit)
/// and threaded through every call that must be part of it. Only the ledger
/// engine begins, commits or aborts units.
///
/// Implementations must serialize units that touch the same account row:
/// once `read_balance` returns inside a unit, no other unit can change that
/// account's balance until this unit commits or aborts. Units over different
/// accounts must not block each other.
pub trait LedgerStore: Send + Sync {
    /// One atomic unit of work. Dropping it without `commit` aborts it.
    type Unit: Send;

    fn begin_unit(&self) -> Result<Self::Unit>;

    /// Read the balance and hold the account's row lock for the rest of the unit.
    /// Returns `None` when the account does not exist.
    fn read_balance(&self, unit: &mut Self::Unit, account_id: Uuid) -> Result<Option<Decimal>>;

    fn write_balance(&self, unit: &mut Self::Unit, account_id: Uuid, balance: Decimal) -> Result<()>;

    /// Append to the transaction log. A transaction id that is already
    /// recorded fails with `Error::DuplicateTransaction`.
    fn append_entry(&self, unit: &mut Self::Unit, entry: &LedgerEntry) -> Result<()>;

    /// Look up a committed entry by transaction id (duplicate detection hook)
    fn find_entry(&self, unit: &mut Self::Unit, transaction_id: &str) -> Result<Option<LedgerEntry>>;

    fn commit(&self, unit: Self::Unit) -> Result<()>;

    /// Undo every write staged in the unit
    fn abort(&self, unit: Self::Unit) -> Result<()>;

    /// Committed entries for one account in the order they were applied
    fn list_entries(&self, account_id: Uuid) -> Result<Vec<LedgerEntry>>;
}

/// Account records, used by the registry
pub trait AccountStore: Send + Sync {
    /// Insert a new account. A taken username fails with `Error::UsernameTaken`.
    fn insert_account(&self, account: &Account) -> Result<()>;

    /// Case-sensitive username lookup
    fn find_by_username(&self, username: &str) -> Result<Option<Account>>;

    fn get_account(&self, id: Uuid) -> Result<Option<Account>>;
}

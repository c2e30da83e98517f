//! Core domain entities
//!
//! All business entities are defined here. These are pure data structures
//! with validation logic - no I/O or external dependencies.

mod account;
mod credentials;
mod entry;
pub mod requests;
pub mod result;

pub use account::{Account, AccountSummary};
pub use credentials::Argon2Params;
pub use entry::{
    validate_amount, validate_balance, validate_transaction_id, EntryKind, LedgerEntry, MAX_MONEY,
    MONEY_SCALE,
};
pub use requests::{BalanceView, LoginRequest, Registered, RegisterRequest, TransactionRequest};
pub use result::{Error, ErrorKind, OperationResult, Result};

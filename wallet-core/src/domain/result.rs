//! Result and error types for the core library

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Closed set of error kinds exposed to callers.
///
/// Programmatic handling matches on the kind; the message text of
/// [`Error`] is for humans only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    NotFound,
    Conflict,
    InsufficientFunds,
    Unauthorized,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InsufficientFunds => "insufficient_funds",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

/// Core library error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Account not found: {0}")]
    AccountNotFound(Uuid),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Transaction already recorded: {0}")]
    DuplicateTransaction(String),

    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Carries the failing storage operation only; driver detail is logged, not returned.
    #[error("Storage failure: {0}")]
    Storage(String),
}

impl Error {
    /// Create an invalid amount error
    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a storage error for the named operation
    pub fn storage(operation: impl Into<String>) -> Self {
        Self::Storage(operation.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidAmount(_) | Error::Validation(_) => ErrorKind::InvalidInput,
            Error::AccountNotFound(_) => ErrorKind::NotFound,
            Error::UsernameTaken(_) | Error::DuplicateTransaction(_) => ErrorKind::Conflict,
            Error::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Error::InvalidCredentials => ErrorKind::Unauthorized,
            Error::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    /// Only storage failures may succeed when retried unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::StorageFailure
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Operation result envelope for serialized responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub kind: Option<ErrorKind>,
}

impl<T> OperationResult<T> {
    /// Create a successful result
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            kind: None,
        }
    }

    /// Create a failed result
    pub fn fail(error: &Error) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.to_string()),
            kind: Some(error.kind()),
        }
    }
}

impl<T> From<Result<T>> for OperationResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(e) => Self::fail(&e),
        }
    }
}

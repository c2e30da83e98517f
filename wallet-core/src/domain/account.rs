//! Account domain model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A player's identity plus current balance
///
/// `credential_hash` is an Argon2 PHC string and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    /// Unique, case-sensitive
    pub username: String,
    #[serde(skip_serializing, default)]
    pub credential_hash: String,
    pub display_name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with a fresh identifier
    pub fn new(
        username: impl Into<String>,
        credential_hash: impl Into<String>,
        display_name: impl Into<String>,
        balance: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            credential_hash: credential_hash.into(),
            display_name: display_name.into(),
            balance,
            created_at: Utc::now(),
        }
    }

    /// Validate account data
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username cannot be empty");
        }
        if self.display_name.trim().is_empty() {
            return Err("display name cannot be empty");
        }
        if self.balance < Decimal::ZERO {
            return Err("balance cannot be negative");
        }
        Ok(())
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            username: self.username.clone(),
            display_name: self.display_name.clone(),
            balance: self.balance,
            created_at: self.created_at,
        }
    }
}

/// Public view of an account, safe to hand to the request surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

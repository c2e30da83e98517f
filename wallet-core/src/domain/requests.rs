//! Request and response values exchanged with the request surface
//!
//! Field names follow the wallet's JSON API (`player_id`, `transaction_id`, ...).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::result::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub name: String,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Purchase (debit) or win (credit) request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub player_id: String,
    pub transaction_id: String,
    pub amount: Decimal,
}

impl TransactionRequest {
    pub fn new(player_id: Uuid, transaction_id: impl Into<String>, amount: Decimal) -> Self {
        Self {
            player_id: player_id.to_string(),
            transaction_id: transaction_id.into(),
            amount,
        }
    }

    /// Parse `player_id`; a malformed identifier is a caller error
    pub fn account_id(&self) -> Result<Uuid> {
        parse_player_id(&self.player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registered {
    pub player_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceView {
    pub player_id: Uuid,
    pub balance: Decimal,
}

pub fn parse_player_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| Error::validation(format!("malformed player id '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_request_from_json() {
        let id = Uuid::new_v4();
        let json = format!(
            r#"{{"player_id":"{}","transaction_id":"t1","amount":30.5}}"#,
            id
        );
        let req: TransactionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(req.account_id().unwrap(), id);
        assert_eq!(req.amount, Decimal::new(305, 1));
    }

    #[test]
    fn test_malformed_player_id_is_invalid_input() {
        let req = TransactionRequest {
            player_id: "not-a-uuid".to_string(),
            transaction_id: "t1".to_string(),
            amount: Decimal::ONE,
        };
        let err = req.account_id().unwrap_err();
        assert_eq!(err.kind(), crate::domain::ErrorKind::InvalidInput);
    }
}

//! Credential hashing - Argon2id PHC strings

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::domain::result::{Error, Result};
use crate::domain::Argon2Params;

/// Hashes and verifies account secrets
#[derive(Debug, Clone)]
pub struct CredentialHasher {
    params: Argon2Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(Argon2Params::default())
    }
}

impl CredentialHasher {
    pub fn new(params: Argon2Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Result<Argon2<'static>> {
        let params = Params::new(
            self.params.memory_cost,
            self.params.time_cost,
            self.params.parallelism,
            None,
        )
        .map_err(|e| Error::validation(format!("invalid argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Hash a secret with a fresh random salt
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        let hash = self
            .argon2()?
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| {
                log::error!("argon2 hashing failed: {}", e);
                Error::storage("hash credential")
            })?;
        Ok(hash.to_string())
    }

    /// Verify a secret against a stored PHC string.
    /// Malformed hashes verify as false.
    pub fn verify(&self, secret: &str, stored: &str) -> bool {
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("stored credential hash is malformed: {}", e);
                return false;
            }
        };
        // Parameters come from the stored hash, not from self.params
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed)
            .is_ok()
    }
}

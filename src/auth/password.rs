//! Password hashing and verification using Argon2id

use crate::error::AppError;
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use once_cell::sync::OnceCell;

/// Password hasher with fixed cost parameters
///
/// Argon2id, m=19 MiB, t=2, p=1. Same latency class as bcrypt at cost 10;
/// intentionally not configurable.
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    /// Hash used to spend equal work when the account does not exist
    dummy_hash: OnceCell<String>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, Params::default());

        Self {
            argon2,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Hash a password into a PHC string with an embedded random salt
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                AppError::Internal(format!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a stored hash
    ///
    /// Mismatch and malformed hashes both yield `false`.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Failed to parse stored password hash: {:?}", e);
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Run one verification against a throwaway hash; always `false`
    pub fn verify_dummy(&self, password: &str) -> bool {
        match self
            .dummy_hash
            .get_or_try_init(|| self.hash("tasktrack-dummy-password"))
        {
            Ok(hash) => {
                let _ = self.verify(password, hash);
            }
            Err(e) => tracing::warn!("Failed to prepare dummy hash: {}", e),
        }
        false
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "pw123";

        let hash = hasher.hash(password).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify(password, &hash));
    }

    #[test]
    fn test_verify_fails_with_wrong_password() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("pw123").unwrap();
        assert!(!hasher.verify("pw124", &hash));
    }

    #[test]
    fn test_hash_is_different_each_time() {
        let hasher = PasswordHasher::new();
        let password = "TestPassword123!";

        let hash1 = hasher.hash(password).unwrap();
        let hash2 = hasher.hash(password).unwrap();

        // Hashes should be different due to salt
        assert_ne!(hash1, hash2);

        assert!(hasher.verify(password, &hash1));
        assert!(hasher.verify(password, &hash2));
    }

    #[test]
    fn test_malformed_hash_is_a_mismatch() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("pw123", "not-a-phc-string"));
        assert!(!hasher.verify("pw123", ""));
    }

    #[test]
    fn test_verify_dummy_is_always_false() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify_dummy("tasktrack-dummy-password"));
        assert!(!hasher.verify_dummy("anything"));
    }
}

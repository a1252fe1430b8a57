//! Account passwords. Stored as argon2 PHC strings, checked so that an
//! unknown email costs as much as a wrong password.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::warn;

use crate::error::ApiError;

/// Verified in place of a real hash when the account does not exist.
static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();

fn decoy_hash() -> Option<&'static str> {
    DECOY_HASH
        .get_or_init(|| hash_password("decoy password").ok())
        .as_deref()
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Password hashing failed: {e}")))
}

/// Whether `password` matches the stored hash of an account. `None` stands
/// for a missing account and always fails, after the same amount of work.
pub fn check_password(password: &str, stored: Option<&str>) -> bool {
    let Some(hash) = stored.or_else(|| decoy_hash()) else {
        return false;
    };

    let parsed = match PasswordHash::new(hash) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!("Stored password hash is unreadable: {e}");
            return false;
        }
    };

    let matches = Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok();

    matches && stored.is_some()
}

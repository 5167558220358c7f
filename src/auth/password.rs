//! Password hashing and verification.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use once_cell::sync::Lazy;
use rand_core::{OsRng, RngCore};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Hash of a random secret nobody knows, verified against when there is no
/// real argon2 hash to check so every login attempt costs one argon2 run.
static DUMMY_HASH: Lazy<Option<String>> = Lazy::new(|| {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let salt = SaltString::generate(&mut OsRng);
    match Argon2::default().hash_password(&secret, &salt) {
        Ok(hash) => Some(hash.to_string()),
        Err(e) => {
            tracing::warn!("Failed to build dummy password hash: {}", e);
            None
        }
    }
});

/// Whether a stored password is already an argon2 PHC string.
pub fn is_hashed(stored: &str) -> bool {
    stored.starts_with("$argon2")
}

pub fn hash_password(plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check `plain` against a stored value.
///
/// Legacy records still hold plaintext until `/migrate` rewrites them; those
/// are compared in constant time.
pub fn verify_password(plain: &str, stored: &str) -> bool {
    if is_hashed(stored) {
        argon2_matches(plain, stored)
    } else {
        burn_verification(plain);
        constant_time_compare(plain, stored)
    }
}

/// Run one argon2 verification that always fails. Used for unknown accounts
/// and legacy plaintext records.
pub fn burn_verification(plain: &str) {
    if let Some(dummy) = DUMMY_HASH.as_deref() {
        argon2_matches(plain, dummy);
    }
}

fn argon2_matches(plain: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

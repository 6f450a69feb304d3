//! Password hashing boundary.
//!
//! Plaintext passwords only exist inside this module and the session
//! authenticator; everything else handles argon2 hash strings.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};

/// Hash a password for storage.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Compare a candidate password against a stored hash.
///
/// # Errors
/// Returns an error if the stored hash cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(password_hash).map_err(|err| anyhow!("invalid password hash: {err}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() {
        let hash = hash_password("password1").expect("hash");
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("password1", &hash).expect("verify"));
    }

    #[test]
    fn wrong_password_rejected() {
        let hash = hash_password("password1").expect("hash");
        assert!(!verify_password("password2", &hash).expect("verify"));
    }

    #[test]
    fn salted_hashes_differ() {
        let first = hash_password("password1").expect("hash");
        let second = hash_password("password1").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_is_an_error() {
        assert!(verify_password("password1", "not-a-hash").is_err());
    }
}

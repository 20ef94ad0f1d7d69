use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::errors::AppError;

/// Hashes a plaintext password with argon2id and a fresh random salt. The
/// returned string is the self-describing PHC encoding, safe to store as-is.
pub fn hash_password(plain: &str) -> Result<String, AppError> {
    if plain.is_empty() {
        return Err(AppError::Hashing("refusing to hash empty input".into()));
    }
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            AppError::Hashing(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Checks a candidate password against a stored hash. A mismatch is
/// `Ok(false)`; only an unusable stored hash is an error.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        AppError::Hashing(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let password = "Secur3P@ssw0rd!";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(verify_password(password, &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn verify_rejects_empty_candidate() {
        let hash = hash_password("hunter2").expect("hashing should succeed");
        assert!(!verify_password("", &hash).expect("verify should not error"));
    }

    #[test]
    fn rehashing_same_password_salts_differently() {
        let password = "same-input-twice";
        let a = hash_password(password).expect("hashing should succeed");
        let b = hash_password(password).expect("hashing should succeed");
        assert_ne!(a, b);
        assert!(verify_password(password, &a).unwrap());
        assert!(verify_password(password, &b).unwrap());
    }

    #[test]
    fn stored_hash_is_not_its_own_password() {
        let hash = hash_password("hunter2").expect("hashing should succeed");
        assert!(!verify_password(&hash, &hash).expect("verify should not error"));
    }

    #[test]
    fn empty_password_is_a_hashing_error() {
        let err = hash_password("").unwrap_err();
        assert!(matches!(err, AppError::Hashing(_)));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(matches!(err, AppError::Hashing(_)));
    }
}

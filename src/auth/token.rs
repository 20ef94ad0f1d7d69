use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::AppError;

/// Scope stamped on tokens issued by login.
pub const SCOPE_AUTH: &str = "authentication";

/// Scopes the service will issue or revoke. The column itself stays free-form
/// text so new scopes are a code change, not a migration.
pub const KNOWN_SCOPES: &[&str] = &[SCOPE_AUTH];

/// Raw entropy per token; 32 bytes encode to 43 base64url characters.
const TOKEN_BYTES: usize = 32;

/// A freshly minted token. `plaintext` exists only in memory and in the
/// response that hands it to the client; the store keeps `hash` alone.
#[derive(Debug)]
pub struct Token {
    pub plaintext: String,
    pub hash: String,
    pub user_id: Uuid,
    pub scope: String,
    pub expiry: OffsetDateTime,
}

/// Draws token bytes from the OS CSPRNG and derives the storage hash. An
/// unavailable randomness source is an error, never a weaker fallback.
pub fn generate(user_id: Uuid, ttl: Duration, scope: &str) -> Result<Token, AppError> {
    let mut raw = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut raw)
        .map_err(|e| AppError::Entropy(e.to_string()))?;

    let plaintext = URL_SAFE_NO_PAD.encode(raw);
    let hash = hash_token(&plaintext);
    let expiry = OffsetDateTime::now_utc() + ttl;

    Ok(Token {
        plaintext,
        hash,
        user_id,
        scope: scope.to_string(),
        expiry,
    })
}

/// Deterministic lookup key for a token plaintext. Token input is already
/// high-entropy, so a single unsalted SHA-256 pass is sufficient; the slow
/// salted KDF is reserved for passwords.
pub fn hash_token(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

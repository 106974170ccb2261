use bcrypt::{hash, verify, DEFAULT_COST};

/// Hash a plaintext password for storage. bcrypt salts internally; two
/// hashes of the same password never compare equal as strings.
pub fn hash_password(plaintext: &str) -> Result<String, bcrypt::BcryptError> {
    hash(plaintext, DEFAULT_COST)
}

/// Check a plaintext password against a stored bcrypt hash. A hash that
/// fails to parse counts as a non-match rather than an error surfaced to
/// the caller, so login responses stay uniform.
pub fn verify_password(plaintext: &str, stored_hash: &str) -> bool {
    verify(plaintext, stored_hash).unwrap_or(false)
}

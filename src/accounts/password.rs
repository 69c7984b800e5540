//! Password hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use super::AccountError;

/// Prefix marking a password that can never match, as stored for users created without one.
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, AccountError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| AccountError::Hashing(format!("argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self { memory_kib: 19456, iterations: 2, parallelism: 1 }
    }
}

/// Hash a raw password into a PHC string.
pub fn hash_password(raw: &str, params: Argon2Params) -> Result<String, AccountError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .to_argon2()?
        .hash_password(raw.as_bytes(), &salt)
        .map_err(|e| AccountError::Hashing(format!("hash password: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a raw password against a stored hash.
///
/// Unusable or unparsable hashes never verify. Verification uses the parameters embedded in the
/// hash, so changing the configured cost does not invalidate existing passwords.
pub fn verify_password(raw: &str, stored: &str) -> bool {
    if stored.starts_with(UNUSABLE_PASSWORD_PREFIX) {
        return false;
    }
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default().verify_password(raw.as_bytes(), &parsed).is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// A value for the password column that no input will ever verify against.
pub fn unusable_password() -> String {
    format!("{}{}", UNUSABLE_PASSWORD_PREFIX, uuid::Uuid::new_v4().simple())
}

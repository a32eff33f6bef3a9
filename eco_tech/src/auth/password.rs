//! Argon2id password hashing with a server-side pepper.

use super::errors::{AuthError, AuthResult};
use argon2::{
    Argon2,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

/// Hashes and verifies passwords.
///
/// Hashes are PHC strings, so the salt and parameters travel with them.
#[derive(Clone)]
pub struct PepperedHasher {
    pepper: String,
}

impl PepperedHasher {
    pub fn new(pepper: String) -> Self {
        Self { pepper }
    }

    /// Hash password with Argon2id + pepper
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    ///
    /// Any mismatch, including an unparsable stored hash, is reported as
    /// [`AuthError::InvalidCredentials`].
    pub fn verify(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    /// Spend the same work as a real verification when no user matched.
    pub fn burn(&self, password: &str) {
        let _ = self.hash(password);
    }
}

impl std::fmt::Debug for PepperedHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PepperedHasher").finish_non_exhaustive()
    }
}

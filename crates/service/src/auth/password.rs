use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::errors::DirectoryError;

/// Argon2id hashing with configurable cost.
///
/// The async methods move the work onto the blocking pool; hashing at the
/// default cost takes tens of milliseconds and must not stall the runtime.
#[derive(Clone, Debug)]
pub struct Passwords {
    params: Params,
}

impl Default for Passwords {
    fn default() -> Self {
        Self { params: Params::default() }
    }
}

impl Passwords {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, DirectoryError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| DirectoryError::Internal(format!("argon2 params: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// PHC-format hash with a fresh random salt.
    pub fn hash_blocking(&self, plaintext: &str) -> Result<String, DirectoryError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| DirectoryError::Internal(format!("password hashing failed: {}", e)))
    }

    /// Constant-time comparison against a stored PHC string. A hash that
    /// cannot be parsed is an internal fault, not a mismatch.
    pub fn verify_blocking(&self, hash: &str, plaintext: &str) -> Result<bool, DirectoryError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| DirectoryError::Internal(format!("stored hash unreadable: {}", e)))?;
        Ok(self.argon2().verify_password(plaintext.as_bytes(), &parsed).is_ok())
    }

    pub async fn hash(&self, plaintext: String) -> Result<String, DirectoryError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.hash_blocking(&plaintext))
            .await
            .map_err(|e| DirectoryError::Internal(format!("hash task failed: {}", e)))?
    }

    pub async fn verify(&self, hash: String, plaintext: String) -> Result<bool, DirectoryError> {
        let this = self.clone();
        tokio::task::spawn_blocking(move || this.verify_blocking(&hash, &plaintext))
            .await
            .map_err(|e| DirectoryError::Internal(format!("verify task failed: {}", e)))?
    }
}

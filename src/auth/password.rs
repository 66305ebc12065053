// Password hashing and validation service

use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PasswordHashError, PasswordHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};

use crate::auth::error::AuthError;
use crate::config::PasswordHashConfig;

/// Password service for hashing and verification (Argon2id)
///
/// The async methods run hashing on tokio's blocking pool.
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
    /// Verified against when no user matches, so both paths cost the same
    dummy_hash: String,
}

impl PasswordService {
    pub fn new(config: PasswordHashConfig) -> Result<Self, AuthError> {
        let params = Params::new(config.memory_kib, config.iterations, 1, None)
            .map_err(|e| AuthError::PasswordHashError(format!("invalid Argon2 parameters: {}", e)))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut service = Self {
            argon2,
            dummy_hash: String::new(),
        };
        service.dummy_hash = service.hash_password("crm-timing-equalizer")?;
        Ok(service)
    }

    /// Hash a password using Argon2id with a random salt
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))
    }

    /// Verify a password against a PHC-format hash
    ///
    /// A mismatch is `Ok(false)`; only a corrupt hash or an internal
    /// failure is an error.
    pub fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AuthError::PasswordHashError(format!("stored hash is malformed: {}", e)))?;

        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PasswordHashError::Password) => Ok(false),
            Err(e) => Err(AuthError::PasswordHashError(e.to_string())),
        }
    }

    /// Validate password strength requirements
    pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), AuthError> {
        if password.chars().count() < min_length {
            return Err(AuthError::ValidationError(format!(
                "Password must be at least {} characters",
                min_length
            )));
        }
        Ok(())
    }

    /// Hash on the blocking pool
    pub async fn hash(&self, password: String) -> Result<String, AuthError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHashError(e.to_string()))?
    }

    /// Verify on the blocking pool
    ///
    /// With no stored hash the dummy hash is checked instead and the result
    /// is always `false`.
    pub async fn verify(&self, password: String, hash: Option<String>) -> Result<bool, AuthError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || match hash {
            Some(hash) => service.verify_password(&password, &hash),
            None => service
                .verify_password(&password, &service.dummy_hash)
                .map(|_| false),
        })
        .await
        .map_err(|e| AuthError::PasswordHashError(e.to_string()))?
    }
}

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{error, warn};

#[derive(Debug, Error)]
pub enum HashError {
    #[error("argon2: {0}")]
    Argon2(String),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("hasher is shut down")]
    Unavailable,
}

pub fn hash_password(argon2: &Argon2<'_>, plain: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            HashError::Argon2(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// Cost parameters are read from the PHC string, so hashes made with other params still verify.
/// A malformed hash is a mismatch, not an error.
pub fn verify_password(plain: &str, hash: &str) -> bool {
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "argon2 parse hash error");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Runs Argon2 on the blocking pool, with at most `max_concurrent` computations in flight.
#[derive(Clone)]
pub struct Hasher {
    argon2: Argon2<'static>,
    permits: Arc<Semaphore>,
}

impl Hasher {
    pub fn new(params: Params, max_concurrent: usize) -> Self {
        Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub async fn hash(&self, plain: &str) -> Result<String, HashError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| HashError::Unavailable)?;
        let argon2 = self.argon2.clone();
        let plain = plain.to_owned();
        tokio::task::spawn_blocking(move || hash_password(&argon2, &plain)).await?
    }

    pub async fn verify(&self, plain: &str, hash: &str) -> bool {
        let Ok(_permit) = self.permits.acquire().await else {
            return false;
        };
        let plain = plain.to_owned();
        let hash = hash.to_owned();
        match tokio::task::spawn_blocking(move || verify_password(&plain, &hash)).await {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, "verify_password task failed");
                false
            }
        }
    }

    /// Spends one Argon2 computation at this hasher's cost and reports a mismatch.
    /// Used when there is no stored hash, so a missing account costs as much as a wrong password.
    pub async fn verify_absent(&self, plain: &str) -> bool {
        let Ok(_permit) = self.permits.acquire().await else {
            return false;
        };
        let argon2 = self.argon2.clone();
        let plain = plain.to_owned();
        if let Err(e) = tokio::task::spawn_blocking(move || hash_password(&argon2, &plain)).await {
            error!(error = %e, "dummy verify task failed");
        }
        false
    }

    #[cfg(test)]
    pub(crate) fn permits(&self) -> Arc<Semaphore> {
        self.permits.clone()
    }
}

#[cfg(test)]
pub(crate) fn test_params() -> Params {
    Params::new(8, 1, 1, None).expect("valid argon2 params")
}

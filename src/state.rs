use std::sync::Arc;

use argon2::Params;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::auth::{
    jwt::JwtKeys,
    password::Hasher,
    repo::{PgUserStore, UserStore},
};
use crate::config::AppConfig;

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub keys: JwtKeys,
    pub hasher: Hasher,
}

impl AppState {
    pub fn init(config: &AppConfig, db: PgPool) -> Self {
        if config.jwt.secret.is_empty() {
            tracing::warn!("JWT_SECRET is empty; logins will fail to issue tokens");
        }
        Self::from_parts(
            Arc::new(PgUserStore::new(db)),
            JwtKeys::from_config(&config.jwt),
            Hasher::new(Params::default(), config.hash_max_concurrent),
        )
    }

    pub fn from_parts(store: Arc<dyn UserStore>, keys: JwtKeys, hasher: Hasher) -> Self {
        Self {
            store,
            keys,
            hasher,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        Self::fake_with_secret("test-secret")
    }

    /// In-memory store and cheap Argon2 params, no database.
    #[cfg(test)]
    pub fn fake_with_secret(secret: &str) -> Self {
        use crate::auth::{password::test_params, repo_memory::MemoryUserStore};

        Self::from_parts(
            Arc::new(MemoryUserStore::default()),
            JwtKeys::new(secret, std::time::Duration::from_secs(24 * 60 * 60)),
            Hasher::new(test_params(), 4),
        )
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.keys.clone()
    }
}

use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser, RegisterRequest},
        jwt::TokenError,
        password::HashError,
        repo::StoreError,
        repo_types::NewUser,
    },
    state::AppState,
};

/// Failures of the registration, login and profile flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("email already exists")]
    DuplicateEmail,
    /// Returned for both unknown email and wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("user not found")]
    NotFound,
    #[error("password hashing failed: {0}")]
    Hashing(#[from] HashError),
    #[error("token issuance failed: {0}")]
    Token(#[from] TokenError),
    #[error("store failure: {0}")]
    Store(StoreError),
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub async fn register(st: &AppState, req: RegisterRequest) -> Result<PublicUser, AuthError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        warn!("register missing email or password");
        return Err(AuthError::Validation("Email and password are required"));
    }

    let password_hash = st.hasher.hash(&req.password).await.map_err(|e| {
        error!(error = %e, "hash_password failed");
        AuthError::Hashing(e)
    })?;

    let new_user = NewUser {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        email,
        password_hash,
    };

    let user = match st.store.create(new_user).await {
        Ok(u) => u,
        Err(StoreError::DuplicateEmail) => {
            warn!("email already registered");
            return Err(AuthError::DuplicateEmail);
        }
        Err(e) => {
            error!(error = %e, "create user failed");
            return Err(AuthError::Store(e));
        }
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(user.into())
}

/// Returns a signed bearer token on success.
pub async fn login(st: &AppState, req: LoginRequest) -> Result<String, AuthError> {
    let email = normalize_email(&req.email);

    let user = match st.store.find_by_email(&email).await {
        Ok(u) => u,
        Err(StoreError::NotFound) => {
            st.hasher.verify_absent(&req.password).await;
            warn!(email = %email, "login unknown email");
            return Err(AuthError::InvalidCredentials);
        }
        Err(e) => {
            error!(error = %e, "find_by_email failed");
            return Err(AuthError::Store(e));
        }
    };

    if !st.hasher.verify(&req.password, &user.password_hash).await {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AuthError::InvalidCredentials);
    }

    let token = st.keys.issue(user.id).map_err(|e| {
        error!(error = %e, "jwt sign failed");
        AuthError::Token(e)
    })?;

    info!(user_id = %user.id, "user logged in");
    Ok(token)
}

pub async fn profile(st: &AppState, user_id: Uuid) -> Result<PublicUser, AuthError> {
    match st.store.find_by_id(user_id).await {
        Ok(u) => Ok(u.into()),
        Err(StoreError::NotFound) => {
            warn!(user_id = %user_id, "token subject has no user");
            Err(AuthError::NotFound)
        }
        Err(e) => {
            error!(error = %e, user_id = %user_id, "find_by_id failed");
            Err(AuthError::Store(e))
        }
    }
}

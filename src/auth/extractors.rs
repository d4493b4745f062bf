use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, error::AppError};

/// Authenticated caller, produced only by a verified bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// Picks the token out of an Authorization header value.
/// `Bearer <token>` is stripped; any other non-empty value is taken as the raw token.
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    let value = header.filter(|v| !v.is_empty())?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.is_empty() => Some(token),
        _ => Some(value),
    }
}

pub fn authenticate(keys: &JwtKeys, header: Option<&str>) -> Result<AuthUser, AppError> {
    let token = bearer_token(header)
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

    match keys.verify(token) {
        Ok(claims) => Ok(AuthUser(claims.sub)),
        Err(_) => {
            warn!("invalid or expired token");
            Err(AppError::Unauthorized("Invalid or expired token".into()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        // Non UTF-8 values count as absent.
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());
        authenticate(&keys, header)
    }
}

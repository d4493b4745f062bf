use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::config::JwtConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("missing JWT secret")]
    MissingSecret,
    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("token lifetime of {0:?} does not fit a timestamp")]
    LifetimeOutOfRange(Duration),
    /// Expired, tampered and malformed tokens are indistinguishable to callers.
    #[error("invalid or expired token")]
    InvalidToken,
}

/// Holds the HMAC keys and token lifetime. Keys are absent when the secret is empty.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Option<EncodingKey>,
    decoding: Option<DecodingKey>,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        if secret.is_empty() {
            return Self {
                encoding: None,
                decoding: None,
                ttl,
            };
        }
        Self {
            encoding: Some(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Some(DecodingKey::from_secret(secret.as_bytes())),
            ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        let minutes = u64::try_from(cfg.ttl_minutes).unwrap_or(0);
        Self::new(&cfg.secret, Duration::from_secs(minutes.saturating_mul(60)))
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(user_id, OffsetDateTime::now_utc())
    }

    pub(crate) fn issue_at(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
    ) -> Result<String, TokenError> {
        let encoding = self.encoding.as_ref().ok_or(TokenError::MissingSecret)?;
        let exp = TimeDuration::try_from(self.ttl)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(TokenError::LifetimeOutOfRange(self.ttl))?;
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let decoding = self.decoding.as_ref().ok_or(TokenError::InvalidToken)?;
        let data = decode::<Claims>(token, decoding, &validation()).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::InvalidToken
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims)
    }
}

/// HMAC family only; anything else in the header is rejected before the signature is checked.
fn validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);
    validation
}

use std::{str::FromStr, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// One year; longer lifetimes are treated as misconfiguration.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub port: u16,
    pub ssl_mode: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
    pub acquire_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        let ssl_mode = PgSslMode::from_str(&self.ssl_mode)
            .with_context(|| format!("invalid DB_SSLMODE {:?}", self.ssl_mode))?;
        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(ssl_mode))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.max_lifetime_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub server: ServerConfig,
    pub hash_max_concurrent: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        let or_default =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let database = DatabaseConfig {
            host: required("DB_HOST")?,
            user: required("DB_USER")?,
            password: required("DB_PASSWORD")?,
            name: required("DB_NAME")?,
            port: parse("DB_PORT", &required("DB_PORT")?)?,
            ssl_mode: or_default("DB_SSLMODE", "disable"),
            max_connections: parse(
                "DB_MAX_CONNECTIONS",
                &or_default("DB_MAX_CONNECTIONS", "100"),
            )?,
            min_connections: parse("DB_MIN_CONNECTIONS", &or_default("DB_MIN_CONNECTIONS", "0"))?,
            idle_timeout_secs: parse(
                "DB_IDLE_TIMEOUT_SECS",
                &or_default("DB_IDLE_TIMEOUT_SECS", "600"),
            )?,
            max_lifetime_secs: parse(
                "DB_MAX_LIFETIME_SECS",
                &or_default("DB_MAX_LIFETIME_SECS", "3600"),
            )?,
            acquire_timeout_secs: parse(
                "DB_ACQUIRE_TIMEOUT_SECS",
                &or_default("DB_ACQUIRE_TIMEOUT_SECS", "30"),
            )?,
        };

        let jwt = JwtConfig {
            secret: required("JWT_SECRET")?,
            ttl_minutes: parse("JWT_TTL_MINUTES", &or_default("JWT_TTL_MINUTES", "1440"))?,
        };
        anyhow::ensure!(
            (1..=MAX_TOKEN_TTL_MINUTES).contains(&jwt.ttl_minutes),
            "JWT_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}, got {}",
            jwt.ttl_minutes
        );

        let server = ServerConfig {
            host: or_default("APP_HOST", "0.0.0.0"),
            port: parse("PORT", &or_default("PORT", "3001"))?,
            request_timeout_secs: parse(
                "REQUEST_TIMEOUT_SECS",
                &or_default("REQUEST_TIMEOUT_SECS", "10"),
            )?,
            shutdown_grace_secs: parse(
                "SHUTDOWN_GRACE_SECS",
                &or_default("SHUTDOWN_GRACE_SECS", "5"),
            )?,
        };

        let default_concurrency = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4)
            .to_string();
        let hash_max_concurrent: usize = parse(
            "HASH_MAX_CONCURRENT",
            &or_default("HASH_MAX_CONCURRENT", &default_concurrency),
        )?;
        anyhow::ensure!(hash_max_concurrent > 0, "HASH_MAX_CONCURRENT must be at least 1");

        Ok(Self {
            database,
            jwt,
            server,
            hash_max_concurrent,
        })
    }
}

fn parse<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("invalid value for {key}: {raw:?}"))
}

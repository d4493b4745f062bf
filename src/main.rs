use std::time::Duration;

mod app;
mod auth;
mod config;
mod db;
mod error;
mod state;

use crate::{config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "user_service=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let db = db::connect(&config.database).await?;
    db::migrate(&db).await?;

    let app_state = AppState::init(&config, db.clone());
    let app = app::build_app(
        app_state,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let result = app::serve(app, &config.server, app::shutdown_signal()).await;

    db::close(&db, Duration::from_secs(config.server.shutdown_grace_secs)).await;
    result
}

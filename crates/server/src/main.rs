mod admin;
mod bootstrap;
mod health;
mod site;
mod templates;
mod webhook;

use std::time::Duration;

use anyhow::Result;
use axum::Router;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use automarket_core::config::{AppConfig, LoadOptions};

use crate::bootstrap::AppState;

fn init_logging(config: &AppConfig) {
    use automarket_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

fn app_router(state: AppState) -> Router {
    let upload_dir = state.config.admin.upload_dir.clone();

    Router::new()
        .merge(health::router())
        .merge(site::router())
        .merge(webhook::router())
        .merge(admin::router())
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap(config).await?;
    let state = app.state.clone();

    let address =
        format!("{}:{}", state.config.server.bind_address, state.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(%address, "automarket-server listening");

    let grace = Duration::from_secs(state.config.server.graceful_shutdown_secs);
    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal(grace))
        .await?;

    // Telegram keeps retrying deliveries to a dead endpoint otherwise.
    if let Err(error) = app.api.delete_webhook().await {
        warn!(error = %error, "failed to remove telegram webhook during shutdown");
    }
    info!("automarket-server stopped");

    Ok(())
}

async fn shutdown_signal(grace: Duration) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(error = %error, "failed to listen for shutdown signal");
        return;
    }
    info!(grace_secs = grace.as_secs(), "shutdown signal received, draining connections");

    // In-flight requests get the configured grace period, then the process
    // goes down hard.
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        warn!("graceful shutdown grace period elapsed, exiting");
        std::process::exit(0);
    });
}

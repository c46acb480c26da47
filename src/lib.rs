pub mod audit;
pub mod call;
pub mod db;
pub mod markup;
pub mod menu;
pub mod reports;
pub mod session_store;
pub mod settings;
mod utils;

use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use log::{error, info};

use call::{
    commands::{call_status, incoming_call, menu_selection},
    NavigationEngine,
};
use db::Database;
use markup::{LamlRenderer, MarkupRenderer};
use menu::MenuCatalog;
use reports::commands::{call_logs_for_call, call_logs_for_caller, list_call_logs};
use session_store::{MemorySessionStore, SweepController};
use settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub engine: NavigationEngine,
    pub renderer: Arc<dyn MarkupRenderer>,
    pub db: Database,
    pub request_timeout: Duration,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Telephony webhooks
        .route("/api/ivr/main", post(incoming_call))
        .route("/api/ivr/menu", post(menu_selection))
        .route("/api/ivr/status", post(call_status))
        // Reporting
        .route("/api/call-logs", get(list_call_logs))
        .route("/api/call-logs/session/:call_sid", get(call_logs_for_call))
        .route("/api/call-logs/phone/:phone", get(call_logs_for_caller))
        .with_state(state)
}

pub async fn run() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    info!("IVR navigator starting up...");

    let settings = Settings::load().context("failed to load settings")?;
    let db = Database::new(settings.database_path.clone())?;
    let catalog = MenuCatalog::standard().context("menu tree failed validation")?;
    info!("menu catalog loaded with {} nodes", catalog.len());

    let store = MemorySessionStore::new(settings.expiry_policy());
    let mut sweep = SweepController::new();
    sweep.start(store.clone(), settings.sweep_interval())?;

    let engine = NavigationEngine::new(
        Arc::new(catalog),
        Arc::new(store),
        Arc::new(db.clone()),
        settings.action_target(),
    )
    .with_audit_timeout(settings.audit_timeout());
    let state = AppState {
        engine,
        renderer: Arc::new(LamlRenderer::from_settings(&settings.voice)),
        db,
        request_timeout: settings.request_timeout(),
    };

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;
    info!("listening on {}", settings.bind_addr);

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server terminated with an error")?;

    sweep.stop().await?;
    info!("IVR navigator stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("failed to listen for shutdown signal: {err}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use phonelist_core::{
    create_auth_services, load_config, notice_channel, validate_config, CatalogItem, NoticeKind,
    ProfileService, SqliteStore,
};
use phonelist_server::api::create_router;
use phonelist_server::state::AppState;

/// Buffer size for the notice channel
const NOTICE_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("PHONELIST_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        auth = ?config.auth.method,
        database = ?config.database.path,
        config_hash = &config_hash[..16],
        "Configuration loaded"
    );

    // Document store
    let store = Arc::new(
        SqliteStore::new(&config.database.path).context("Failed to open document store")?,
    );
    if let Some(seed_path) = &config.catalog.seed_path {
        let count = seed_catalog(&store, seed_path)?;
        info!("Imported {} catalog items from {:?}", count, seed_path);
    }

    // Authentication
    let auth = create_auth_services(&config.auth, &config.database)
        .context("Failed to create auth services")?;
    info!("Using authenticator: {}", auth.authenticator.method_name());

    // Notices are surfaced in the log
    let (notices, mut notice_rx) = notice_channel(NOTICE_BUFFER_SIZE);
    let notice_drain = tokio::spawn(async move {
        while let Some(notice) = notice_rx.recv().await {
            match notice.kind {
                NoticeKind::Info => info!(notice = %notice.message, "Notice"),
                NoticeKind::Error => warn!(notice = %notice.message, "Notice"),
            }
        }
    });

    let profiles = ProfileService::new(
        store.clone(),
        auth.identity_provider.clone(),
        notices.clone(),
    );
    let state = Arc::new(AppState::new(
        config.clone(),
        auth.authenticator,
        store,
        profiles,
        notices,
    ));

    if let Err(e) = state.catalog().load().await {
        warn!("Catalog not loaded at startup: {}", e);
    }

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    notice_drain.abort();
    Ok(())
}

/// Replace the catalog collection with the JSON array at `path`.
fn seed_catalog(store: &SqliteStore, path: &Path) -> Result<usize> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog seed {:?}", path))?;
    let items: Vec<CatalogItem> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid catalog seed {:?}", path))?;
    store
        .replace_catalog(&items)
        .context("Failed to import catalog")
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

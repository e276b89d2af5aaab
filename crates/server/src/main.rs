use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ticketdesk_core::{
    create_event_log, create_index_queue, load_config, lock::LockSettings, validate_config,
    AccessPolicy, ChannelGateway, CreationLock, DiscordGateway, FileEventLog, InactivitySweeper,
    JsonIndexStore, LifecycleSettings, PanelRegistry, PanelStore, SweeperSettings, TicketEvent,
    TicketManager, TranscriptStore,
};
use ticketdesk_server::{api::create_router, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Buffer size for the event log channel
const EVENT_BUFFER_SIZE: usize = 1000;

/// Buffer size for the index mutation queue
const INDEX_BUFFER_SIZE: usize = 256;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("TICKETDESK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    validate_config(&config).context("Configuration validation failed")?;
    info!("Configuration loaded successfully");

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash_short = &config_hash[..16];

    let data_dir = config.storage.data_dir.clone();
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("Failed to create data dir {:?}", data_dir))?;
    info!("Data directory: {:?}", data_dir);

    // Event log
    let (event_handle, event_writer) = create_event_log(
        Arc::new(FileEventLog::in_data_dir(&data_dir)),
        EVENT_BUFFER_SIZE,
    );
    let event_writer_handle = tokio::spawn(event_writer.run());
    event_handle
        .emit(TicketEvent::ServiceStarted {
            version: VERSION.to_string(),
            config_hash: config_hash_short.to_string(),
        })
        .await;

    // Ticket index
    let (index_handle, index_writer) = create_index_queue(
        Arc::new(JsonIndexStore::in_data_dir(&data_dir)),
        INDEX_BUFFER_SIZE,
    );
    let index_writer_handle = tokio::spawn(index_writer.run());
    info!("Ticket index: {:?}", data_dir.join("tickets").join("index.json"));

    let gateway: Arc<dyn ChannelGateway> = Arc::new(
        DiscordGateway::new(config.discord.clone()).context("Failed to create Discord gateway")?,
    );
    info!("Using channel gateway: {}", gateway.name());

    let lock = CreationLock::in_data_dir(&data_dir, LockSettings::from(&config.lock));
    let access = Arc::new(AccessPolicy::new(config.tickets.staff_role_ids.clone()));

    let manager = Arc::new(TicketManager::new(
        LifecycleSettings::from_config(&config),
        index_handle,
        gateway,
        TranscriptStore::new(&data_dir),
        lock,
        access,
        Some(event_handle.clone()),
    ));

    // Panels: static from config, dynamic from the data dir
    let panel_store = PanelStore::new(&data_dir);
    let panels = Arc::new(PanelRegistry::new(config.panels.clone()));
    match panel_store.list().await {
        Ok(dynamic) => {
            info!("Loaded {} dynamic panels", dynamic.len());
            panels.set_dynamic(dynamic).await;
        }
        Err(e) => warn!("Failed to load dynamic panels: {}", e),
    }

    let sweeper = InactivitySweeper::new(
        Arc::clone(&manager),
        SweeperSettings::from_config(&config),
    );
    sweeper.start();

    let state = Arc::new(AppState::new(
        config.clone(),
        manager,
        panels,
        panel_store,
        Some(event_handle.clone()),
    ));
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

    if sweeper.is_running() {
        sweeper.stop();
    }

    info!("Server shutting down...");
    event_handle
        .emit(TicketEvent::ServiceStopped {
            reason: "graceful_shutdown".to_string(),
        })
        .await;

    // The sweeper owns the last manager reference; dropping it closes the
    // index queue and the manager's event handle.
    drop(sweeper);
    drop(event_handle);

    let _ = index_writer_handle.await;
    let _ = event_writer_handle.await;
    info!("Writers stopped");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

//! Auction server entry point.

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use draftroom::config::{
    CATALOG_PATH_ENV, DEFAULT_CATALOG_PATH, DEFAULT_LISTEN_ADDR, LISTEN_ADDR_ENV,
};
use draftroom::error::EngineResult;
use draftroom::traits::ThreadRngSource;
use draftroom::{
    AuctionEngine, Catalog, ChannelNotifier, EngineConfig, EngineRuntime, SessionServer,
};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    init_logging();

    let config = EngineConfig::from_env();
    config.validate()?;

    let catalog_path =
        std::env::var(CATALOG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string());
    let catalog = Catalog::load(&catalog_path)?;
    info!(
        "loaded {} lots from {catalog_path}; roster capacity {}",
        catalog.len(),
        config.roster_capacity
    );

    let shutdown = CancellationToken::new();
    let notifier = ChannelNotifier::default();
    let engine = AuctionEngine::new(config, catalog, notifier.clone(), ThreadRngSource::new());
    let (runtime, handle) = EngineRuntime::new(engine, shutdown.clone());
    let runtime_task = tokio::spawn(runtime.run());

    let listen_addr =
        std::env::var(LISTEN_ADDR_ENV).unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
    let listener = TcpListener::bind(&listen_addr).await?;
    let server = SessionServer::new(handle, notifier, shutdown.clone());
    let server_task = tokio::spawn(server.run(listener));

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("cannot listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");
    shutdown.cancel();

    let _ = runtime_task.await;
    match server_task.await {
        Ok(result) => result?,
        Err(e) => error!("session server task failed: {e}"),
    }
    Ok(())
}

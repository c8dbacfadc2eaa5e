pub mod config;
pub mod db;
pub mod error;
pub mod slack;
pub mod spotify;
pub mod status;
pub mod sync;
pub mod telemetry;

use crate::db::CredentialStore;
use crate::db::repository::PgCredentialStore;
use crate::slack::client::{HttpSlackClient, SlackApi};
use crate::spotify::client::{HttpSpotifyClient, SpotifyApi};
use crate::sync::engine::SyncEngine;
use crate::sync::refresh::TokenRefresher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Wire everything together and run both schedulers until Ctrl-C.
pub async fn run(config: config::Config) -> anyhow::Result<()> {
    telemetry::init_tracing(&config.rust_log);

    let pool = db::init_pool(&config.database_url).await?;

    // One client, one timeout: no provider call outlives it.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let store: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));
    let spotify: Arc<dyn SpotifyApi> = Arc::new(HttpSpotifyClient::new(&config, http.clone())?);
    let slack: Arc<dyn SlackApi> = Arc::new(HttpSlackClient::new(&config.slack_api_url, http));

    let engine = Arc::new(SyncEngine::new(store.clone(), spotify.clone(), slack));
    let refresher = Arc::new(TokenRefresher::new(
        store,
        spotify,
        chrono::Duration::minutes(config.refresh_lookahead_mins),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sync_task = tokio::spawn(sync::run_sync_loop(
        engine,
        config.sync_interval_secs,
        shutdown_rx.clone(),
    ));
    let refresh_task = tokio::spawn(sync::run_refresh_loop(
        refresher,
        config.refresh_interval_secs,
        shutdown_rx,
    ));

    tracing::info!(
        sync_interval_secs = config.sync_interval_secs,
        refresh_interval_secs = config.refresh_interval_secs,
        "Schedulers started"
    );

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, waiting for in-flight ticks");

    shutdown_tx.send(true).ok();
    let _ = tokio::join!(sync_task, refresh_task);

    Ok(())
}

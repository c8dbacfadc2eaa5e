pub mod engine;
pub mod refresh;

use crate::sync::engine::SyncEngine;
use crate::sync::refresh::TokenRefresher;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

/// Drive the reconciliation engine on a fixed interval until shutdown.
///
/// Ticks never overlap: a batch that outruns the interval simply delays
/// the next tick, so cadence degrades gracefully under load. The tick in
/// flight always finishes before the loop exits.
pub async fn run_sync_loop(
    engine: Arc<SyncEngine>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        match engine.run_tick().await {
            Ok(report) => {
                if report.updated > 0 || !report.failures.is_empty() {
                    tracing::info!(
                        updated = report.updated,
                        unchanged = report.unchanged,
                        skipped = report.skipped,
                        torn_down = report.torn_down,
                        failed = report.failures.len(),
                        "Status sync tick finished"
                    );
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "Status sync tick aborted");
            }
        }
    }

    tracing::info!("Status sync loop stopped");
}

/// Drive the token refresher on its coarser interval until shutdown.
pub async fn run_refresh_loop(
    refresher: Arc<TokenRefresher>,
    interval_secs: u64,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {}
        }

        match refresher.run_once().await {
            Ok(report) => {
                if report.refreshed > 0 || !report.failures.is_empty() {
                    tracing::info!(
                        refreshed = report.refreshed,
                        failed = report.failures.len(),
                        "Token refresh pass finished"
                    );
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "Token refresh pass aborted");
            }
        }
    }

    tracing::info!("Token refresh loop stopped");
}

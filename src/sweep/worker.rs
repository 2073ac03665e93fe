use sqlx::PgPool;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::SweepConfig;
use crate::error::AppError;
use crate::services::{DeliveryClient, QueueService};

/// Runs the queue sweeper every `config.interval`. Returns `None` when the
/// interval is zero, leaving scheduling to an external caller of
/// `POST /process-whatsapp-queue`.
pub fn spawn_sweep_worker(
    pool: PgPool,
    client: Arc<dyn DeliveryClient>,
    config: SweepConfig,
) -> Option<JoinHandle<()>> {
    if config.interval.is_zero() {
        log::info!("Sweep worker disabled (SWEEP_INTERVAL_SECS=0)");
        return None;
    }

    log::info!("Starting sweep worker every {:?}", config.interval);

    Some(tokio::spawn(async move {
        let mut ticker = interval(config.interval);
        // A slow sweep must not be followed by a burst of catch-up sweeps
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            match QueueService::process_pending_queue(&pool, client.as_ref(), &config).await {
                Ok(summary) if summary.disabled => {}
                Ok(summary) => {
                    if summary.total > 0 {
                        log::debug!(
                            "Sweep worker: {} sent, {} errors of {}",
                            summary.processed,
                            summary.errors,
                            summary.total
                        );
                    }
                }
                Err(AppError::Configuration(msg)) => {
                    log::warn!("Sweep worker skipped: {}", msg);
                }
                Err(e) => {
                    log::error!("Sweep worker run failed: {}", e);
                }
            }
        }
    }))
}

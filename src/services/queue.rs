//! Queue sweeper: re-attempts every record that has not reached a
//! terminal state. Safe to re-run and to run concurrently with itself;
//! the per-record claim decides which invocation sends a given attempt.

use sqlx::PgPool;
use std::time::Instant;

use crate::config::SweepConfig;
use crate::error::{AppError, AppResult};
use crate::models::{triggered_from, IntegrationState, SweepSummary};
use crate::services::delivery::{attempt_delivery, AttemptOutcome};
use crate::services::notification::NotificationService;
use crate::services::settings::SettingsService;
use crate::services::webhook::{DeliveryClient, DeliveryTarget};

pub struct QueueService;

impl QueueService {
    /// Processes pending and retry records, returning aggregate counts
    pub async fn process_pending_queue(
        pool: &PgPool,
        client: &dyn DeliveryClient,
        config: &SweepConfig,
    ) -> AppResult<SweepSummary> {
        let started = Instant::now();

        let settings = SettingsService::load(pool).await?;
        let webhook_url = match settings.integration_state() {
            IntegrationState::Disabled => {
                log::debug!("WhatsApp integration disabled, queue sweep skipped");
                return Ok(SweepSummary {
                    disabled: true,
                    ..Default::default()
                });
            }
            IntegrationState::Misconfigured => {
                return Err(AppError::Configuration(
                    "n8n webhook URL is not configured".to_string(),
                ))
            }
            IntegrationState::Enabled(url) => url,
        };
        let target = DeliveryTarget::new(webhook_url, settings.webhook_secret.clone());

        let mut summary = SweepSummary::default();

        match NotificationService::fail_exhausted(pool).await {
            Ok(0) => {}
            Ok(repaired) => {
                log::warn!("Marked {} stranded notifications as failed", repaired);
                summary.repaired = repaired;
            }
            Err(e) => log::error!("Failed to repair stranded notifications: {}", e),
        }

        let records = NotificationService::select_deliverable(pool, config.batch_size).await?;
        summary.total = records.len();

        for record in &records {
            if started.elapsed() >= config.deadline {
                summary.deadline_reached = true;
                log::warn!(
                    "Queue sweep deadline of {:?} reached, leaving remaining records for the next sweep",
                    config.deadline
                );
                break;
            }

            match attempt_delivery(
                pool,
                client,
                &target,
                record,
                triggered_from::QUEUE_PROCESSOR,
            )
            .await
            {
                Ok(AttemptOutcome::Sent) => summary.processed += 1,
                Ok(AttemptOutcome::Retry) | Ok(AttemptOutcome::Failed) => summary.errors += 1,
                Ok(AttemptOutcome::Skipped) | Ok(AttemptOutcome::AlreadyFinal(_)) => {
                    summary.skipped += 1
                }
                Err(e) => {
                    summary.errors += 1;
                    log::error!("Failed to process notification {}: {}", record.id, e);
                }
            }
        }

        log::info!(
            "Queue sweep finished: {} sent, {} errors, {} skipped, {} selected in {:?}",
            summary.processed,
            summary.errors,
            summary.skipped,
            summary.total,
            started.elapsed()
        );

        Ok(summary)
    }
}

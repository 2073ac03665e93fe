//! One delivery attempt for one record: claim, send, finalize.
//!
//! Shared by the immediate dispatcher and the queue sweeper so both paths
//! move records through the same state machine.

use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{NotificationRecord, NotificationStatus, MISSING_DESTINATION_ERROR};
use crate::services::notification::NotificationService;
use crate::services::webhook::{DeliveryClient, DeliveryError, DeliveryTarget};

/// What happened to a record during one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Sent,
    /// Failed, attempts remain
    Retry,
    /// Failed on the last allowed attempt, or never deliverable
    Failed,
    /// Claimed by another invocation first
    Skipped,
    /// Record was already terminal; nothing was sent
    AlreadyFinal(NotificationStatus),
}

impl AttemptOutcome {
    fn from_status(status: NotificationStatus) -> Self {
        match status {
            NotificationStatus::Sent => AttemptOutcome::Sent,
            NotificationStatus::Failed => AttemptOutcome::Failed,
            NotificationStatus::Retry | NotificationStatus::Pending => AttemptOutcome::Retry,
        }
    }
}

/// Attempts delivery of `record` to `target`
pub async fn attempt_delivery(
    pool: &PgPool,
    client: &dyn DeliveryClient,
    target: &DeliveryTarget,
    record: &NotificationRecord,
    triggered_from: &str,
) -> AppResult<AttemptOutcome> {
    if record.status.is_terminal() {
        return Ok(AttemptOutcome::AlreadyFinal(record.status));
    }

    let Some(claimed) = NotificationService::claim(pool, record, &target.url).await? else {
        log::debug!(
            "Notification {} was claimed elsewhere, skipping",
            record.id
        );
        return Ok(AttemptOutcome::Skipped);
    };

    let result = match claimed.to_payload(triggered_from) {
        Some(payload) => client.deliver(target, &payload).await,
        None => Err(DeliveryError::new(MISSING_DESTINATION_ERROR, None)),
    };

    let status = NotificationService::finalize(pool, &claimed, &result).await?;

    match &result {
        Ok(receipt) => log::info!(
            "Notification {} sent (order {}, product {}, HTTP {})",
            claimed.id,
            claimed.order_id,
            claimed.product_id,
            receipt.http_status
        ),
        Err(e) => log::warn!(
            "Notification {} attempt {}/{} failed, now {}: {}",
            claimed.id,
            claimed.attempts,
            claimed.max_attempts,
            status,
            e
        ),
    }

    Ok(AttemptOutcome::from_status(status))
}

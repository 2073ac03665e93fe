//! Notification record store.
//!
//! All state changes are single-row conditional updates. A delivery attempt
//! is split into a claim (bump `attempts` if nobody else has) and a
//! finalize (set the outcome if the row is still at the claimed attempt),
//! which keeps two concurrent sweeps from both sending the same attempt.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{NewNotification, NotificationRecord, NotificationStats, NotificationStatus};
use crate::services::webhook::{storable_text, DeliveryResult, MAX_ERROR_LEN};

const RECORD_COLUMNS: &str = r#"
    id, order_id, user_id, product_id, whatsapp_number, message,
    message_template, webhook_url, last_webhook_url, customer_name, customer_email,
    product_title, status, attempts, max_attempts, sent_at,
    error_message, http_status_code, last_attempt_at, claimed_until,
    created_at
"#;

/// Lease taken by a claim. Longer than any webhook timeout; once it lapses
/// without a finalize the attempt is treated as abandoned.
const CLAIM_LEASE_MINUTES: i32 = 15;

pub struct NotificationService;

impl NotificationService {
    /// Inserts a record, or returns the existing one for the same
    /// (order, product). The flag is true when a row was created.
    pub async fn insert(
        pool: &PgPool,
        input: &NewNotification,
        status: NotificationStatus,
        error_message: Option<&str>,
    ) -> AppResult<(NotificationRecord, bool)> {
        let query = format!(
            r#"
            INSERT INTO whatsapp_notifications (
                order_id, user_id, product_id, whatsapp_number, message,
                message_template, webhook_url, customer_name, customer_email,
                product_title, status, attempts, max_attempts, error_message
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11::text::varchar, 0, $12, $13)
            ON CONFLICT ON CONSTRAINT whatsapp_notifications_order_product_key DO NOTHING
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );

        let inserted = sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(&input.order_id)
            .bind(&input.user_id)
            .bind(&input.product_id)
            .bind(&input.whatsapp_number)
            .bind(&input.message)
            .bind(&input.message_template)
            .bind(&input.webhook_url)
            .bind(&input.customer_name)
            .bind(&input.customer_email)
            .bind(&input.product_title)
            .bind(status.to_string())
            .bind(input.max_attempts)
            .bind(error_message)
            .fetch_optional(pool)
            .await?;

        match inserted {
            Some(record) => Ok((record, true)),
            None => {
                let existing =
                    Self::get_by_order_product(pool, &input.order_id, &input.product_id).await?;
                Ok((existing, false))
            }
        }
    }

    /// Gets a record by ID
    pub async fn get(pool: &PgPool, id: Uuid) -> AppResult<NotificationRecord> {
        let query = format!(
            "SELECT {} FROM whatsapp_notifications WHERE id = $1",
            RECORD_COLUMNS
        );

        sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Notification {} not found", id)))
    }

    /// Gets the record for an (order, product) pair
    pub async fn get_by_order_product(
        pool: &PgPool,
        order_id: &str,
        product_id: &str,
    ) -> AppResult<NotificationRecord> {
        let query = format!(
            "SELECT {} FROM whatsapp_notifications WHERE order_id = $1 AND product_id = $2",
            RECORD_COLUMNS
        );

        sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(order_id)
            .bind(product_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Notification for order {} product {} not found",
                    order_id, product_id
                ))
            })
    }

    /// Lists recent records, newest first
    pub async fn list(
        pool: &PgPool,
        status: Option<NotificationStatus>,
        limit: i64,
    ) -> AppResult<Vec<NotificationRecord>> {
        let query = format!(
            r#"
            SELECT {}
            FROM whatsapp_notifications
            WHERE ($1::varchar IS NULL OR status = $1::varchar)
            ORDER BY created_at DESC, id
            LIMIT $2
            "#,
            RECORD_COLUMNS
        );

        let records = sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(status.map(|s| s.to_string()))
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(records)
    }

    /// Lists every record of an order
    pub async fn list_for_order(
        pool: &PgPool,
        order_id: &str,
    ) -> AppResult<Vec<NotificationRecord>> {
        let query = format!(
            "SELECT {} FROM whatsapp_notifications WHERE order_id = $1 ORDER BY created_at, product_id",
            RECORD_COLUMNS
        );

        let records = sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await?;

        Ok(records)
    }

    /// Counts records per status
    pub async fn stats(pool: &PgPool) -> AppResult<NotificationStats> {
        let rows: Vec<(NotificationStatus, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM whatsapp_notifications GROUP BY status",
        )
        .fetch_all(pool)
        .await?;

        let mut stats = NotificationStats::default();
        for (status, count) in rows {
            match status {
                NotificationStatus::Pending => stats.pending = count,
                NotificationStatus::Sent => stats.sent = count,
                NotificationStatus::Failed => stats.failed = count,
                NotificationStatus::Retry => stats.retry = count,
            }
            stats.total += count;
        }

        Ok(stats)
    }

    /// Selects records still eligible for delivery, oldest first
    pub async fn select_deliverable(
        pool: &PgPool,
        limit: i64,
    ) -> AppResult<Vec<NotificationRecord>> {
        let query = format!(
            r#"
            SELECT {}
            FROM whatsapp_notifications
            WHERE status IN ('pending', 'retry')
              AND attempts < max_attempts
              AND whatsapp_number IS NOT NULL
              AND (claimed_until IS NULL OR claimed_until < NOW())
            ORDER BY created_at, id
            LIMIT $1
            "#,
            RECORD_COLUMNS
        );

        let records = sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(limit)
            .fetch_all(pool)
            .await?;

        Ok(records)
    }

    /// Reserves the next attempt of a record. Returns `None` when the row
    /// moved on since it was read (another invocation claimed it, or it is
    /// no longer deliverable).
    pub async fn claim(
        pool: &PgPool,
        record: &NotificationRecord,
        webhook_url: &str,
    ) -> AppResult<Option<NotificationRecord>> {
        let query = format!(
            r#"
            UPDATE whatsapp_notifications
            SET attempts = attempts + 1,
                last_attempt_at = NOW(),
                claimed_until = NOW() + make_interval(mins => $4),
                last_webhook_url = $3
            WHERE id = $1
              AND attempts = $2
              AND attempts < max_attempts
              AND status IN ('pending', 'retry')
              AND (claimed_until IS NULL OR claimed_until < NOW())
            RETURNING {}
            "#,
            RECORD_COLUMNS
        );

        let claimed = sqlx::query_as::<_, NotificationRecord>(&query)
            .bind(record.id)
            .bind(record.attempts)
            .bind(webhook_url)
            .bind(CLAIM_LEASE_MINUTES)
            .fetch_optional(pool)
            .await?;

        Ok(claimed)
    }

    /// Stores the outcome of a claimed attempt and returns the new status
    pub async fn finalize(
        pool: &PgPool,
        claimed: &NotificationRecord,
        result: &DeliveryResult,
    ) -> AppResult<NotificationStatus> {
        let status = NotificationStatus::after_attempt(
            claimed.attempts,
            claimed.max_attempts,
            result.is_ok(),
        );

        let (error_message, http_status) = match result {
            Ok(receipt) => (None, Some(receipt.http_status)),
            Err(e) => (Some(storable_text(&e.message, MAX_ERROR_LEN)), e.http_status),
        };

        let updated = sqlx::query(
            r#"
            UPDATE whatsapp_notifications
            SET status = $3::text::varchar,
                sent_at = CASE WHEN $3 = 'sent' THEN NOW() ELSE sent_at END,
                error_message = $4,
                http_status_code = $5,
                claimed_until = NULL
            WHERE id = $1
              AND attempts = $2
              AND status IN ('pending', 'retry')
            "#,
        )
        .bind(claimed.id)
        .bind(claimed.attempts)
        .bind(status.to_string())
        .bind(error_message)
        .bind(http_status.map(i32::from))
        .execute(pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::Internal(format!(
                "Notification {} changed while attempt {} was in flight",
                claimed.id, claimed.attempts
            )));
        }

        Ok(status)
    }

    /// Marks rows that used every attempt but were never finalized (their
    /// claim lease lapsed) as failed. Returns the number of rows repaired.
    pub async fn fail_exhausted(pool: &PgPool) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE whatsapp_notifications
            SET status = 'failed',
                error_message = COALESCE(error_message, 'delivery attempts exhausted')
            WHERE status IN ('pending', 'retry')
              AND attempts >= max_attempts
              AND (claimed_until IS NULL OR claimed_until < NOW())
            "#,
        )
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

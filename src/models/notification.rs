//! Notification record models.
//!
//! A notification record is one durable work item: one purchase-confirmation
//! message, for one product of one order, to one recipient. It is both the
//! delivery queue and the audit log read by the admin screen.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Default number of delivery attempts before a record is marked failed
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

/// Error text stored when the recipient has no WhatsApp number on file
pub const MISSING_DESTINATION_ERROR: &str = "destination not provided";

// =============================================================================
// Notification Status Enum
// =============================================================================

/// Delivery status of a notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Failed,
    Retry,
}

impl NotificationStatus {
    /// `sent` and `failed` records are never processed again
    pub fn is_terminal(self) -> bool {
        matches!(self, NotificationStatus::Sent | NotificationStatus::Failed)
    }

    /// Status after a delivery attempt, given the attempt counter *after*
    /// the increment for that attempt.
    pub fn after_attempt(attempts: i32, max_attempts: i32, delivered: bool) -> Self {
        if delivered {
            NotificationStatus::Sent
        } else if attempts >= max_attempts {
            NotificationStatus::Failed
        } else {
            NotificationStatus::Retry
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationStatus::Pending => write!(f, "pending"),
            NotificationStatus::Sent => write!(f, "sent"),
            NotificationStatus::Failed => write!(f, "failed"),
            NotificationStatus::Retry => write!(f, "retry"),
        }
    }
}

impl std::str::FromStr for NotificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(NotificationStatus::Pending),
            "sent" => Ok(NotificationStatus::Sent),
            "failed" => Ok(NotificationStatus::Failed),
            "retry" => Ok(NotificationStatus::Retry),
            other => Err(format!("Unknown notification status '{}'", other)),
        }
    }
}

// =============================================================================
// Notification Record Model
// =============================================================================

/// A row of `whatsapp_notifications`
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct NotificationRecord {
    pub id: Uuid,
    pub order_id: String,
    pub user_id: String,
    pub product_id: String,
    pub whatsapp_number: Option<String>,
    pub message: String,
    pub message_template: String,
    /// Endpoint configured when the record was created
    pub webhook_url: String,
    /// Endpoint of the most recent attempt
    pub last_webhook_url: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub product_title: String,
    pub status: NotificationStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
    pub http_status_code: Option<i32>,
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Set while an attempt is in flight
    pub claimed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    /// Builds the outbound webhook body from the snapshotted fields
    pub fn to_payload(&self, triggered_from: &str) -> Option<WebhookPayload> {
        let whatsapp_number = self.whatsapp_number.clone()?;

        Some(WebhookPayload {
            notification_id: self.id.to_string(),
            whatsapp_number,
            message: self.message.clone(),
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            product_title: self.product_title.clone(),
            order_id: self.order_id.clone(),
            user_id: self.user_id.clone(),
            timestamp: Utc::now(),
            triggered_from: triggered_from.to_string(),
        })
    }
}

/// Values for inserting a new notification record
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub order_id: String,
    pub user_id: String,
    pub product_id: String,
    pub whatsapp_number: Option<String>,
    pub message: String,
    pub message_template: String,
    pub webhook_url: String,
    pub customer_name: String,
    pub customer_email: String,
    pub product_title: String,
    pub max_attempts: i32,
}

// =============================================================================
// Webhook Payload
// =============================================================================

/// Where a delivery attempt originated
pub mod triggered_from {
    pub const ORDER_COMPLETED: &str = "order_completed";
    pub const QUEUE_PROCESSOR: &str = "queue_processor";
    pub const SETTINGS_TEST: &str = "settings_test";
}

/// JSON body POSTed to the automation webhook
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookPayload {
    /// Record id, usable by the destination to deduplicate
    pub notification_id: String,
    pub whatsapp_number: String,
    pub message: String,
    pub customer_name: String,
    pub customer_email: String,
    pub product_title: String,
    pub order_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub triggered_from: String,
}

// =============================================================================
// Request / Response DTOs
// =============================================================================

/// Body of `POST /send-whatsapp-notification`
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    pub order_id: String,
    pub user_id: String,
    #[serde(default)]
    pub product_ids: Vec<String>,
}

/// Outcome of an immediate dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Products for which a record was created or processed
    pub products_processed: usize,
    /// The integration was switched off; nothing was done
    pub disabled: bool,
}

/// Outcome of one queue sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Records delivered successfully
    pub processed: usize,
    /// Records whose attempt failed or errored
    pub errors: usize,
    /// Records claimed by a concurrent sweep before this one got to them
    pub skipped: usize,
    /// Records selected as eligible
    pub total: usize,
    /// Stranded records moved to `failed` by the repair step
    pub repaired: u64,
    pub disabled: bool,
    pub deadline_reached: bool,
}

/// Query string for the admin log viewer
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub status: Option<NotificationStatus>,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}

/// Record counts per status
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct NotificationStats {
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
    pub retry: i64,
    pub total: i64,
}

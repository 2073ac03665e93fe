//! Outbound delivery to the automation webhook.
//!
//! The dispatcher and the sweeper only talk to [`DeliveryClient`], so tests
//! can script delivery outcomes without an HTTP server. One call is one
//! attempt; retrying is the sweeper's job.

pub mod client;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};
use crate::models::WebhookPayload;

pub use client::WebhookClient;

/// Longest error text stored on a notification record
pub const MAX_ERROR_LEN: usize = 500;

/// Endpoint plus optional signing secret, taken from the settings loaded for
/// the current invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub url: String,
    pub secret: Option<String>,
}

impl DeliveryTarget {
    pub fn new(url: impl Into<String>, secret: Option<String>) -> Self {
        Self {
            url: url.into(),
            secret,
        }
    }
}

/// Successful delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub http_status: u16,
}

/// Failed delivery: non-2xx response or transport failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DeliveryError {
    /// HTTP status, when the endpoint answered at all
    pub http_status: Option<u16>,
    pub message: String,
}

impl DeliveryError {
    pub fn new(message: impl Into<String>, http_status: Option<u16>) -> Self {
        Self {
            http_status,
            message: storable_text(&message.into(), MAX_ERROR_LEN),
        }
    }
}

pub type DeliveryResult = Result<DeliveryReceipt, DeliveryError>;

#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Performs exactly one delivery attempt
    async fn deliver(&self, target: &DeliveryTarget, payload: &WebhookPayload) -> DeliveryResult;
}

/// Checks that a webhook URL is an absolute http(s) URL
pub fn validate_endpoint(url: &str) -> AppResult<()> {
    let parsed = url::Url::parse(url)
        .map_err(|_| AppError::Validation("Invalid webhook URL format".to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::Validation(
            "Webhook URL must use HTTP or HTTPS".to_string(),
        ));
    }

    Ok(())
}

/// Text safe to store in a Postgres TEXT column: NUL (which Postgres
/// rejects) and other control characters except newline and tab become
/// U+FFFD, and the result is cut to `max` characters.
pub fn storable_text(text: &str, max: usize) -> String {
    let cleaned: String = text
        .chars()
        .map(|c| {
            if c.is_control() && c != '\n' && c != '\t' {
                char::REPLACEMENT_CHARACTER
            } else {
                c
            }
        })
        .collect();
    truncate(&cleaned, max)
}

/// Cuts `text` to at most `max` characters, marking the cut
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

//! reqwest-backed webhook delivery.
//!
//! Sends the payload as an HTTP POST with a JSON body. When the settings
//! carry a secret, the body is signed with HMAC-SHA256.

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::Duration;

use super::{
    DeliveryClient, DeliveryError, DeliveryReceipt, DeliveryResult, DeliveryTarget, MAX_ERROR_LEN,
};
use crate::error::{AppError, AppResult};
use crate::models::WebhookPayload;

type HmacSha256 = Hmac<Sha256>;

/// Bytes of an error response kept; enough for `MAX_ERROR_LEN` characters
/// of 4-byte UTF-8
const MAX_ERROR_BODY_BYTES: usize = MAX_ERROR_LEN * 4;

/// Webhook delivery client
pub struct WebhookClient {
    client: reqwest::Client,
}

impl WebhookClient {
    /// Creates a client whose every request is bounded by `timeout`
    pub fn new(timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(10)))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Generates HMAC-SHA256 signature for webhook payload
    pub(crate) fn generate_signature(
        secret: &str,
        timestamp: &str,
        payload: &[u8],
    ) -> AppResult<String> {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| AppError::Internal(format!("Invalid signing key: {}", e)))?;
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

#[async_trait]
impl DeliveryClient for WebhookClient {
    async fn deliver(&self, target: &DeliveryTarget, payload: &WebhookPayload) -> DeliveryResult {
        let body = serde_json::to_vec(payload)
            .map_err(|e| DeliveryError::new(format!("Failed to serialize payload: {}", e), None))?;

        let timestamp = Utc::now().timestamp().to_string();

        let mut request = self
            .client
            .post(&target.url)
            .header("Content-Type", "application/json")
            .header("X-Notification-Id", &payload.notification_id)
            .header("X-Timestamp", &timestamp);

        if let Some(ref secret) = target.secret {
            let signature = Self::generate_signature(secret, &timestamp, &body)
                .map_err(|e| DeliveryError::new(e.to_string(), None))?;
            request = request.header("X-Signature", format!("sha256={}", signature));
        }

        match request.body(body).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                if response.status().is_success() {
                    Ok(DeliveryReceipt { http_status: status })
                } else {
                    let error_body = read_body_prefix(response, MAX_ERROR_BODY_BYTES).await;
                    let error_msg = if error_body.trim().is_empty() {
                        format!("HTTP {}", status)
                    } else {
                        format!("HTTP {}: {}", status, error_body.trim())
                    };
                    Err(DeliveryError::new(error_msg, Some(status)))
                }
            }
            Err(e) => {
                let error_msg = if e.is_timeout() {
                    "Request timed out".to_string()
                } else if e.is_connect() {
                    "Connection failed".to_string()
                } else {
                    format!("Request failed: {}", e)
                };
                Err(DeliveryError::new(error_msg, None))
            }
        }
    }
}

/// Reads at most `limit` bytes of a response body, decoding lossily.
/// Read errors end the body early rather than failing the attempt.
async fn read_body_prefix(mut response: reqwest::Response, limit: usize) -> String {
    let mut buf: Vec<u8> = Vec::new();

    while buf.len() < limit {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                let take = chunk.len().min(limit - buf.len());
                buf.extend_from_slice(&chunk[..take]);
            }
            Ok(None) | Err(_) => break,
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}

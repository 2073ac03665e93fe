//! Typed view over the `app_settings` key/value table.
//!
//! Every value in the table is a loosely typed JSON blob (a boolean may be
//! stored as `true`, `"true"` or `"1"`). They are parsed once here, with an
//! explicit default per field, so the dispatch paths only ever see
//! [`WhatsappSettings`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::notification::DEFAULT_MAX_ATTEMPTS;

pub const KEY_ENABLED: &str = "n8n_enabled";
pub const KEY_WEBHOOK_URL: &str = "n8n_webhook_url";
pub const KEY_WEBHOOK_SECRET: &str = "n8n_webhook_secret";
pub const KEY_MESSAGE_TEMPLATE: &str = "whatsapp_message_template";
pub const KEY_DELAY_MINUTES: &str = "whatsapp_delay_minutes";
pub const KEY_MAX_ATTEMPTS: &str = "whatsapp_max_attempts";

/// All keys read by the notifier
pub const SETTING_KEYS: [&str; 6] = [
    KEY_ENABLED,
    KEY_WEBHOOK_URL,
    KEY_WEBHOOK_SECRET,
    KEY_MESSAGE_TEMPLATE,
    KEY_DELAY_MINUTES,
    KEY_MAX_ATTEMPTS,
];

pub const DEFAULT_MESSAGE_TEMPLATE: &str =
    "Hi {nome}! Your purchase of {produto} is confirmed. Access your content at {link_area_membros}";

const MAX_ATTEMPTS_CEILING: i32 = 10;

// =============================================================================
// Integration State
// =============================================================================

/// Whether the webhook integration can be used right now
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrationState {
    /// Enable flag false or absent
    Disabled,
    /// Enabled but no webhook URL configured
    Misconfigured,
    /// Enabled, with the endpoint to deliver to
    Enabled(String),
}

impl IntegrationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationState::Disabled => "disabled",
            IntegrationState::Misconfigured => "misconfigured",
            IntegrationState::Enabled(_) => "enabled",
        }
    }
}

// =============================================================================
// WhatsApp Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhatsappSettings {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub message_template: String,
    /// Scheduling hint for the external trigger; not enforced here
    pub delay_minutes: u32,
    pub max_attempts: i32,
}

impl Default for WhatsappSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            webhook_url: None,
            webhook_secret: None,
            message_template: DEFAULT_MESSAGE_TEMPLATE.to_string(),
            delay_minutes: 0,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl WhatsappSettings {
    /// Builds settings from raw key/value rows. Unknown keys are ignored and
    /// unparsable values fall back to the field default.
    pub fn from_entries(entries: &HashMap<String, Value>) -> Self {
        let defaults = Self::default();

        Self {
            enabled: entries.get(KEY_ENABLED).map(parse_bool).unwrap_or(false),
            webhook_url: entries.get(KEY_WEBHOOK_URL).and_then(parse_text),
            webhook_secret: entries.get(KEY_WEBHOOK_SECRET).and_then(parse_text),
            message_template: entries
                .get(KEY_MESSAGE_TEMPLATE)
                .and_then(parse_text)
                .unwrap_or(defaults.message_template),
            delay_minutes: entries
                .get(KEY_DELAY_MINUTES)
                .and_then(parse_number)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(defaults.delay_minutes),
            max_attempts: entries
                .get(KEY_MAX_ATTEMPTS)
                .and_then(parse_number)
                .map(|n| n.clamp(1, MAX_ATTEMPTS_CEILING as i64) as i32)
                .unwrap_or(defaults.max_attempts),
        }
    }

    pub fn integration_state(&self) -> IntegrationState {
        if !self.enabled {
            return IntegrationState::Disabled;
        }

        match &self.webhook_url {
            Some(url) => IntegrationState::Enabled(url.clone()),
            None => IntegrationState::Misconfigured,
        }
    }

    /// Response body for the settings screen (secret redacted)
    pub fn to_response(&self) -> SettingsResponse {
        SettingsResponse {
            enabled: self.enabled,
            webhook_url: self.webhook_url.clone(),
            has_webhook_secret: self.webhook_secret.is_some(),
            message_template: self.message_template.clone(),
            delay_minutes: self.delay_minutes,
            max_attempts: self.max_attempts,
            state: self.integration_state().as_str(),
        }
    }
}

/// Strips one level of JSON string encoding: values written by older
/// clients were sometimes stored as `"\"true\""`.
fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .map(str::trim)
        .unwrap_or(s)
}

fn parse_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => matches!(
            unquote(s).to_ascii_lowercase().as_str(),
            "true" | "1" | "yes" | "on"
        ),
        _ => false,
    }
}

fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = unquote(s);
            (!s.is_empty()).then(|| s.to_string())
        }
        _ => None,
    }
}

fn parse_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => unquote(s).parse().ok(),
        _ => None,
    }
}

// =============================================================================
// DTOs
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub has_webhook_secret: bool,
    pub message_template: String,
    pub delay_minutes: u32,
    pub max_attempts: i32,
    pub state: &'static str,
}

/// Partial settings update; absent fields are left unchanged. An empty
/// string clears a text setting.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateSettings {
    pub enabled: Option<bool>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<String>,
    pub message_template: Option<String>,
    pub delay_minutes: Option<u32>,
    pub max_attempts: Option<i32>,
}

impl UpdateSettings {
    /// Key/value pairs to upsert
    pub fn into_entries(self) -> Vec<(&'static str, Value)> {
        let mut entries = Vec::new();

        if let Some(enabled) = self.enabled {
            entries.push((KEY_ENABLED, Value::Bool(enabled)));
        }
        if let Some(url) = self.webhook_url {
            entries.push((KEY_WEBHOOK_URL, Value::String(url.trim().to_string())));
        }
        if let Some(secret) = self.webhook_secret {
            entries.push((KEY_WEBHOOK_SECRET, Value::String(secret)));
        }
        if let Some(template) = self.message_template {
            entries.push((KEY_MESSAGE_TEMPLATE, Value::String(template)));
        }
        if let Some(delay) = self.delay_minutes {
            entries.push((KEY_DELAY_MINUTES, Value::String(delay.to_string())));
        }
        if let Some(max) = self.max_attempts {
            entries.push((KEY_MAX_ATTEMPTS, Value::from(max)));
        }

        entries
    }
}

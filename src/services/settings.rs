use serde_json::Value;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::settings::{KEY_MAX_ATTEMPTS, KEY_WEBHOOK_URL, SETTING_KEYS};
use crate::models::{UpdateSettings, WhatsappSettings};
use crate::services::webhook::validate_endpoint;

pub struct SettingsService;

impl SettingsService {
    /// Reads the notifier settings. Always hits the table; callers load
    /// once per invocation so a disable takes effect on the next request.
    pub async fn load(pool: &PgPool) -> AppResult<WhatsappSettings> {
        let rows: Vec<(String, Value)> =
            sqlx::query_as("SELECT key, value FROM app_settings WHERE key = ANY($1)")
                .bind(&SETTING_KEYS[..])
                .fetch_all(pool)
                .await?;

        let entries: HashMap<String, Value> = rows.into_iter().collect();
        Ok(WhatsappSettings::from_entries(&entries))
    }

    /// Sets a single raw value
    pub async fn set(pool: &PgPool, key: &str, value: &Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO app_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Applies a partial update and returns the resulting settings
    pub async fn update(pool: &PgPool, input: UpdateSettings) -> AppResult<WhatsappSettings> {
        if let Some(url) = input.webhook_url.as_deref().map(str::trim) {
            if !url.is_empty() {
                validate_endpoint(url)?;
            }
        }
        if let Some(max) = input.max_attempts {
            if !(1..=10).contains(&max) {
                return Err(AppError::Validation(
                    "max_attempts must be between 1 and 10".to_string(),
                ));
            }
        }

        for (key, value) in input.into_entries() {
            Self::set(pool, key, &value).await?;
            log::info!(
                "Setting '{}' updated{}",
                key,
                if key == KEY_WEBHOOK_URL || key == KEY_MAX_ATTEMPTS {
                    format!(" to {}", value)
                } else {
                    String::new()
                }
            );
        }

        Self::load(pool).await
    }
}

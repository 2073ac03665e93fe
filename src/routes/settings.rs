//! Settings routes for the admin WhatsApp screen.
//!
//! - GET /whatsapp-settings - Current settings and integration state
//! - PUT /whatsapp-settings - Partial update
//! - POST /whatsapp-settings/test - Send a sample payload to the webhook

use actix_web::{web, HttpResponse};
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{triggered_from, IntegrationState, UpdateSettings, WebhookPayload};
use crate::services::renderer::{render, MessageFields};
use crate::services::{DeliveryClient, DeliveryTarget, SettingsService};

/// GET /whatsapp-settings
pub async fn get_settings(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let settings = SettingsService::load(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(settings.to_response()))
}

/// PUT /whatsapp-settings
pub async fn update_settings(
    pool: web::Data<DbPool>,
    body: web::Json<UpdateSettings>,
) -> AppResult<HttpResponse> {
    let settings = SettingsService::update(pool.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(settings.to_response()))
}

/// POST /whatsapp-settings/test
///
/// Works while the integration is disabled so an operator can check the
/// endpoint before switching it on. No record is created.
pub async fn test_webhook(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    client: web::Data<dyn DeliveryClient>,
) -> AppResult<HttpResponse> {
    let settings = SettingsService::load(pool.get_ref()).await?;

    let url = match (settings.integration_state(), &settings.webhook_url) {
        (IntegrationState::Enabled(url), _) => url,
        (_, Some(url)) => url.clone(),
        (_, None) => {
            return Err(AppError::Configuration(
                "n8n webhook URL is not configured".to_string(),
            ))
        }
    };

    let fields = MessageFields::new(
        Some("Test Customer"),
        "Test Product",
        Some("test@example.com"),
        &config.dispatch.member_area_url,
    );

    let payload = WebhookPayload {
        notification_id: Uuid::new_v4().to_string(),
        whatsapp_number: "5500000000000".to_string(),
        message: render(&settings.message_template, &fields),
        customer_name: fields.recipient_name.clone(),
        customer_email: fields.recipient_email.clone(),
        product_title: fields.product_label.clone(),
        order_id: "test-order".to_string(),
        user_id: "test-user".to_string(),
        timestamp: Utc::now(),
        triggered_from: triggered_from::SETTINGS_TEST.to_string(),
    };

    let target = DeliveryTarget::new(url, settings.webhook_secret.clone());

    match client.deliver(&target, &payload).await {
        Ok(_) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": "Test notification sent successfully"
        }))),
        Err(e) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": false,
            "message": e.message
        }))),
    }
}

/// Configure settings routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/whatsapp-settings")
            .route("", web::get().to(get_settings))
            .route("", web::put().to(update_settings))
            .route("/test", web::post().to(test_webhook)),
    );
}

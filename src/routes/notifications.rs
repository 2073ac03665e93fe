//! Notification routes.
//!
//! - POST /send-whatsapp-notification - Dispatch notifications for a completed order
//! - POST /process-whatsapp-queue - Sweep pending and retry records
//! - GET /whatsapp-notifications - Recent records (log viewer)
//! - GET /whatsapp-notifications/stats - Counts per status
//! - GET /whatsapp-notifications/{id} - One record

use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{DispatchRequest, ListNotificationsQuery};
use crate::services::{DeliveryClient, DispatchService, NotificationService, QueueService};

#[derive(Serialize)]
pub struct DispatchResponse {
    pub message: String,
    pub products_processed: usize,
}

#[derive(Serialize)]
pub struct SweepResponse {
    pub message: String,
    pub processed: usize,
    pub errors: usize,
    pub total: usize,
    pub skipped: usize,
    pub deadline_reached: bool,
}

/// POST /send-whatsapp-notification
pub async fn send_whatsapp_notification(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    client: web::Data<dyn DeliveryClient>,
    body: web::Json<DispatchRequest>,
) -> AppResult<HttpResponse> {
    let request = body.into_inner();
    let summary = DispatchService::dispatch_order_notifications(
        pool.get_ref(),
        client.get_ref(),
        &config.dispatch,
        &request,
    )
    .await?;

    let message = if summary.disabled {
        "WhatsApp integration is disabled; no notifications sent".to_string()
    } else {
        format!(
            "Processed WhatsApp notifications for {} product(s)",
            summary.products_processed
        )
    };

    Ok(HttpResponse::Ok().json(DispatchResponse {
        message,
        products_processed: summary.products_processed,
    }))
}

/// POST /process-whatsapp-queue
pub async fn process_whatsapp_queue(
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
    client: web::Data<dyn DeliveryClient>,
) -> AppResult<HttpResponse> {
    let summary =
        QueueService::process_pending_queue(pool.get_ref(), client.get_ref(), &config.sweep)
            .await?;

    let message = if summary.disabled {
        "WhatsApp integration is disabled; queue not processed".to_string()
    } else if summary.total == 0 {
        "No pending notifications".to_string()
    } else {
        format!(
            "Queue processed: {} sent, {} errors",
            summary.processed, summary.errors
        )
    };

    Ok(HttpResponse::Ok().json(SweepResponse {
        message,
        processed: summary.processed,
        errors: summary.errors,
        total: summary.total,
        skipped: summary.skipped,
        deadline_reached: summary.deadline_reached,
    }))
}

/// GET /whatsapp-notifications
pub async fn list_notifications(
    pool: web::Data<DbPool>,
    query: web::Query<ListNotificationsQuery>,
) -> AppResult<HttpResponse> {
    let limit = query.limit.clamp(1, 100);
    let records = NotificationService::list(pool.get_ref(), query.status, limit).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// GET /whatsapp-notifications/stats
pub async fn notification_stats(pool: web::Data<DbPool>) -> AppResult<HttpResponse> {
    let stats = NotificationService::stats(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/// GET /whatsapp-notifications/{id}
pub async fn get_notification(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let record = NotificationService::get(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Configure the dispatch and queue entrypoints
pub fn configure_entrypoints(cfg: &mut web::ServiceConfig) {
    cfg.route(
        "/send-whatsapp-notification",
        web::post().to(send_whatsapp_notification),
    )
    .route(
        "/process-whatsapp-queue",
        web::post().to(process_whatsapp_queue),
    );
}

/// Configure the record viewer routes
pub fn configure_records(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/whatsapp-notifications")
            .route("", web::get().to(list_notifications))
            .route("/stats", web::get().to(notification_stats))
            .route("/{id}", web::get().to(get_notification)),
    );
}

/// Configure all notification routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    configure_entrypoints(cfg);
    configure_records(cfg);
}

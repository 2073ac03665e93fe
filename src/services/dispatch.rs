//! Immediate dispatch after an order completes.
//!
//! Fans an order out into one notification record per purchased product
//! and makes the first delivery attempt for each. A failure on one product
//! is logged and left on its record; it never stops the others.

use sqlx::PgPool;

use crate::config::DispatchConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    triggered_from, DispatchRequest, DispatchSummary, IntegrationState, NewNotification,
    NotificationStatus, Product, Profile, WhatsappSettings, MISSING_DESTINATION_ERROR,
};
use crate::services::delivery::{attempt_delivery, AttemptOutcome};
use crate::services::directory::DirectoryService;
use crate::services::notification::NotificationService;
use crate::services::renderer::{render, MessageFields};
use crate::services::settings::SettingsService;
use crate::services::webhook::{DeliveryClient, DeliveryTarget};

pub struct DispatchService;

impl DispatchService {
    /// Creates and attempts the notifications for one completed order
    pub async fn dispatch_order_notifications(
        pool: &PgPool,
        client: &dyn DeliveryClient,
        config: &DispatchConfig,
        request: &DispatchRequest,
    ) -> AppResult<DispatchSummary> {
        let product_ids = Self::validate(request)?;

        let settings = SettingsService::load(pool).await?;
        let webhook_url = match settings.integration_state() {
            IntegrationState::Disabled => {
                log::info!(
                    "WhatsApp integration disabled, skipping notifications for order {}",
                    request.order_id
                );
                return Ok(DispatchSummary {
                    products_processed: 0,
                    disabled: true,
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

        let profile = DirectoryService::get_profile(pool, &request.user_id).await?;
        let products = DirectoryService::get_products(pool, &product_ids).await?;

        if profile.destination().is_none() {
            log::warn!(
                "User {} has no WhatsApp number; order {} notifications will be recorded as failed",
                profile.id,
                request.order_id
            );
        }

        let mut products_processed = 0;
        for product in &products {
            match Self::dispatch_product(
                pool, client, config, &settings, &target, request, &profile, product,
            )
            .await
            {
                Ok(outcome) => {
                    products_processed += 1;
                    log::debug!(
                        "Order {} product {}: {:?}",
                        request.order_id,
                        product.id,
                        outcome
                    );
                }
                Err(e) => {
                    log::error!(
                        "Failed to process notification for order {} product {}: {}",
                        request.order_id,
                        product.id,
                        e
                    );
                }
            }
        }

        log::info!(
            "Order {}: {}/{} product notifications processed",
            request.order_id,
            products_processed,
            products.len()
        );

        Ok(DispatchSummary {
            products_processed,
            disabled: false,
        })
    }

    /// Returns the de-duplicated, non-blank product ids in request order
    fn validate(request: &DispatchRequest) -> AppResult<Vec<String>> {
        if request.order_id.trim().is_empty() {
            return Err(AppError::Validation("order_id is required".to_string()));
        }
        if request.user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id is required".to_string()));
        }

        let mut product_ids: Vec<String> = Vec::with_capacity(request.product_ids.len());
        for id in &request.product_ids {
            let id = id.trim();
            if !id.is_empty() && !product_ids.iter().any(|seen| seen == id) {
                product_ids.push(id.to_string());
            }
        }

        if product_ids.is_empty() {
            return Err(AppError::Validation(
                "product_ids must contain at least one product".to_string(),
            ));
        }

        Ok(product_ids)
    }

    #[allow(clippy::too_many_arguments)]
    async fn dispatch_product(
        pool: &PgPool,
        client: &dyn DeliveryClient,
        config: &DispatchConfig,
        settings: &WhatsappSettings,
        target: &DeliveryTarget,
        request: &DispatchRequest,
        profile: &Profile,
        product: &Product,
    ) -> AppResult<AttemptOutcome> {
        let fields = MessageFields::new(
            profile.full_name.as_deref(),
            &product.title,
            profile.email.as_deref(),
            &config.member_area_url,
        );

        let new = NewNotification {
            order_id: request.order_id.trim().to_string(),
            user_id: profile.id.clone(),
            product_id: product.id.clone(),
            whatsapp_number: profile.destination().map(str::to_string),
            message: render(&settings.message_template, &fields),
            message_template: settings.message_template.clone(),
            webhook_url: target.url.clone(),
            customer_name: fields.recipient_name.clone(),
            customer_email: profile.email.clone().unwrap_or_default(),
            product_title: product.title.clone(),
            max_attempts: settings.max_attempts,
        };

        if new.whatsapp_number.is_none() {
            let (record, _) = NotificationService::insert(
                pool,
                &new,
                NotificationStatus::Failed,
                Some(MISSING_DESTINATION_ERROR),
            )
            .await?;
            return Ok(if record.status.is_terminal() {
                AttemptOutcome::AlreadyFinal(record.status)
            } else {
                AttemptOutcome::Skipped
            });
        }

        let (record, created) =
            NotificationService::insert(pool, &new, NotificationStatus::Pending, None).await?;

        if !created {
            log::info!(
                "Notification for order {} product {} already exists ({})",
                record.order_id,
                record.product_id,
                record.status
            );
        }

        attempt_delivery(
            pool,
            client,
            target,
            &record,
            triggered_from::ORDER_COMPLETED,
        )
        .await
    }
}

//! Read-only lookups against marketplace-owned tables.

use sqlx::PgPool;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::{Product, Profile};

pub struct DirectoryService;

impl DirectoryService {
    /// Gets the recipient profile for a user
    pub async fn get_profile(pool: &PgPool, user_id: &str) -> AppResult<Profile> {
        sqlx::query_as::<_, Profile>(
            r#"
            SELECT id, full_name, email, whatsapp_number
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", user_id)))
    }

    /// Gets products by id, in the order requested. Fails if any id does not
    /// resolve so that no partial fan-out happens.
    pub async fn get_products(pool: &PgPool, product_ids: &[String]) -> AppResult<Vec<Product>> {
        let found: Vec<Product> =
            sqlx::query_as("SELECT id, title FROM products WHERE id = ANY($1)")
                .bind(product_ids)
                .fetch_all(pool)
                .await?;

        let mut by_id: HashMap<String, Product> =
            found.into_iter().map(|p| (p.id.clone(), p)).collect();

        let missing: Vec<&str> = product_ids
            .iter()
            .filter(|id| !by_id.contains_key(id.as_str()))
            .map(String::as_str)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "Products not found: {}",
                missing.join(", ")
            )));
        }

        Ok(product_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect())
    }
}

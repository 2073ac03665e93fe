use serde::Serialize;
use sqlx::FromRow;

/// Recipient profile, owned by the marketplace
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub whatsapp_number: Option<String>,
}

impl Profile {
    /// WhatsApp number, if one is on file and non-blank
    pub fn destination(&self) -> Option<&str> {
        self.whatsapp_number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// Purchased product, owned by the marketplace
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
    pub id: String,
    pub title: String,
}

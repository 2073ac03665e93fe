//! Message template rendering.
//!
//! Templates are plain text for a messaging channel. Four placeholders are
//! recognised; anything else in braces is copied through untouched.

pub const PLACEHOLDER_NAME: &str = "{nome}";
pub const PLACEHOLDER_PRODUCT: &str = "{produto}";
pub const PLACEHOLDER_EMAIL: &str = "{email}";
pub const PLACEHOLDER_AREA_LINK: &str = "{link_area_membros}";

/// Label used when the recipient has no name on file
pub const FALLBACK_NAME: &str = "Customer";
/// Label used when the recipient has no email on file
pub const FALLBACK_EMAIL: &str = "email not provided";

/// Values substituted into a template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageFields {
    pub recipient_name: String,
    pub product_label: String,
    pub recipient_email: String,
    pub area_link: String,
}

impl MessageFields {
    /// Builds fields, replacing a missing or blank name/email with the
    /// fallback labels.
    pub fn new(
        recipient_name: Option<&str>,
        product_label: &str,
        recipient_email: Option<&str>,
        area_link: &str,
    ) -> Self {
        Self {
            recipient_name: non_blank(recipient_name).unwrap_or(FALLBACK_NAME).to_string(),
            product_label: product_label.to_string(),
            recipient_email: non_blank(recipient_email)
                .unwrap_or(FALLBACK_EMAIL)
                .to_string(),
            area_link: area_link.to_string(),
        }
    }

    fn substitution(&self, tail: &str) -> Option<(usize, &str)> {
        [
            (PLACEHOLDER_NAME, self.recipient_name.as_str()),
            (PLACEHOLDER_PRODUCT, self.product_label.as_str()),
            (PLACEHOLDER_EMAIL, self.recipient_email.as_str()),
            (PLACEHOLDER_AREA_LINK, self.area_link.as_str()),
        ]
        .into_iter()
        .find(|(token, _)| tail.starts_with(token))
        .map(|(token, value)| (token.len(), value))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Substitutes every recognised placeholder in `template`.
///
/// Single pass: substituted values are never rescanned, so a field value
/// that itself looks like a placeholder is emitted verbatim.
pub fn render(template: &str, fields: &MessageFields) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        match fields.substitution(tail) {
            Some((consumed, value)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

//! Unit tests for typed settings parsing
//!
//! Values in `app_settings` are loosely typed JSON; these tests pin down how
//! each shape is interpreted.

use order_notifier::models::settings::{
    UpdateSettings, DEFAULT_MESSAGE_TEMPLATE, KEY_DELAY_MINUTES, KEY_ENABLED, KEY_MAX_ATTEMPTS,
    KEY_MESSAGE_TEMPLATE, KEY_WEBHOOK_SECRET, KEY_WEBHOOK_URL,
};
use order_notifier::models::{IntegrationState, WhatsappSettings, DEFAULT_MAX_ATTEMPTS};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::{json, Value};
use std::collections::HashMap;

fn settings(pairs: &[(&str, Value)]) -> WhatsappSettings {
    let entries: HashMap<String, Value> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect();
    WhatsappSettings::from_entries(&entries)
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn test_empty_table_gives_defaults() {
    assert_eq!(settings(&[]), WhatsappSettings::default());

    let s = settings(&[]);
    assert!(!s.enabled);
    assert_eq!(s.webhook_url, None);
    assert_eq!(s.message_template, DEFAULT_MESSAGE_TEMPLATE);
    assert_eq!(s.delay_minutes, 0);
    assert_eq!(s.max_attempts, DEFAULT_MAX_ATTEMPTS);
}

// =============================================================================
// Enable Flag
// =============================================================================

#[rstest]
#[case(json!(true), true)]
#[case(json!(false), false)]
#[case(json!("true"), true)]
#[case(json!("TRUE"), true)]
#[case(json!("\"true\""), true)]
#[case(json!("1"), true)]
#[case(json!(1), true)]
#[case(json!(0), false)]
#[case(json!("false"), false)]
#[case(json!("nope"), false)]
#[case(json!(null), false)]
#[case(json!({"enabled": true}), false)]
fn test_enabled_flag_parsing(#[case] value: Value, #[case] expected: bool) {
    assert_eq!(settings(&[(KEY_ENABLED, value)]).enabled, expected);
}

// =============================================================================
// Text Values
// =============================================================================

#[rstest]
#[case(json!("https://n8n.example.com/webhook/x"), Some("https://n8n.example.com/webhook/x"))]
#[case(json!("  https://n8n.example.com/webhook/x  "), Some("https://n8n.example.com/webhook/x"))]
#[case(json!("\"https://n8n.example.com/webhook/x\""), Some("https://n8n.example.com/webhook/x"))]
#[case(json!(""), None)]
#[case(json!("\"\""), None)]
#[case(json!(null), None)]
#[case(json!(42), None)]
fn test_webhook_url_parsing(#[case] value: Value, #[case] expected: Option<&str>) {
    assert_eq!(
        settings(&[(KEY_WEBHOOK_URL, value)]).webhook_url.as_deref(),
        expected
    );
}

#[test]
fn test_blank_template_uses_default() {
    let s = settings(&[(KEY_MESSAGE_TEMPLATE, json!("   "))]);
    assert_eq!(s.message_template, DEFAULT_MESSAGE_TEMPLATE);
}

#[test]
fn test_custom_template_is_kept() {
    let s = settings(&[(KEY_MESSAGE_TEMPLATE, json!("Hi {nome}"))]);
    assert_eq!(s.message_template, "Hi {nome}");
}

// =============================================================================
// Numeric Values
// =============================================================================

#[rstest]
#[case(json!("5"), 5)]
#[case(json!(5), 5)]
#[case(json!("abc"), 0)]
#[case(json!(-3), 0)]
fn test_delay_minutes_parsing(#[case] value: Value, #[case] expected: u32) {
    assert_eq!(settings(&[(KEY_DELAY_MINUTES, value)]).delay_minutes, expected);
}

#[rstest]
#[case(json!(5), 5)]
#[case(json!("2"), 2)]
#[case(json!(0), 1)]
#[case(json!(99), 10)]
#[case(json!("x"), DEFAULT_MAX_ATTEMPTS)]
fn test_max_attempts_parsing(#[case] value: Value, #[case] expected: i32) {
    assert_eq!(settings(&[(KEY_MAX_ATTEMPTS, value)]).max_attempts, expected);
}

// =============================================================================
// Integration State
// =============================================================================

#[test]
fn test_state_disabled_even_with_url() {
    let s = settings(&[
        (KEY_ENABLED, json!(false)),
        (KEY_WEBHOOK_URL, json!("https://n8n.example.com/hook")),
    ]);
    assert_eq!(s.integration_state(), IntegrationState::Disabled);
}

#[test]
fn test_state_misconfigured_when_enabled_without_url() {
    let s = settings(&[(KEY_ENABLED, json!(true)), (KEY_WEBHOOK_URL, json!(""))]);
    assert_eq!(s.integration_state(), IntegrationState::Misconfigured);
    assert_eq!(s.integration_state().as_str(), "misconfigured");
}

#[test]
fn test_state_enabled_carries_endpoint() {
    let s = settings(&[
        (KEY_ENABLED, json!("true")),
        (KEY_WEBHOOK_URL, json!("https://n8n.example.com/hook")),
    ]);
    assert_eq!(
        s.integration_state(),
        IntegrationState::Enabled("https://n8n.example.com/hook".to_string())
    );
}

#[test]
fn test_response_redacts_secret() {
    let s = settings(&[(KEY_WEBHOOK_SECRET, json!("super-secret"))]);
    let body = serde_json::to_value(s.to_response()).unwrap();

    assert_eq!(body["has_webhook_secret"], true);
    assert!(!body.to_string().contains("super-secret"));
    assert_eq!(body["state"], "disabled");
}

// =============================================================================
// Updates
// =============================================================================

#[test]
fn test_update_only_emits_present_fields() {
    let update = UpdateSettings {
        enabled: Some(true),
        delay_minutes: Some(10),
        ..Default::default()
    };

    let entries = update.into_entries();
    assert_eq!(
        entries,
        vec![
            (KEY_ENABLED, json!(true)),
            (KEY_DELAY_MINUTES, json!("10")),
        ]
    );
}

#[test]
fn test_update_round_trips_through_parser() {
    let update = UpdateSettings {
        enabled: Some(true),
        webhook_url: Some(" https://n8n.example.com/hook ".to_string()),
        message_template: Some("Hey {nome}".to_string()),
        max_attempts: Some(4),
        ..Default::default()
    };

    let entries: HashMap<String, Value> = update
        .into_entries()
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    let s = WhatsappSettings::from_entries(&entries);

    assert!(s.enabled);
    assert_eq!(s.webhook_url.as_deref(), Some("https://n8n.example.com/hook"));
    assert_eq!(s.message_template, "Hey {nome}");
    assert_eq!(s.max_attempts, 4);
}

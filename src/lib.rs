//! Order Notifier Library
//!
//! Purchase-confirmation WhatsApp notifications: an outbox of notification
//! records, delivered to an automation webhook right after an order
//! completes and re-attempted by a queue sweeper.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod sweep;

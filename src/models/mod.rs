pub mod notification;
pub mod profile;
pub mod settings;

pub use notification::{
    triggered_from, DispatchRequest, DispatchSummary, ListNotificationsQuery, NewNotification,
    NotificationRecord, NotificationStats, NotificationStatus, SweepSummary, WebhookPayload,
    DEFAULT_MAX_ATTEMPTS, MISSING_DESTINATION_ERROR,
};
pub use profile::{Product, Profile};
pub use settings::{IntegrationState, SettingsResponse, UpdateSettings, WhatsappSettings};

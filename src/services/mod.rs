pub mod delivery;
pub mod directory;
pub mod dispatch;
pub mod notification;
pub mod queue;
pub mod renderer;
pub mod settings;
pub mod webhook;

pub use delivery::{attempt_delivery, AttemptOutcome};
pub use directory::DirectoryService;
pub use dispatch::DispatchService;
pub use notification::NotificationService;
pub use queue::QueueService;
pub use renderer::{render, MessageFields};
pub use settings::SettingsService;
pub use webhook::{
    DeliveryClient, DeliveryError, DeliveryReceipt, DeliveryResult, DeliveryTarget, WebhookClient,
};

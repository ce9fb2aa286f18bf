pub mod builders;
pub mod dispatch;
pub mod email;
pub mod health;
pub mod sms;
pub mod sweep;
pub mod templates;
#[cfg(test)]
pub(crate) mod testkit;

pub use builders::{NewNotification, Notifier};
pub use dispatch::{ChannelFailure, DispatchEngine, DispatchOutcome};
pub use email::SmtpMailer;
pub use health::{SmsConfigReport, check_sms_configuration};
pub use sms::TwilioSender;
pub use sweep::Sweeper;

use async_trait::async_trait;
use bson::{DateTime, oid::ObjectId};
use thiserror::Error;
use traino_db::models::{Notification, NotificationPrefs};

use crate::dao::base::DaoResult;
use templates::EmailContent;

/// Delivery-facing view of a user, resolved once per dispatch.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub name: String,
    pub email: String,
    pub contact_number: Option<String>,
    pub preferences: NotificationPrefs,
}

/// A due notification with its recipient joined in the same store query.
/// `recipient` is `None` when the referenced user is gone or soft-deleted.
#[derive(Debug, Clone)]
pub struct DueNotification {
    pub notification: Notification,
    pub recipient: Option<Recipient>,
}

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("SMTP error: {0}")]
    Smtp(String),
    #[error("Carrier error: {0}")]
    Carrier(String),
    #[error("SMS carrier is not configured")]
    CarrierNotConfigured,
}

/// Persistence seam for notifications. `claim` is the concurrency gate: it
/// must atomically move a still-eligible notification to `sending` and
/// return `None` for every other caller.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: &Notification) -> DaoResult<ObjectId>;
    async fn load(&self, id: ObjectId) -> DaoResult<Option<Notification>>;
    async fn claim(&self, id: ObjectId, now: DateTime) -> DaoResult<Option<Notification>>;
    async fn store_outcome(&self, notification: &Notification) -> DaoResult<()>;
    async fn find_due(&self, now: DateTime) -> DaoResult<Vec<DueNotification>>;
}

#[async_trait]
pub trait RecipientSource: Send + Sync {
    async fn resolve(&self, id: ObjectId) -> DaoResult<Option<Recipient>>;
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(
        &self,
        to_name: &str,
        to_email: &str,
        content: &EmailContent,
    ) -> Result<(), SendError>;
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Whether carrier credentials are present. Callers use this to decide
    /// between a counted failure and a recorded-only error.
    fn is_configured(&self) -> bool;

    async fn send(&self, to: &str, body: &str) -> Result<(), SendError>;
}

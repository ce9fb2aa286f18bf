use std::sync::Arc;

use bson::{DateTime, oid::ObjectId};
use tracing::{debug, info, warn};
use traino_config::NotifierSettings;
use traino_db::models::{Notification, NotificationStatus};

use super::templates;
use super::{
    DueNotification, EmailSender, NotificationStore, Recipient, RecipientSource, SendError,
    SmsSender,
};
use crate::dao::base::DaoResult;

/// Result of a dispatch attempt. Store-level failures surface as `Err`;
/// channel-level failures are data here, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    PartiallyFailed(Vec<ChannelFailure>),
    NotEligible,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelFailure {
    pub channel: &'static str,
    pub error: String,
}

/// Claims eligible notifications and walks their enabled channels. All
/// collaborators and settings are injected at construction.
pub struct DispatchEngine {
    store: Arc<dyn NotificationStore>,
    recipients: Arc<dyn RecipientSource>,
    email: Arc<dyn EmailSender>,
    sms: Arc<dyn SmsSender>,
    base_url: String,
    brand: String,
}

impl DispatchEngine {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        recipients: Arc<dyn RecipientSource>,
        email: Arc<dyn EmailSender>,
        sms: Arc<dyn SmsSender>,
        settings: &NotifierSettings,
    ) -> Self {
        Self {
            store,
            recipients,
            email,
            sms,
            base_url: settings.base_url.clone(),
            brand: settings.brand.clone(),
        }
    }

    /// Claim-and-deliver by id. Safe to call repeatedly: anything not
    /// currently eligible is a no-op `NotEligible`.
    pub async fn dispatch(&self, id: ObjectId) -> DaoResult<DispatchOutcome> {
        let now = DateTime::now();

        let Some(notification) = self.store.load(id).await? else {
            return Ok(DispatchOutcome::NotFound);
        };
        if !notification.is_eligible(now) {
            return Ok(DispatchOutcome::NotEligible);
        }

        let Some(recipient) = self.recipients.resolve(notification.recipient_id).await? else {
            warn!(notification_id = %id, "Recipient missing; nothing sent");
            return Ok(DispatchOutcome::NotFound);
        };

        self.claim_and_deliver(id, &recipient, now).await
    }

    /// Sweep entry point: the recipient arrives pre-joined from `find_due`.
    pub async fn dispatch_due(&self, due: &DueNotification) -> DaoResult<DispatchOutcome> {
        let now = DateTime::now();

        let Some(id) = due.notification.id else {
            return Ok(DispatchOutcome::NotFound);
        };
        let Some(recipient) = &due.recipient else {
            warn!(notification_id = %id, "Recipient missing; nothing sent");
            return Ok(DispatchOutcome::NotFound);
        };

        self.claim_and_deliver(id, recipient, now).await
    }

    async fn claim_and_deliver(
        &self,
        id: ObjectId,
        recipient: &Recipient,
        now: DateTime,
    ) -> DaoResult<DispatchOutcome> {
        // Lost the race or state changed since the read.
        let Some(mut notification) = self.store.claim(id, now).await? else {
            return Ok(DispatchOutcome::NotEligible);
        };

        let mut failures: Vec<ChannelFailure> = Vec::new();

        if notification.channels.email.enabled {
            match self.send_email(&notification, recipient).await {
                Ok(()) => {
                    notification.channels.email.sent = true;
                    notification.channels.email.sent_at = Some(DateTime::now());
                    notification.channels.email.error = None;
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(notification_id = %id, error = %error, "Email channel failed");
                    notification.channels.email.error = Some(error.clone());
                    failures.push(ChannelFailure {
                        channel: "email",
                        error,
                    });
                }
            }
        }

        if notification.channels.sms.enabled {
            match self.send_sms(&notification, recipient).await {
                Ok(()) => {
                    notification.channels.sms.sent = true;
                    notification.channels.sms.sent_at = Some(DateTime::now());
                    notification.channels.sms.error = None;
                }
                // Recorded but not counted: a deployment without a carrier
                // still delivers its other channels with a clean status.
                Err(SendError::CarrierNotConfigured) => {
                    debug!(notification_id = %id, "SMS skipped: carrier not configured");
                    notification.channels.sms.error =
                        Some(SendError::CarrierNotConfigured.to_string());
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(notification_id = %id, error = %error, "SMS channel failed");
                    notification.channels.sms.error = Some(error.clone());
                    failures.push(ChannelFailure {
                        channel: "sms",
                        error,
                    });
                }
            }
        }

        // In-app delivery is the stored record itself.
        if notification.channels.in_app.enabled {
            notification.channels.in_app.sent = true;
            notification.channels.in_app.sent_at = Some(DateTime::now());
        }

        notification.status = if failures.is_empty() {
            NotificationStatus::Sent
        } else {
            NotificationStatus::Failed
        };

        self.store.store_outcome(&notification).await?;

        if failures.is_empty() {
            info!(notification_id = %id, "Notification dispatched");
            Ok(DispatchOutcome::Sent)
        } else {
            info!(
                notification_id = %id,
                failed_channels = failures.len(),
                "Notification dispatched with channel failures"
            );
            Ok(DispatchOutcome::PartiallyFailed(failures))
        }
    }

    async fn send_email(
        &self,
        notification: &Notification,
        recipient: &Recipient,
    ) -> Result<(), SendError> {
        if recipient.email.is_empty() {
            return Err(SendError::InvalidAddress(
                "recipient has no email address".to_string(),
            ));
        }

        let content = templates::render_email(notification, &recipient.name, &self.base_url);
        self.email
            .send(&recipient.name, &recipient.email, &content)
            .await
    }

    async fn send_sms(
        &self,
        notification: &Notification,
        recipient: &Recipient,
    ) -> Result<(), SendError> {
        if !self.sms.is_configured() {
            return Err(SendError::CarrierNotConfigured);
        }

        let Some(number) = recipient.contact_number.as_deref() else {
            return Err(SendError::InvalidAddress(
                "recipient has no phone number".to_string(),
            ));
        };

        let body = templates::render_sms(notification, &self.brand, &self.base_url);
        self.sms.send(number, &body).await
    }
}

//! In-memory fakes for exercising dispatch, sweep and constructors without
//! MongoDB, SMTP or a carrier account.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bson::{DateTime, oid::ObjectId};
use traino_db::models::{ChannelSet, Notification, NotificationPrefs, NotificationStatus, NotificationType};

use super::templates::EmailContent;
use super::{
    DueNotification, EmailSender, NotificationStore, Recipient, RecipientSource, SendError,
    SmsSender,
};
use crate::dao::base::{DaoError, DaoResult};

/// Backs both store traits from two maps. `claim` honors the same contract
/// as the MongoDB implementation: eligibility re-checked under the lock,
/// exactly one winner.
#[derive(Default)]
pub(crate) struct MemoryBackend {
    pub notifications: Mutex<HashMap<ObjectId, Notification>>,
    pub recipients: Mutex<HashMap<ObjectId, Recipient>>,
    /// When set, `store_outcome` for this id fails, simulating a store
    /// outage mid-dispatch.
    pub fail_outcome_for: Mutex<Option<ObjectId>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_recipient(&self, recipient: Recipient) -> ObjectId {
        let id = ObjectId::new();
        self.recipients.lock().unwrap().insert(id, recipient);
        id
    }

    pub fn add_notification(&self, mut notification: Notification) -> ObjectId {
        let id = notification.id.unwrap_or_else(ObjectId::new);
        notification.id = Some(id);
        self.notifications.lock().unwrap().insert(id, notification);
        id
    }

    pub fn notification(&self, id: ObjectId) -> Notification {
        self.notifications
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("notification should exist")
    }
}

#[async_trait]
impl NotificationStore for MemoryBackend {
    async fn insert(&self, notification: &Notification) -> DaoResult<ObjectId> {
        let id = notification.id.unwrap_or_else(ObjectId::new);
        let mut stored = notification.clone();
        stored.id = Some(id);
        self.notifications.lock().unwrap().insert(id, stored);
        Ok(id)
    }

    async fn load(&self, id: ObjectId) -> DaoResult<Option<Notification>> {
        Ok(self.notifications.lock().unwrap().get(&id).cloned())
    }

    async fn claim(&self, id: ObjectId, now: DateTime) -> DaoResult<Option<Notification>> {
        let mut notifications = self.notifications.lock().unwrap();
        match notifications.get_mut(&id) {
            Some(n) if n.is_eligible(now) => {
                n.status = NotificationStatus::Sending;
                Ok(Some(n.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn store_outcome(&self, notification: &Notification) -> DaoResult<()> {
        let id = notification.id.ok_or(DaoError::NotFound)?;
        if *self.fail_outcome_for.lock().unwrap() == Some(id) {
            return Err(DaoError::Validation("simulated store failure".to_string()));
        }

        let mut notifications = self.notifications.lock().unwrap();
        let stored = notifications.get_mut(&id).ok_or(DaoError::NotFound)?;
        stored.channels = notification.channels.clone();
        stored.status = notification.status;
        stored.updated_at = DateTime::now();
        Ok(())
    }

    async fn find_due(&self, now: DateTime) -> DaoResult<Vec<DueNotification>> {
        let notifications = self.notifications.lock().unwrap();
        let recipients = self.recipients.lock().unwrap();

        let mut due: Vec<DueNotification> = notifications
            .values()
            .filter(|n| n.is_eligible(now))
            .map(|n| DueNotification {
                notification: n.clone(),
                recipient: recipients.get(&n.recipient_id).cloned(),
            })
            .collect();
        due.sort_by_key(|d| d.notification.scheduled_for);
        Ok(due)
    }
}

#[async_trait]
impl RecipientSource for MemoryBackend {
    async fn resolve(&self, id: ObjectId) -> DaoResult<Option<Recipient>> {
        Ok(self.recipients.lock().unwrap().get(&id).cloned())
    }
}

// ---- Channel stubs -------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct SentEmail {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[derive(Default)]
pub(crate) struct StubEmail {
    pub fail_with: Option<String>,
    pub sent: Mutex<Vec<SentEmail>>,
}

impl StubEmail {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl EmailSender for StubEmail {
    async fn send(
        &self,
        _to_name: &str,
        to_email: &str,
        content: &EmailContent,
    ) -> Result<(), SendError> {
        if let Some(message) = &self.fail_with {
            return Err(SendError::Smtp(message.clone()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to_email.to_string(),
            subject: content.subject.clone(),
            text: content.text.clone(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct SentSms {
    pub to: String,
    pub body: String,
}

#[derive(Default)]
pub(crate) struct StubSms {
    pub configured: bool,
    pub fail_with: Option<String>,
    pub sent: Mutex<Vec<SentSms>>,
}

impl StubSms {
    pub fn unconfigured() -> Self {
        Self::default()
    }

    pub fn ok() -> Self {
        Self {
            configured: true,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            configured: true,
            fail_with: Some(message.to_string()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl SmsSender for StubSms {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, to: &str, body: &str) -> Result<(), SendError> {
        if !self.configured {
            return Err(SendError::CarrierNotConfigured);
        }
        if let Some(message) = &self.fail_with {
            return Err(SendError::Carrier(message.clone()));
        }
        self.sent.lock().unwrap().push(SentSms {
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

// ---- Fixtures ------------------------------------------------------------

pub(crate) fn recipient(email: &str, contact_number: Option<&str>) -> Recipient {
    Recipient {
        name: "Jane Doe".to_string(),
        email: email.to_string(),
        contact_number: contact_number.map(str::to_string),
        preferences: NotificationPrefs::default(),
    }
}

pub(crate) fn pending_notification(
    recipient_id: ObjectId,
    channels: ChannelSet,
) -> Notification {
    let now = DateTime::now();
    Notification {
        id: None,
        recipient_id,
        notification_type: NotificationType::Generic,
        title: "Heads up".to_string(),
        message: "Something needs your attention".to_string(),
        priority: Default::default(),
        channels,
        status: NotificationStatus::Pending,
        scheduled_for: now,
        expires_at: None,
        related_entity: None,
        action_url: None,
        created_by: None,
        is_read: false,
        read_at: None,
        created_at: now,
        updated_at: now,
    }
}

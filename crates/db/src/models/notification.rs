use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub recipient_id: ObjectId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: NotificationPriority,
    #[serde(default)]
    pub channels: ChannelSet,
    #[serde(default)]
    pub status: NotificationStatus,
    pub scheduled_for: DateTime,
    /// Stored for the UI; dispatch and the sweep do not filter on it.
    pub expires_at: Option<DateTime>,
    pub related_entity: Option<RelatedEntity>,
    pub action_url: Option<String>,
    pub created_by: Option<ObjectId>,
    #[serde(default)]
    pub is_read: bool,
    pub read_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    TrainingProgress,
    PaymentReminder,
    EvaluationDue,
    Generic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    #[default]
    Pending,
    /// Claimed by a dispatcher; transient while channel sends run.
    Sending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelSet {
    #[serde(default)]
    pub email: ChannelState,
    #[serde(default)]
    pub sms: ChannelState,
    #[serde(default)]
    pub in_app: ChannelState,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelState {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub sent: bool,
    pub sent_at: Option<DateTime>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedEntity {
    pub entity_type: String,
    pub entity_id: ObjectId,
}

impl ChannelState {
    pub fn enabled(enabled: bool) -> Self {
        Self {
            enabled,
            ..Default::default()
        }
    }
}

impl ChannelSet {
    pub fn with_enabled(email: bool, sms: bool, in_app: bool) -> Self {
        Self {
            email: ChannelState::enabled(email),
            sms: ChannelState::enabled(sms),
            in_app: ChannelState::enabled(in_app),
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.email.enabled || self.sms.enabled || self.in_app.enabled
    }
}

impl Notification {
    pub const COLLECTION: &'static str = "notifications";

    /// Due for delivery: still pending, schedule time reached, at least one
    /// channel enabled. `expires_at` is deliberately not part of this check.
    pub fn is_eligible(&self, now: DateTime) -> bool {
        self.status == NotificationStatus::Pending
            && self.scheduled_for <= now
            && self.channels.any_enabled()
    }
}

use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    pub full_name: String,
    /// E.164 expected ("+15551234567") but not enforced on write; the SMS
    /// channel surfaces a delivery error for malformed numbers instead.
    pub contact_number: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default = "bool_true")]
    pub is_active: bool,
    #[serde(default)]
    pub notification_preferences: NotificationPrefs,
    pub created_at: DateTime,
    pub updated_at: DateTime,
    pub deleted_at: Option<DateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Trainer,
    #[default]
    Employee,
    Candidate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPrefs {
    #[serde(default = "bool_true")]
    pub email: bool,
    #[serde(default = "bool_true")]
    pub sms: bool,
    #[serde(default = "bool_true")]
    pub in_app: bool,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            email: true,
            sms: true,
            in_app: true,
        }
    }
}

fn bool_true() -> bool {
    true
}

impl User {
    pub const COLLECTION: &'static str = "users";
}

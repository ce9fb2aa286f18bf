use async_trait::async_trait;
use bson::{DateTime, Document, doc, oid::ObjectId};
use mongodb::Database;
use mongodb::options::ReturnDocument;
use serde::Deserialize;
use traino_db::models::{Notification, NotificationPrefs, User};

use super::base::{BaseDao, DaoError, DaoResult, PaginatedResult, PaginationParams};
use crate::notify::{DueNotification, NotificationStore, Recipient};

pub struct NotificationDao {
    pub base: BaseDao<Notification>,
}

/// Aggregation row for `find_due`: the notification document plus the
/// `$lookup`ed recipient, absent when the user no longer exists.
#[derive(Debug, Deserialize)]
struct DueRow {
    notification: Notification,
    #[serde(default)]
    recipient: Option<RecipientRow>,
}

#[derive(Debug, Deserialize)]
struct RecipientRow {
    full_name: String,
    email: String,
    contact_number: Option<String>,
    #[serde(default)]
    notification_preferences: NotificationPrefs,
    deleted_at: Option<DateTime>,
}

impl RecipientRow {
    fn into_recipient(self) -> Option<Recipient> {
        if self.deleted_at.is_some() {
            return None;
        }
        Some(Recipient {
            name: self.full_name,
            email: self.email,
            contact_number: self.contact_number,
            preferences: self.notification_preferences,
        })
    }
}

impl NotificationDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, Notification::COLLECTION),
        }
    }

    /// Filter shared by `claim` and `find_due`; mirrors
    /// `Notification::is_eligible`.
    fn eligibility_filter(now: DateTime) -> Document {
        doc! {
            "status": "pending",
            "scheduled_for": { "$lte": now },
            "$or": [
                { "channels.email.enabled": true },
                { "channels.sms.enabled": true },
                { "channels.in_app.enabled": true },
            ],
        }
    }

    // ---- In-app feed -----------------------------------------------------

    pub async fn list_for_recipient(
        &self,
        recipient_id: ObjectId,
        params: &PaginationParams,
    ) -> DaoResult<PaginatedResult<Notification>> {
        self.base
            .find_paginated(
                doc! {
                    "recipient_id": recipient_id,
                    "channels.in_app.enabled": true,
                },
                Some(doc! { "created_at": -1 }),
                params,
            )
            .await
    }

    pub async fn unread_count(&self, recipient_id: ObjectId) -> DaoResult<u64> {
        self.base
            .count(doc! {
                "recipient_id": recipient_id,
                "channels.in_app.enabled": true,
                "is_read": false,
            })
            .await
    }

    /// Scoped to the recipient so one user cannot mark another's feed.
    pub async fn mark_read(&self, recipient_id: ObjectId, id: ObjectId) -> DaoResult<bool> {
        self.base
            .update_one(
                doc! { "_id": id, "recipient_id": recipient_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": DateTime::now() } },
            )
            .await
    }

    pub async fn mark_all_read(&self, recipient_id: ObjectId) -> DaoResult<u64> {
        let now = DateTime::now();
        let result = self
            .base
            .collection()
            .update_many(
                doc! { "recipient_id": recipient_id, "is_read": false },
                doc! { "$set": { "is_read": true, "read_at": now, "updated_at": now } },
            )
            .await?;
        Ok(result.modified_count)
    }
}

#[async_trait]
impl NotificationStore for NotificationDao {
    async fn insert(&self, notification: &Notification) -> DaoResult<ObjectId> {
        self.base.insert_one(notification).await
    }

    async fn load(&self, id: ObjectId) -> DaoResult<Option<Notification>> {
        self.base.find_one(doc! { "_id": id }).await
    }

    async fn claim(&self, id: ObjectId, now: DateTime) -> DaoResult<Option<Notification>> {
        let mut filter = Self::eligibility_filter(now);
        filter.insert("_id", id);

        let claimed = self
            .base
            .collection()
            .find_one_and_update(
                filter,
                doc! { "$set": { "status": "sending", "updated_at": DateTime::now() } },
            )
            .return_document(ReturnDocument::After)
            .await?;

        Ok(claimed)
    }

    async fn store_outcome(&self, notification: &Notification) -> DaoResult<()> {
        let id = notification.id.ok_or(DaoError::NotFound)?;
        let update = doc! {
            "$set": {
                "channels": bson::to_bson(&notification.channels)?,
                "status": bson::to_bson(&notification.status)?,
            }
        };
        self.base.update_by_id(id, update).await?;
        Ok(())
    }

    async fn find_due(&self, now: DateTime) -> DaoResult<Vec<DueNotification>> {
        use futures::TryStreamExt;

        let pipeline = vec![
            doc! { "$match": Self::eligibility_filter(now) },
            doc! { "$sort": { "scheduled_for": 1 } },
            doc! { "$lookup": {
                "from": User::COLLECTION,
                "localField": "recipient_id",
                "foreignField": "_id",
                "as": "recipient_doc",
            }},
            doc! { "$unwind": {
                "path": "$recipient_doc",
                "preserveNullAndEmptyArrays": true,
            }},
            doc! { "$project": {
                "notification": "$$ROOT",
                "recipient": "$recipient_doc",
            }},
        ];

        let mut cursor = self.base.collection().aggregate(pipeline).await?;

        let mut due = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            let row: DueRow = bson::from_document(doc)?;
            due.push(DueNotification {
                notification: row.notification,
                recipient: row.recipient.and_then(RecipientRow::into_recipient),
            });
        }

        Ok(due)
    }
}

use std::sync::Arc;

use bson::{DateTime, oid::ObjectId};
use tracing::warn;
use traino_db::models::{
    ChannelSet, Notification, NotificationPriority, NotificationStatus, NotificationType,
    RelatedEntity,
};

use super::dispatch::DispatchEngine;
use super::{NotificationStore, RecipientSource, SmsSender};
use crate::dao::base::{DaoError, DaoResult};

const EVALUATION_WINDOW_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Input for a generic notification. The typed constructors below fill
/// most of this from the triggering entity.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub recipient_id: ObjectId,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub channels: ChannelSet,
    pub scheduled_for: Option<DateTime>,
    pub expires_at: Option<DateTime>,
    pub related_entity: Option<RelatedEntity>,
    pub action_url: Option<String>,
    pub created_by: Option<ObjectId>,
}

/// Creation front door: persists the notification and hands anything
/// already due straight to the dispatch engine.
pub struct Notifier {
    store: Arc<dyn NotificationStore>,
    recipients: Arc<dyn RecipientSource>,
    sms: Arc<dyn SmsSender>,
    engine: Arc<DispatchEngine>,
}

impl Notifier {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        recipients: Arc<dyn RecipientSource>,
        sms: Arc<dyn SmsSender>,
        engine: Arc<DispatchEngine>,
    ) -> Self {
        Self {
            store,
            recipients,
            sms,
            engine,
        }
    }

    pub async fn create(&self, new: NewNotification) -> DaoResult<Notification> {
        if new.title.trim().is_empty() {
            return Err(DaoError::Validation("title must not be empty".to_string()));
        }
        if new.message.trim().is_empty() {
            return Err(DaoError::Validation(
                "message must not be empty".to_string(),
            ));
        }
        if self.recipients.resolve(new.recipient_id).await?.is_none() {
            return Err(DaoError::NotFound);
        }

        let now = DateTime::now();
        let mut notification = Notification {
            id: None,
            recipient_id: new.recipient_id,
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            priority: new.priority,
            channels: new.channels,
            status: NotificationStatus::Pending,
            scheduled_for: new.scheduled_for.unwrap_or(now),
            expires_at: new.expires_at,
            related_entity: new.related_entity,
            action_url: new.action_url,
            created_by: new.created_by,
            is_read: false,
            read_at: None,
            created_at: now,
            updated_at: now,
        };

        let id = self.store.insert(&notification).await?;
        notification.id = Some(id);

        // Creation already succeeded; a failed immediate dispatch leaves the
        // record for the sweep.
        if notification.is_eligible(DateTime::now()) {
            if let Err(error) = self.engine.dispatch(id).await {
                warn!(notification_id = %id, %error, "Immediate dispatch failed");
            }
        }

        Ok(self.store.load(id).await?.unwrap_or(notification))
    }

    pub async fn training_progress(
        &self,
        recipient_id: ObjectId,
        training_id: ObjectId,
        training_name: &str,
        percent_complete: u8,
    ) -> DaoResult<Notification> {
        self.create(NewNotification {
            recipient_id,
            notification_type: NotificationType::TrainingProgress,
            title: "Training Progress Update".to_string(),
            message: format!("You have completed {percent_complete}% of {training_name}"),
            priority: NotificationPriority::Medium,
            channels: ChannelSet::with_enabled(true, false, true),
            scheduled_for: None,
            expires_at: None,
            related_entity: Some(RelatedEntity {
                entity_type: "training".to_string(),
                entity_id: training_id,
            }),
            action_url: Some(format!("/trainings/{}", training_id.to_hex())),
            created_by: None,
        })
        .await
    }

    pub async fn payment_reminder(
        &self,
        recipient_id: ObjectId,
        payment_id: ObjectId,
        amount: f64,
        due_date: DateTime,
    ) -> DaoResult<Notification> {
        let due = due_date.to_chrono().format("%-m/%-d/%Y");
        self.create(NewNotification {
            recipient_id,
            notification_type: NotificationType::PaymentReminder,
            title: "Payment Reminder".to_string(),
            message: format!("Payment of ${amount} is due on {due}"),
            priority: NotificationPriority::High,
            // Carrier configuration is checked once, here. Reminders created
            // before credentials arrive never gain SMS.
            channels: ChannelSet::with_enabled(true, self.sms.is_configured(), true),
            scheduled_for: None,
            expires_at: None,
            related_entity: Some(RelatedEntity {
                entity_type: "payment".to_string(),
                entity_id: payment_id,
            }),
            action_url: Some(format!("/payments/{}", payment_id.to_hex())),
            created_by: None,
        })
        .await
    }

    pub async fn evaluation_due(
        &self,
        recipient_id: ObjectId,
        evaluation_id: ObjectId,
        training_name: &str,
    ) -> DaoResult<Notification> {
        let now = DateTime::now();
        self.create(NewNotification {
            recipient_id,
            notification_type: NotificationType::EvaluationDue,
            title: "Evaluation Due".to_string(),
            message: format!("Your evaluation for {training_name} is due"),
            priority: NotificationPriority::Medium,
            channels: ChannelSet::with_enabled(true, false, true),
            scheduled_for: Some(now),
            expires_at: Some(DateTime::from_millis(
                now.timestamp_millis() + EVALUATION_WINDOW_MS,
            )),
            related_entity: Some(RelatedEntity {
                entity_type: "evaluation".to_string(),
                entity_id: evaluation_id,
            }),
            action_url: Some(format!("/evaluations/{}", evaluation_id.to_hex())),
            created_by: None,
        })
        .await
    }
}

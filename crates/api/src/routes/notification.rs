use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::{DateTime, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};
use traino_db::models::{
    ChannelSet, ChannelState, Notification, NotificationPriority, NotificationType, RelatedEntity,
};
use traino_services::dao::base::PaginationParams;
use traino_services::notify::NewNotification;

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub recipient_id: String,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub priority: NotificationPriority,
    pub channels: Option<ChannelsRequest>,
    pub scheduled_for: Option<String>,
    pub expires_at: Option<String>,
    pub action_url: Option<String>,
    pub related_entity: Option<RelatedEntityRequest>,
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelsRequest {
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub sms: bool,
    #[serde(default)]
    pub in_app: bool,
}

#[derive(Debug, Deserialize)]
pub struct RelatedEntityRequest {
    pub entity_type: String,
    pub entity_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TrainingProgressRequest {
    pub recipient_id: String,
    pub training_id: String,
    pub training_name: String,
    pub percent_complete: u8,
}

#[derive(Debug, Deserialize)]
pub struct PaymentReminderRequest {
    pub recipient_id: String,
    pub payment_id: String,
    pub amount: f64,
    pub due_date: String,
}

#[derive(Debug, Deserialize)]
pub struct EvaluationDueRequest {
    pub recipient_id: String,
    pub evaluation_id: String,
    pub training_name: String,
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub recipient_id: String,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct RecipientQuery {
    pub recipient_id: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub id: String,
    pub recipient_id: String,
    pub notification_type: String,
    pub title: String,
    pub message: String,
    pub priority: String,
    pub channels: ChannelsResponse,
    pub status: String,
    pub scheduled_for: String,
    pub expires_at: Option<String>,
    pub related_entity: Option<RelatedEntityResponse>,
    pub action_url: Option<String>,
    pub is_read: bool,
    pub read_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelsResponse {
    pub email: ChannelStateResponse,
    pub sms: ChannelStateResponse,
    pub in_app: ChannelStateResponse,
}

#[derive(Debug, Serialize)]
pub struct ChannelStateResponse {
    pub enabled: bool,
    pub sent: bool,
    pub sent_at: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RelatedEntityResponse {
    pub entity_type: String,
    pub entity_id: String,
}

impl From<ChannelState> for ChannelStateResponse {
    fn from(c: ChannelState) -> Self {
        ChannelStateResponse {
            enabled: c.enabled,
            sent: c.sent,
            sent_at: c
                .sent_at
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            error: c.error,
        }
    }
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        NotificationResponse {
            id: n.id.unwrap().to_hex(),
            recipient_id: n.recipient_id.to_hex(),
            notification_type: format!("{:?}", n.notification_type),
            title: n.title,
            message: n.message,
            priority: format!("{:?}", n.priority),
            channels: ChannelsResponse {
                email: n.channels.email.into(),
                sms: n.channels.sms.into(),
                in_app: n.channels.in_app.into(),
            },
            status: format!("{:?}", n.status),
            scheduled_for: n.scheduled_for.try_to_rfc3339_string().unwrap_or_default(),
            expires_at: n
                .expires_at
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            related_entity: n.related_entity.map(|r| RelatedEntityResponse {
                entity_type: r.entity_type,
                entity_id: r.entity_id.to_hex(),
            }),
            action_url: n.action_url,
            is_read: n.is_read,
            read_at: n
                .read_at
                .map(|d| d.try_to_rfc3339_string().unwrap_or_default()),
            created_at: n.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

fn parse_datetime(value: &str, field: &str) -> Result<DateTime, ApiError> {
    let parsed = chrono::DateTime::parse_from_rfc3339(value)
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field}: expected RFC 3339")))?;
    Ok(DateTime::from_chrono(parsed))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateNotificationRequest>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let recipient_id = ObjectId::parse_str(&body.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;

    let created_by = match body.created_by.as_deref() {
        Some(raw) => Some(
            ObjectId::parse_str(raw)
                .map_err(|_| ApiError::BadRequest("Invalid created_by".to_string()))?,
        ),
        None => None,
    };

    let related_entity = match body.related_entity {
        Some(r) => Some(RelatedEntity {
            entity_id: ObjectId::parse_str(&r.entity_id)
                .map_err(|_| ApiError::BadRequest("Invalid entity_id".to_string()))?,
            entity_type: r.entity_type,
        }),
        None => None,
    };

    let scheduled_for = body
        .scheduled_for
        .as_deref()
        .map(|s| parse_datetime(s, "scheduled_for"))
        .transpose()?;
    let expires_at = body
        .expires_at
        .as_deref()
        .map(|s| parse_datetime(s, "expires_at"))
        .transpose()?;

    let channels = match body.channels {
        Some(c) => ChannelSet::with_enabled(c.email, c.sms, c.in_app),
        None => ChannelSet::with_enabled(true, false, true),
    };

    let notification = state
        .notifier
        .create(NewNotification {
            recipient_id,
            notification_type: body.notification_type,
            title: body.title,
            message: body.message,
            priority: body.priority,
            channels,
            scheduled_for,
            expires_at,
            related_entity,
            action_url: body.action_url,
            created_by,
        })
        .await?;

    Ok(Json(notification.into()))
}

pub async fn training_progress(
    State(state): State<AppState>,
    Json(body): Json<TrainingProgressRequest>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let recipient_id = ObjectId::parse_str(&body.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;
    let training_id = ObjectId::parse_str(&body.training_id)
        .map_err(|_| ApiError::BadRequest("Invalid training_id".to_string()))?;

    let notification = state
        .notifier
        .training_progress(
            recipient_id,
            training_id,
            &body.training_name,
            body.percent_complete,
        )
        .await?;

    Ok(Json(notification.into()))
}

pub async fn payment_reminder(
    State(state): State<AppState>,
    Json(body): Json<PaymentReminderRequest>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let recipient_id = ObjectId::parse_str(&body.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;
    let payment_id = ObjectId::parse_str(&body.payment_id)
        .map_err(|_| ApiError::BadRequest("Invalid payment_id".to_string()))?;
    let due_date = parse_datetime(&body.due_date, "due_date")?;

    let notification = state
        .notifier
        .payment_reminder(recipient_id, payment_id, body.amount, due_date)
        .await?;

    Ok(Json(notification.into()))
}

pub async fn evaluation_due(
    State(state): State<AppState>,
    Json(body): Json<EvaluationDueRequest>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let recipient_id = ObjectId::parse_str(&body.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;
    let evaluation_id = ObjectId::parse_str(&body.evaluation_id)
        .map_err(|_| ApiError::BadRequest("Invalid evaluation_id".to_string()))?;

    let notification = state
        .notifier
        .evaluation_due(recipient_id, evaluation_id, &body.training_name)
        .await?;

    Ok(Json(notification.into()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = ObjectId::parse_str(&query.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;

    let params = PaginationParams {
        page: query.page.unwrap_or(1),
        per_page: query.per_page.unwrap_or(25),
    };

    let result = state.notifications.list_for_recipient(rid, &params).await?;

    let items: Vec<NotificationResponse> = result
        .items
        .into_iter()
        .map(NotificationResponse::from)
        .collect();

    Ok(Json(serde_json::json!({
        "items": items,
        "total": result.total,
        "page": result.page,
        "per_page": result.per_page,
        "total_pages": result.total_pages,
    })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> Result<Json<NotificationResponse>, ApiError> {
    let id = ObjectId::parse_str(&notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification_id".to_string()))?;

    let notification = state.notifications.base.find_by_id(id).await?;

    Ok(Json(notification.into()))
}

pub async fn unread_count(
    State(state): State<AppState>,
    Query(query): Query<RecipientQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = ObjectId::parse_str(&query.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;

    let count = state.notifications.unread_count(rid).await?;

    Ok(Json(serde_json::json!({ "count": count })))
}

pub async fn mark_read(
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
    Query(query): Query<RecipientQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = ObjectId::parse_str(&notification_id)
        .map_err(|_| ApiError::BadRequest("Invalid notification_id".to_string()))?;
    let rid = ObjectId::parse_str(&query.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;

    let updated = state.notifications.mark_read(rid, id).await?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

pub async fn mark_all_read(
    State(state): State<AppState>,
    Query(query): Query<RecipientQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let rid = ObjectId::parse_str(&query.recipient_id)
        .map_err(|_| ApiError::BadRequest("Invalid recipient_id".to_string()))?;

    let updated = state.notifications.mark_all_read(rid).await?;

    Ok(Json(serde_json::json!({ "updated": updated })))
}

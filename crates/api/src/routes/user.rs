use axum::{
    Json,
    extract::{Path, Query, State},
};
use bson::{doc, oid::ObjectId};
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, state::AppState};
use traino_db::models::{Role, User};
use traino_services::dao::base::PaginationParams;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    pub contact_number: Option<String>,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub contact_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        UserResponse {
            id: u.id.unwrap().to_hex(),
            email: u.email,
            full_name: u.full_name,
            contact_number: u.contact_number,
            role: format!("{:?}", u.role),
            is_active: u.is_active,
            created_at: u.created_at.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CreateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .create(body.email, body.full_name, body.contact_number, body.role)
        .await?;

    Ok(Json(user.into()))
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = state
        .users
        .base
        .find_paginated(
            doc! { "deleted_at": null },
            Some(doc! { "created_at": -1 }),
            &params,
        )
        .await?;

    let items: Vec<UserResponse> = result.items.into_iter().map(UserResponse::from).collect();

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
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let uid = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    let user = state.users.base.find_by_id(uid).await?;

    Ok(Json(user.into()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let uid = ObjectId::parse_str(&user_id)
        .map_err(|_| ApiError::BadRequest("Invalid user_id".to_string()))?;

    if !state.users.soft_delete(uid).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Ok(Json(serde_json::json!({ "deleted": true })))
}

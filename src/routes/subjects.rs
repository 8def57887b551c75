use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::Subject;
use crate::routes::validation::{parse_id, JsonPayload, SubjectPayload};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// GET /api/subjects (newest first)
pub async fn list_subjects(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Subject>>> {
    let subjects = state.store.list_subjects(user_id).await?;
    Ok(Json(subjects))
}

/// GET /api/subjects/:id
pub async fn get_subject(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Subject>> {
    let id = parse_id(&id, AppError::SubjectNotFound)?;

    state
        .store
        .find_subject(id, user_id)
        .await?
        .map(Json)
        .ok_or(AppError::SubjectNotFound)
}

/// POST /api/subjects
pub async fn create_subject(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: JsonPayload<SubjectPayload>,
) -> Result<(StatusCode, Json<Subject>)> {
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;
    let subject = state.store.insert_subject(user_id, &fields).await?;

    tracing::info!("Subject {} created for user {}", subject.id, user_id);
    Ok((StatusCode::CREATED, Json(subject)))
}

/// PUT /api/subjects/:id
pub async fn update_subject(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: JsonPayload<SubjectPayload>,
) -> Result<Json<Subject>> {
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;
    let id = parse_id(&id, AppError::SubjectNotFound)?;

    state
        .store
        .update_subject(id, user_id, &fields)
        .await?
        .map(Json)
        .ok_or(AppError::SubjectNotFound)
}

/// Delete a subject together with all of its questions
///
/// DELETE /api/subjects/:id
pub async fn delete_subject(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id, AppError::SubjectNotFound)?;

    state
        .store
        .delete_subject(id, user_id)
        .await?
        .ok_or(AppError::SubjectNotFound)?;

    tracing::info!("Subject {} deleted for user {}", id, user_id);
    Ok(Json(MessageResponse {
        message: "Subject deleted successfully",
    }))
}

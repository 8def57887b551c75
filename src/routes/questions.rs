use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::models::Question;
use crate::routes::subjects::MessageResponse;
use crate::routes::validation::{parse_id, JsonPayload, QuestionPayload};
use crate::AppState;

/// GET /api/questions/subject/:subject_id
///
/// A subject the caller does not own lists as empty.
pub async fn list_questions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(subject_id): Path<String>,
) -> Result<Json<Vec<Question>>> {
    let Ok(subject_id) = parse_id(&subject_id, AppError::SubjectNotFound) else {
        return Ok(Json(Vec::new()));
    };

    let questions = state.store.list_questions(subject_id, user_id).await?;
    Ok(Json(questions))
}

/// GET /api/questions/:id
pub async fn get_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Question>> {
    let id = parse_id(&id, AppError::QuestionNotFound)?;

    state
        .store
        .find_question(id, user_id)
        .await?
        .map(Json)
        .ok_or(AppError::QuestionNotFound)
}

/// POST /api/questions/subject/:subject_id
pub async fn create_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(subject_id): Path<String>,
    payload: JsonPayload<QuestionPayload>,
) -> Result<(StatusCode, Json<Question>)> {
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;
    let subject_id = parse_id(&subject_id, AppError::SubjectNotFound)?;

    let question = state
        .store
        .insert_question(subject_id, user_id, &fields)
        .await?
        .ok_or(AppError::SubjectNotFound)?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// PUT /api/questions/:id
pub async fn update_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: JsonPayload<QuestionPayload>,
) -> Result<Json<Question>> {
    let Json(payload) = payload?;
    let fields = payload.into_fields()?;
    let id = parse_id(&id, AppError::QuestionNotFound)?;

    state
        .store
        .update_question(id, user_id, &fields)
        .await?
        .map(Json)
        .ok_or(AppError::QuestionNotFound)
}

/// DELETE /api/questions/:id
pub async fn delete_question(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id = parse_id(&id, AppError::QuestionNotFound)?;

    state
        .store
        .delete_question(id, user_id)
        .await?
        .ok_or(AppError::QuestionNotFound)?;

    Ok(Json(MessageResponse {
        message: "Question deleted successfully",
    }))
}

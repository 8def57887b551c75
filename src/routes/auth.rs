use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::error::Result;
use crate::models::{AuthResponse, UserSummary};
use crate::routes::validation::{CredentialsPayload, JsonPayload};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub user: UserSummary,
}

/// Register a new account
///
/// POST /api/auth/register
///
/// Returns 201 with a token so the client is signed in straight away.
pub async fn register(
    State(state): State<AppState>,
    payload: JsonPayload<CredentialsPayload>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let profile = state.auth.register(&username, &password).await?;
    let token = state.auth.issue_token(profile.id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: profile.into(),
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: JsonPayload<CredentialsPayload>,
) -> Result<Json<AuthResponse>> {
    let Json(payload) = payload?;
    let username = payload.username.unwrap_or_default();
    let password = payload.password.unwrap_or_default();

    let response = state.auth.login(&username, &password).await?;
    tracing::info!("User logged in: {}", response.user.id);

    Ok(Json(response))
}

/// Return the profile behind the caller's token
///
/// GET /api/auth/verify
pub async fn verify(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<VerifyResponse>> {
    let profile = state.auth.load_identity(user_id).await?;

    Ok(Json(VerifyResponse {
        user: profile.into(),
    }))
}

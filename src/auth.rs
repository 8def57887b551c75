//! Authentication service and the bearer-token extractor.
//!
//! Registration and login run against the injected [`Store`]; token
//! verification is purely cryptographic and never touches the database.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::sync::Arc;
use uuid::Uuid;

use crate::constants::{ERR_CREDENTIALS_REQUIRED, ERR_PASSWORD_TOO_SHORT, MIN_PASSWORD_LEN};
use crate::db::{Store, StoreError};
use crate::error::{AppError, Result};
use crate::models::{AuthResponse, UserProfile};
use crate::security::{hash_password, verify_password, TokenKeys};
use crate::AppState;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    keys: TokenKeys,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, keys: TokenKeys, bcrypt_cost: u32) -> Self {
        Self {
            store,
            keys,
            bcrypt_cost,
        }
    }

    /// Create an account and return its public profile
    ///
    /// The username pre-check only short-circuits the common case; the
    /// store's unique constraint decides races between concurrent sign-ups.
    pub async fn register(&self, username: &str, password: &str) -> Result<UserProfile> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(ERR_CREDENTIALS_REQUIRED.to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(ERR_PASSWORD_TOO_SHORT.to_string()));
        }

        if self.store.find_user_by_username(username).await?.is_some() {
            tracing::info!("Registration rejected, username already exists");
            return Err(AppError::UsernameTaken);
        }

        let plain = password.to_string();
        let cost = self.bcrypt_cost;
        let password_hash =
            tokio::task::spawn_blocking(move || hash_password(&plain, cost)).await??;

        let user = match self.store.insert_user(username, &password_hash).await {
            Ok(user) => user,
            Err(StoreError::UniqueViolation(constraint)) => {
                tracing::info!(
                    "Registration lost a race on {}, username already exists",
                    constraint
                );
                return Err(AppError::UsernameTaken);
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("New user registered: {}", user.id);
        Ok(user.profile())
    }

    /// Exchange credentials for a token
    ///
    /// Unknown usernames and wrong passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse> {
        if username.is_empty() || password.is_empty() {
            return Err(AppError::InvalidInput(ERR_CREDENTIALS_REQUIRED.to_string()));
        }

        let Some(user) = self.store.find_user_by_username(username).await? else {
            return Err(AppError::InvalidCredentials);
        };

        let plain = password.to_string();
        let password_hash = user.password_hash.clone();
        let valid =
            tokio::task::spawn_blocking(move || verify_password(&plain, &password_hash)).await?;
        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        Ok(AuthResponse {
            token: self.issue_token(user.id)?,
            user: user.summary(),
        })
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String> {
        Ok(self.keys.issue(user_id)?)
    }

    /// Resolve a bearer token to the user id it was issued for
    pub fn verify_token(&self, token: &str) -> Result<Uuid> {
        self.keys.verify(token).map_err(|e| {
            tracing::debug!("Rejected token: {}", e);
            AppError::Unauthorized("Invalid or expired token")
        })
    }

    /// Current profile of an authenticated user
    pub async fn load_identity(&self, user_id: Uuid) -> Result<UserProfile> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .map(|user| user.profile())
            .ok_or(AppError::UserNotFound)
    }
}

/// Authenticated caller, taken from `Authorization: Bearer <token>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized("No token provided"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::Unauthorized("No token provided"))?;

        let user_id = state.auth.verify_token(token)?;
        Ok(AuthUser(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const SECRET: &str = "test-secret-key-that-is-32-bytes!";

    fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = AuthService::new(store.clone(), TokenKeys::new(SECRET, 24), 4);
        (service, store)
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, _) = service();

        let profile = auth.register("alice", "secret1").await.unwrap();
        assert_eq!(profile.username, "alice");

        let session = auth.login("alice", "secret1").await.unwrap();
        assert_eq!(session.user.id, profile.id);
        assert_eq!(auth.verify_token(&session.token).unwrap(), profile.id);
    }

    #[tokio::test]
    async fn test_register_validates_input() {
        let (auth, _) = service();

        assert!(matches!(
            auth.register("", "secret1").await,
            Err(AppError::InvalidInput(msg)) if msg == ERR_CREDENTIALS_REQUIRED
        ));
        assert!(matches!(
            auth.register("alice", "").await,
            Err(AppError::InvalidInput(msg)) if msg == ERR_CREDENTIALS_REQUIRED
        ));
        assert!(matches!(
            auth.register("alice", "12345").await,
            Err(AppError::InvalidInput(msg)) if msg == ERR_PASSWORD_TOO_SHORT
        ));
        assert!(auth.register("alice", "123456").await.is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (auth, _) = service();

        auth.register("alice", "secret1").await.unwrap();
        assert!(matches!(
            auth.register("alice", "another1").await,
            Err(AppError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (auth, _) = service();
        auth.register("alice", "secret1").await.unwrap();

        let wrong_password = auth.login("alice", "wrong-password").await.unwrap_err();
        let unknown_user = auth.login("mallory", "secret1").await.unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_user, AppError::InvalidCredentials));
        assert_eq!(wrong_password.status(), unknown_user.status());
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_transient_store_failure_is_not_an_auth_failure() {
        let (auth, store) = service();
        auth.register("alice", "secret1").await.unwrap();

        store.fail_next(1);
        let err = auth.login("alice", "secret1").await.unwrap_err();
        assert!(matches!(err, AppError::Store(ref e) if e.is_transient()));
    }

    #[tokio::test]
    async fn test_load_identity() {
        let (auth, _) = service();
        let profile = auth.register("alice", "secret1").await.unwrap();

        assert_eq!(auth.load_identity(profile.id).await.unwrap(), profile);
        assert!(matches!(
            auth.load_identity(Uuid::new_v4()).await,
            Err(AppError::UserNotFound)
        ));
    }

    #[test]
    fn test_verify_token_rejects_garbage() {
        let (auth, _) = service();
        assert!(matches!(
            auth.verify_token("garbage"),
            Err(AppError::Unauthorized(_))
        ));
    }
}

//! Quick Revisor API Server Library
//!
//! This module exports the core types and functions for testing and reuse.

pub mod auth;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod security;

pub use auth::{AuthService, AuthUser};
pub use config::Config;
pub use error::{AppError, Result};

use std::sync::Arc;

use db::Store;
use security::TokenKeys;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: AuthService,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState over `store`, with token keys taken from `config`
    pub fn new(store: Arc<dyn Store>, config: Config) -> Self {
        let keys = TokenKeys::new(&config.jwt_secret, config.token_ttl_hours);
        let auth = AuthService::new(store.clone(), keys, config.bcrypt_cost);
        Self {
            store,
            auth,
            config,
        }
    }
}

pub mod auth;
pub mod health;
pub mod questions;
pub mod subjects;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub use auth::{login, register, verify};
pub use health::health_check;
pub use questions::{create_question, delete_question, get_question, list_questions, update_question};
pub use subjects::{create_subject, delete_subject, get_subject, list_subjects, update_subject};

/// All API routes bound to `state`
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/verify", get(verify))
        .route("/api/subjects", get(list_subjects).post(create_subject))
        .route(
            "/api/subjects/:id",
            get(get_subject).put(update_subject).delete(delete_subject),
        )
        .route(
            "/api/questions/subject/:subject_id",
            get(list_questions).post(create_question),
        )
        .route(
            "/api/questions/:id",
            get(get_question).put(update_question).delete(delete_question),
        )
        .with_state(state)
}

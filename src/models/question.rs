use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Flashcard entry belonging to a subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub topic: Option<String>,
    pub question_text: String,
    pub answer_text: String,
    pub created_at: DateTime<Utc>,
}

/// Validated fields for creating or replacing a question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFields {
    pub topic: Option<String>,
    pub question_text: String,
    pub answer_text: String,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subject owned by a single user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Subject {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Free-form label such as "2024" or "Year 2"
    pub year: Option<String>,
    pub name: String,
    pub related_question: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated fields for creating or replacing a subject
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectFields {
    pub year: Option<String>,
    pub name: String,
    pub related_question: Option<String>,
}

//! Repository traits.
//!
//! Every read, update and delete is scoped by the requesting user. A row that
//! does not exist and a row that belongs to someone else are both reported as
//! `None`, so callers cannot tell the two apart.

use async_trait::async_trait;
use uuid::Uuid;

use super::StoreResult;
use crate::models::{Question, QuestionFields, Subject, SubjectFields, User};

/// Credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Insert a user; a taken username fails with `StoreError::UniqueViolation`
    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<User>;
}

#[async_trait]
pub trait SubjectStore: Send + Sync {
    /// All subjects of `user_id`, newest first
    async fn list_subjects(&self, user_id: Uuid) -> StoreResult<Vec<Subject>>;

    async fn find_subject(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Subject>>;

    async fn insert_subject(&self, user_id: Uuid, fields: &SubjectFields) -> StoreResult<Subject>;

    async fn update_subject(
        &self,
        id: Uuid,
        user_id: Uuid,
        fields: &SubjectFields,
    ) -> StoreResult<Option<Subject>>;

    /// Delete a subject and, by cascade, its questions
    async fn delete_subject(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Subject>>;
}

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Questions of a subject owned by `user_id`, newest first
    ///
    /// Unknown or foreign subjects yield an empty list.
    async fn list_questions(&self, subject_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Question>>;

    async fn find_question(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Question>>;

    /// Insert under `subject_id`; `None` when the subject is not owned by `user_id`
    async fn insert_question(
        &self,
        subject_id: Uuid,
        user_id: Uuid,
        fields: &QuestionFields,
    ) -> StoreResult<Option<Question>>;

    async fn update_question(
        &self,
        id: Uuid,
        user_id: Uuid,
        fields: &QuestionFields,
    ) -> StoreResult<Option<Question>>;

    async fn delete_question(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Question>>;
}

/// Everything the HTTP layer needs from persistence
#[async_trait]
pub trait Store: UserStore + SubjectStore + QuestionStore {
    /// Cheap connectivity check for the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}

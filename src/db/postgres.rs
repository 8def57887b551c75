use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::retry::{QueryExecutor, RetryPolicy};
use super::store::{QuestionStore, Store, SubjectStore, UserStore};
use super::{StoreError, StoreResult};
use crate::models::{Question, QuestionFields, Subject, SubjectFields, User};

/// PostgreSQL-backed store; every statement goes through the retrying executor
#[derive(Debug, Clone)]
pub struct PgStore {
    exec: QueryExecutor,
}

impl PgStore {
    pub fn new(pool: PgPool, policy: RetryPolicy) -> Self {
        Self {
            exec: QueryExecutor::new(pool, policy),
        }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, User>(
                    "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
                )
                .bind(username)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, User>(
                    "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (username, password_hash) VALUES ($1, $2) \
                     RETURNING id, username, password_hash, created_at",
                )
                .bind(username)
                .bind(password_hash)
                .fetch_one(&pool)
                .await
            })
            .await
    }
}

#[async_trait]
impl SubjectStore for PgStore {
    async fn list_subjects(&self, user_id: Uuid) -> StoreResult<Vec<Subject>> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Subject>(
                    "SELECT id, user_id, year, name, related_question, created_at \
                     FROM subjects WHERE user_id = $1 ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&pool)
                .await
            })
            .await
    }

    async fn find_subject(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Subject>> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Subject>(
                    "SELECT id, user_id, year, name, related_question, created_at \
                     FROM subjects WHERE id = $1 AND user_id = $2",
                )
                .bind(id)
                .bind(user_id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    async fn insert_subject(&self, user_id: Uuid, fields: &SubjectFields) -> StoreResult<Subject> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Subject>(
                    "INSERT INTO subjects (user_id, year, name, related_question) \
                     VALUES ($1, $2, $3, $4) \
                     RETURNING id, user_id, year, name, related_question, created_at",
                )
                .bind(user_id)
                .bind(fields.year.as_deref())
                .bind(fields.name.as_str())
                .bind(fields.related_question.as_deref())
                .fetch_one(&pool)
                .await
            })
            .await
    }

    async fn update_subject(
        &self,
        id: Uuid,
        user_id: Uuid,
        fields: &SubjectFields,
    ) -> StoreResult<Option<Subject>> {
        if self.find_subject(id, user_id).await?.is_none() {
            return Ok(None);
        }

        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Subject>(
                    "UPDATE subjects SET year = $1, name = $2, related_question = $3 \
                     WHERE id = $4 AND user_id = $5 \
                     RETURNING id, user_id, year, name, related_question, created_at",
                )
                .bind(fields.year.as_deref())
                .bind(fields.name.as_str())
                .bind(fields.related_question.as_deref())
                .bind(id)
                .bind(user_id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    async fn delete_subject(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Subject>> {
        if self.find_subject(id, user_id).await?.is_none() {
            return Ok(None);
        }

        // questions go with it through ON DELETE CASCADE
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Subject>(
                    "DELETE FROM subjects WHERE id = $1 AND user_id = $2 \
                     RETURNING id, user_id, year, name, related_question, created_at",
                )
                .bind(id)
                .bind(user_id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }
}

#[async_trait]
impl QuestionStore for PgStore {
    async fn list_questions(&self, subject_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Question>> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Question>(
                    "SELECT q.id, q.subject_id, q.topic, q.question_text, q.answer_text, q.created_at \
                     FROM questions q INNER JOIN subjects s ON q.subject_id = s.id \
                     WHERE q.subject_id = $1 AND s.user_id = $2 \
                     ORDER BY q.created_at DESC",
                )
                .bind(subject_id)
                .bind(user_id)
                .fetch_all(&pool)
                .await
            })
            .await
    }

    async fn find_question(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Question>> {
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Question>(
                    "SELECT q.id, q.subject_id, q.topic, q.question_text, q.answer_text, q.created_at \
                     FROM questions q INNER JOIN subjects s ON q.subject_id = s.id \
                     WHERE q.id = $1 AND s.user_id = $2",
                )
                .bind(id)
                .bind(user_id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    async fn insert_question(
        &self,
        subject_id: Uuid,
        user_id: Uuid,
        fields: &QuestionFields,
    ) -> StoreResult<Option<Question>> {
        // ownership check and insert in one statement: no row selected, nothing inserted
        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Question>(
                    "INSERT INTO questions (subject_id, topic, question_text, answer_text) \
                     SELECT s.id, $2, $3, $4 FROM subjects s WHERE s.id = $1 AND s.user_id = $5 \
                     RETURNING id, subject_id, topic, question_text, answer_text, created_at",
                )
                .bind(subject_id)
                .bind(fields.topic.as_deref())
                .bind(fields.question_text.as_str())
                .bind(fields.answer_text.as_str())
                .bind(user_id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    async fn update_question(
        &self,
        id: Uuid,
        user_id: Uuid,
        fields: &QuestionFields,
    ) -> StoreResult<Option<Question>> {
        if self.find_question(id, user_id).await?.is_none() {
            return Ok(None);
        }

        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Question>(
                    "UPDATE questions SET topic = $1, question_text = $2, answer_text = $3 \
                     WHERE id = $4 \
                     RETURNING id, subject_id, topic, question_text, answer_text, created_at",
                )
                .bind(fields.topic.as_deref())
                .bind(fields.question_text.as_str())
                .bind(fields.answer_text.as_str())
                .bind(id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }

    async fn delete_question(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Question>> {
        if self.find_question(id, user_id).await?.is_none() {
            return Ok(None);
        }

        self.exec
            .run(move |pool| async move {
                sqlx::query_as::<_, Question>(
                    "DELETE FROM questions WHERE id = $1 \
                     RETURNING id, subject_id, topic, question_text, answer_text, created_at",
                )
                .bind(id)
                .fetch_optional(&pool)
                .await
            })
            .await
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(self.exec.pool())
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
}

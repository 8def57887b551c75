//! In-process store.
//!
//! Mirrors the PostgreSQL schema's behaviour (unique usernames, ownership
//! scoping, cascade on subject delete, newest-first listing) without a
//! database, and can be told to fail as if the database had gone away.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use super::store::{QuestionStore, Store, SubjectStore, UserStore};
use super::{StoreError, StoreResult};
use crate::models::{Question, QuestionFields, Subject, SubjectFields, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    subjects: Vec<Subject>,
    questions: Vec<Question>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    pending_failures: AtomicU32,
    stalled: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` operations fail with a transient error
    pub fn fail_next(&self, count: u32) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// While set, `ping` never completes, like a database that accepts the
    /// socket but never answers
    pub fn stall_pings(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    fn check_available(&self) -> StoreResult<()> {
        let consumed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();

        if consumed {
            return Err(StoreError::Unavailable(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    fn tables(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.check_available()?;
        Ok(self.tables.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Tables {
    fn owns_subject(&self, subject_id: Uuid, user_id: Uuid) -> bool {
        self.subjects
            .iter()
            .any(|s| s.id == subject_id && s.user_id == user_id)
    }

    fn owned_question_index(&self, id: Uuid, user_id: Uuid) -> Option<usize> {
        let index = self.questions.iter().position(|q| q.id == id)?;
        self.owns_subject(self.questions[index].subject_id, user_id)
            .then_some(index)
    }
}

/// Newest first; rows created in the same instant keep reverse insertion order
fn newest_first<T>(mut rows: Vec<T>, created_at: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    rows.reverse();
    rows.sort_by_key(|row| Reverse(created_at(row)));
    rows
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables()?;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let mut tables = self.tables()?;
        if tables.users.iter().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation("users_username_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }
}

#[async_trait]
impl SubjectStore for MemoryStore {
    async fn list_subjects(&self, user_id: Uuid) -> StoreResult<Vec<Subject>> {
        let tables = self.tables()?;
        let owned: Vec<Subject> = tables
            .subjects
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(owned, |s| s.created_at))
    }

    async fn find_subject(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Subject>> {
        let tables = self.tables()?;
        Ok(tables
            .subjects
            .iter()
            .find(|s| s.id == id && s.user_id == user_id)
            .cloned())
    }

    async fn insert_subject(&self, user_id: Uuid, fields: &SubjectFields) -> StoreResult<Subject> {
        let mut tables = self.tables()?;
        let subject = Subject {
            id: Uuid::new_v4(),
            user_id,
            year: fields.year.clone(),
            name: fields.name.clone(),
            related_question: fields.related_question.clone(),
            created_at: Utc::now(),
        };
        tables.subjects.push(subject.clone());
        Ok(subject)
    }

    async fn update_subject(
        &self,
        id: Uuid,
        user_id: Uuid,
        fields: &SubjectFields,
    ) -> StoreResult<Option<Subject>> {
        let mut tables = self.tables()?;
        let Some(subject) = tables
            .subjects
            .iter_mut()
            .find(|s| s.id == id && s.user_id == user_id)
        else {
            return Ok(None);
        };

        subject.year = fields.year.clone();
        subject.name = fields.name.clone();
        subject.related_question = fields.related_question.clone();
        Ok(Some(subject.clone()))
    }

    async fn delete_subject(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Subject>> {
        let mut tables = self.tables()?;
        let Some(index) = tables
            .subjects
            .iter()
            .position(|s| s.id == id && s.user_id == user_id)
        else {
            return Ok(None);
        };

        let subject = tables.subjects.remove(index);
        tables.questions.retain(|q| q.subject_id != subject.id);
        Ok(Some(subject))
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn list_questions(&self, subject_id: Uuid, user_id: Uuid) -> StoreResult<Vec<Question>> {
        let tables = self.tables()?;
        if !tables.owns_subject(subject_id, user_id) {
            return Ok(Vec::new());
        }

        let questions: Vec<Question> = tables
            .questions
            .iter()
            .filter(|q| q.subject_id == subject_id)
            .cloned()
            .collect();
        Ok(newest_first(questions, |q| q.created_at))
    }

    async fn find_question(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Question>> {
        let tables = self.tables()?;
        Ok(tables
            .owned_question_index(id, user_id)
            .map(|index| tables.questions[index].clone()))
    }

    async fn insert_question(
        &self,
        subject_id: Uuid,
        user_id: Uuid,
        fields: &QuestionFields,
    ) -> StoreResult<Option<Question>> {
        let mut tables = self.tables()?;
        if !tables.owns_subject(subject_id, user_id) {
            return Ok(None);
        }

        let question = Question {
            id: Uuid::new_v4(),
            subject_id,
            topic: fields.topic.clone(),
            question_text: fields.question_text.clone(),
            answer_text: fields.answer_text.clone(),
            created_at: Utc::now(),
        };
        tables.questions.push(question.clone());
        Ok(Some(question))
    }

    async fn update_question(
        &self,
        id: Uuid,
        user_id: Uuid,
        fields: &QuestionFields,
    ) -> StoreResult<Option<Question>> {
        let mut tables = self.tables()?;
        let Some(index) = tables.owned_question_index(id, user_id) else {
            return Ok(None);
        };

        let question = &mut tables.questions[index];
        question.topic = fields.topic.clone();
        question.question_text = fields.question_text.clone();
        question.answer_text = fields.answer_text.clone();
        Ok(Some(question.clone()))
    }

    async fn delete_question(&self, id: Uuid, user_id: Uuid) -> StoreResult<Option<Question>> {
        let mut tables = self.tables()?;
        let Some(index) = tables.owned_question_index(id, user_id) else {
            return Ok(None);
        };

        Ok(Some(tables.questions.remove(index)))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn subject_fields(name: &str) -> SubjectFields {
        SubjectFields {
            year: Some("2024".to_string()),
            name: name.to_string(),
            related_question: None,
        }
    }

    fn question_fields(text: &str) -> QuestionFields {
        QuestionFields {
            topic: None,
            question_text: text.to_string(),
            answer_text: "answer".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_unique_violation() {
        let store = MemoryStore::new();
        store.insert_user("alice", "hash").await.unwrap();

        let result = store.insert_user("alice", "other").await;
        assert!(matches!(result, Err(StoreError::UniqueViolation(_))));
    }

    #[tokio::test]
    async fn test_subjects_listed_newest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        for name in ["first", "second", "third"] {
            store.insert_subject(user, &subject_fields(name)).await.unwrap();
        }

        let names: Vec<String> = store
            .list_subjects(user)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_subject_scoped_to_owner() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let subject = store.insert_subject(owner, &subject_fields("Maths")).await.unwrap();

        assert!(store.find_subject(subject.id, stranger).await.unwrap().is_none());
        assert!(store
            .update_subject(subject.id, stranger, &subject_fields("Hacked"))
            .await
            .unwrap()
            .is_none());
        assert!(store.delete_subject(subject.id, stranger).await.unwrap().is_none());

        let still_there = store.find_subject(subject.id, owner).await.unwrap().unwrap();
        assert_eq!(still_there.name, "Maths");
    }

    #[tokio::test]
    async fn test_delete_subject_cascades_to_questions() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let subject = store.insert_subject(user, &subject_fields("Physics")).await.unwrap();
        let question = store
            .insert_question(subject.id, user, &question_fields("What is g?"))
            .await
            .unwrap()
            .unwrap();

        store.delete_subject(subject.id, user).await.unwrap().unwrap();

        assert!(store.find_question(question.id, user).await.unwrap().is_none());
        assert!(store.list_questions(subject.id, user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_question_requires_owned_subject() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let subject = store.insert_subject(owner, &subject_fields("Chemistry")).await.unwrap();

        let result = store
            .insert_question(subject.id, Uuid::new_v4(), &question_fields("H2O?"))
            .await
            .unwrap();
        assert!(result.is_none());
        assert!(store.list_questions(subject.id, owner).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fail_next_injects_transient_errors() {
        let store = MemoryStore::new();
        store.fail_next(2);

        assert!(store.ping().await.unwrap_err().is_transient());
        assert!(store.list_subjects(Uuid::new_v4()).await.unwrap_err().is_transient());
        assert!(store.ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_stalled_ping_never_completes() {
        let store = MemoryStore::new();
        store.stall_pings(true);

        let result = tokio::time::timeout(Duration::from_millis(20), store.ping()).await;
        assert!(result.is_err());

        store.stall_pings(false);
        assert!(store.ping().await.is_ok());
    }
}

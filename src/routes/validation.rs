use axum::{extract::rejection::JsonRejection, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::{ERR_QUESTION_FIELDS_REQUIRED, ERR_SUBJECT_NAME_REQUIRED};
use crate::error::AppError;
use crate::models::{QuestionFields, SubjectFields};

/// JSON body whose rejection is turned into `AppError` by the handler
pub type JsonPayload<T> = Result<Json<T>, JsonRejection>;

/// Parse a path id; a malformed id cannot name an existing row
pub fn parse_id(raw: &str, not_found: AppError) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| not_found)
}

/// Treat an empty string the same as an absent field
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct CredentialsPayload {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubjectPayload {
    pub year: Option<String>,
    pub name: Option<String>,
    pub related_question: Option<String>,
}

impl SubjectPayload {
    pub fn into_fields(self) -> Result<SubjectFields, AppError> {
        let name = present(self.name)
            .ok_or_else(|| AppError::InvalidInput(ERR_SUBJECT_NAME_REQUIRED.to_string()))?;

        Ok(SubjectFields {
            year: self.year,
            name,
            related_question: self.related_question,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct QuestionPayload {
    pub topic: Option<String>,
    pub question_text: Option<String>,
    pub answer_text: Option<String>,
}

impl QuestionPayload {
    pub fn into_fields(self) -> Result<QuestionFields, AppError> {
        match (present(self.question_text), present(self.answer_text)) {
            (Some(question_text), Some(answer_text)) => Ok(QuestionFields {
                topic: self.topic,
                question_text,
                answer_text,
            }),
            _ => Err(AppError::InvalidInput(
                ERR_QUESTION_FIELDS_REQUIRED.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4();
        assert_eq!(
            parse_id(&id.to_string(), AppError::SubjectNotFound).unwrap(),
            id
        );
        assert!(matches!(
            parse_id("42", AppError::SubjectNotFound),
            Err(AppError::SubjectNotFound)
        ));
    }

    #[test]
    fn test_subject_name_is_required() {
        let missing = SubjectPayload::default();
        assert!(matches!(missing.into_fields(), Err(AppError::InvalidInput(_))));

        let empty = SubjectPayload {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(matches!(empty.into_fields(), Err(AppError::InvalidInput(_))));

        let fields = SubjectPayload {
            year: Some("2025".to_string()),
            name: Some("Biology".to_string()),
            related_question: None,
        }
        .into_fields()
        .unwrap();
        assert_eq!(fields.name, "Biology");
        assert_eq!(fields.year.as_deref(), Some("2025"));
    }

    #[test]
    fn test_question_needs_both_texts() {
        let only_question = QuestionPayload {
            question_text: Some("Why?".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            only_question.into_fields(),
            Err(AppError::InvalidInput(msg)) if msg == ERR_QUESTION_FIELDS_REQUIRED
        ));

        let fields = QuestionPayload {
            topic: Some("Optics".to_string()),
            question_text: Some("Why is the sky blue?".to_string()),
            answer_text: Some("Rayleigh scattering".to_string()),
        }
        .into_fields()
        .unwrap();
        assert_eq!(fields.topic.as_deref(), Some("Optics"));
    }
}

// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

pub const KIND_MCQ: &str = "MCQ";
pub const KIND_CODING: &str = "CODING";

/// One choice of a multiple-choice question.
/// Stored verbatim inside the 'options' JSONB column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub text: String,
    #[serde(default)]
    pub is_correct: bool,
}

/// One test case of a coding question.
/// Stored verbatim inside the 'test_cases' JSONB column.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub is_hidden: bool,
}

/// Represents the 'questions' table in the database.
/// Only admins ever see this shape; students get [`PublicQuestion`].
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,

    /// Question kind: 'MCQ' or 'CODING'.
    pub kind: String,

    /// Subject tag, e.g. 'DSA', 'DBMS'.
    pub subject: String,

    /// Topic tag, e.g. 'Arrays', 'Indexing'.
    pub topic: String,

    pub difficulty: String,

    /// The text content of the question.
    pub text: String,

    /// MCQ choices with their correctness flags.
    pub options: Json<Vec<QuestionOption>>,

    /// Initial code handed to the student (CODING only).
    pub code_stub: Option<String>,

    pub test_cases: Json<Vec<TestCase>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Test case as exposed to students: the hidden flag is stripped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicTestCase {
    pub input: String,
    pub output: String,
}

/// DTO for sending a question to students.
/// Strips everything that reveals correctness: option flags and the
/// hidden-test-case marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicQuestion {
    pub id: i64,
    pub kind: String,
    pub subject: String,
    pub topic: String,
    pub difficulty: String,
    pub text: String,
    pub options: Vec<String>,
    pub code_stub: Option<String>,
    pub test_cases: Vec<PublicTestCase>,
}

impl Question {
    pub fn into_public(self) -> PublicQuestion {
        PublicQuestion {
            id: self.id,
            kind: self.kind,
            subject: self.subject,
            topic: self.topic,
            difficulty: self.difficulty,
            text: self.text,
            options: self.options.0.into_iter().map(|o| o.text).collect(),
            code_stub: self.code_stub,
            test_cases: self
                .test_cases
                .0
                .into_iter()
                .map(|tc| PublicTestCase {
                    input: tc.input,
                    output: tc.output,
                })
                .collect(),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionRequest {
    #[validate(custom(function = validate_kind))]
    pub kind: String,
    #[validate(length(min = 1, max = 100))]
    pub subject: String,
    #[validate(length(min = 1, max = 100))]
    pub topic: String,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[validate(length(min = 1, max = 5000))]
    pub text: String,
    #[serde(default)]
    #[validate(custom(function = validate_options))]
    pub options: Vec<QuestionOption>,
    pub code_stub: Option<String>,
    #[serde(default)]
    pub test_cases: Vec<TestCase>,
}

fn default_difficulty() -> String {
    "Medium".to_string()
}

fn validate_kind(kind: &str) -> Result<(), validator::ValidationError> {
    if kind != KIND_MCQ && kind != KIND_CODING {
        return Err(validator::ValidationError::new("unknown_question_kind"));
    }
    Ok(())
}

fn validate_options(options: &[QuestionOption]) -> Result<(), validator::ValidationError> {
    for opt in options {
        if opt.text.is_empty() || opt.text.len() > 500 {
            return Err(validator::ValidationError::new("option_text_length"));
        }
    }
    Ok(())
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionRequest {
    pub kind: Option<String>,
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub text: Option<String>,
    pub options: Option<Vec<QuestionOption>>,
    pub code_stub: Option<String>,
    pub test_cases: Option<Vec<TestCase>>,
}

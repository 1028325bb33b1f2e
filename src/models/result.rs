// src/models/result.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Pass/fail outcome of a submitted attempt.
/// Passing is inclusive: score == passing_marks is a Pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExamStatus {
    Pass,
    Fail,
}

impl ExamStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ExamStatus::Pass => "Pass",
            ExamStatus::Fail => "Fail",
        }
    }
}

/// Frozen per-question outcome, one entry per test question.
/// Stored verbatim inside the 'answers' JSONB column of 'results'.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOutcome {
    pub question_id: i64,
    pub selected_option: Option<String>,
    pub code_submitted: Option<String>,
    pub is_correct: bool,
    pub marks_obtained: i64,
}

/// Identifier and timestamp of a freshly inserted result row.
#[derive(Debug, FromRow)]
pub struct CreatedResult {
    pub id: i64,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

/// The created Result document returned to the submitting client.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultResponse {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub score: i64,
    pub total_marks: i64,
    pub accuracy: f64,
    pub status: ExamStatus,
    pub time_taken: i64,
    pub answers: Vec<AnswerOutcome>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
}

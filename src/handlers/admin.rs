// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        test::{CreateTestRequest, Test},
    },
};

/// Query parameters for listing questions.
#[derive(Debug, Deserialize)]
pub struct ListQuestionsParams {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub kind: Option<String>,
}

/// Lists bank questions, optionally filtered by subject/topic/difficulty/kind.
/// Admin only: this shape includes the correct-option flags.
pub async fn list_questions(
    State(pool): State<PgPool>,
    Query(params): Query<ListQuestionsParams>,
) -> Result<impl IntoResponse, AppError> {
    let questions: Vec<Question> = sqlx::query_as(
        r#"
        SELECT id, kind, subject, topic, difficulty, text, options,
               code_stub, test_cases, created_at
        FROM questions
        WHERE ($1::TEXT IS NULL OR subject = $1)
          AND ($2::TEXT IS NULL OR topic = $2)
          AND ($3::TEXT IS NULL OR difficulty = $3)
          AND ($4::TEXT IS NULL OR kind = $4)
        ORDER BY created_at DESC
        "#,
    )
    .bind(params.subject)
    .bind(params.topic)
    .bind(params.difficulty)
    .bind(params.kind)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::StorageError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Creates a new bank question.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let question: Question = sqlx::query_as(
        r#"
        INSERT INTO questions (kind, subject, topic, difficulty, text, options, code_stub, test_cases)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, kind, subject, topic, difficulty, text, options,
                  code_stub, test_cases, created_at
        "#,
    )
    .bind(&payload.kind)
    .bind(&payload.subject)
    .bind(&payload.topic)
    .bind(&payload.difficulty)
    .bind(&payload.text)
    .bind(sqlx::types::Json(&payload.options))
    .bind(&payload.code_stub)
    .bind(sqlx::types::Json(&payload.test_cases))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::StorageError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

/// Updates a question by ID.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.kind.is_none()
        && payload.subject.is_none()
        && payload.topic.is_none()
        && payload.difficulty.is_none()
        && payload.text.is_none()
        && payload.options.is_none()
        && payload.code_stub.is_none()
        && payload.test_cases.is_none()
    {
        return Ok(StatusCode::OK);
    }

    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(kind) = payload.kind {
        separated.push("kind = ");
        separated.push_bind_unseparated(kind);
    }

    if let Some(subject) = payload.subject {
        separated.push("subject = ");
        separated.push_bind_unseparated(subject);
    }

    if let Some(topic) = payload.topic {
        separated.push("topic = ");
        separated.push_bind_unseparated(topic);
    }

    if let Some(difficulty) = payload.difficulty {
        separated.push("difficulty = ");
        separated.push_bind_unseparated(difficulty);
    }

    if let Some(text) = payload.text {
        separated.push("text = ");
        separated.push_bind_unseparated(text);
    }

    if let Some(options) = payload.options {
        separated.push("options = ");
        separated.push_bind_unseparated(serde_json::to_value(options).unwrap_or_default());
    }

    if let Some(code_stub) = payload.code_stub {
        separated.push("code_stub = ");
        separated.push_bind_unseparated(code_stub);
    }

    if let Some(test_cases) = payload.test_cases {
        separated.push("test_cases = ");
        separated.push_bind_unseparated(serde_json::to_value(test_cases).unwrap_or_default());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::StorageError(e.to_string())
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::OK)
}

/// Deletes a bank question by ID.
/// Admin only. Tests that still reference it will surface a data-integrity
/// error at evaluation time; nothing prevents the delete here.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::StorageError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Creates a new test paper with its ordered question list.
/// Admin only. `totalMarks` defaults to the sum of per-question marks.
pub async fn create_test(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let total_marks = payload
        .total_marks
        .unwrap_or_else(|| payload.questions.iter().map(|q| q.marks).sum());

    let mut tx = pool.begin().await?;

    let test: Test = sqlx::query_as(
        r#"
        INSERT INTO tests (title, description, duration_minutes, total_marks,
                           passing_marks, category, difficulty)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id, title, description, duration_minutes, total_marks,
                  passing_marks, category, difficulty, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.duration_minutes)
    .bind(total_marks)
    .bind(payload.passing_marks)
    .bind(&payload.category)
    .bind(&payload.difficulty)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create test: {:?}", e);
        AppError::StorageError(e.to_string())
    })?;

    for (position, item) in payload.questions.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO test_questions (test_id, question_id, marks, position)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(test.id)
        .bind(item.question_id)
        .bind(item.marks)
        .bind(position as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(test)))
}

/// Deletes a test paper by ID; its question rows cascade.
/// Admin only. Existing results keep their frozen copy of the outcome.
pub async fn delete_test(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM tests WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete test: {:?}", e);
            AppError::StorageError(e.to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Test not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

// src/repository/postgres.rs

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use super::{
    AppendOutcome, AuthorizationRegistry, HistoryRepository, QuestionRepository, RepositoryError,
};
use crate::models::{
    history::HistoryRecord,
    identity::Identity,
    question::{AssessmentType, Choice, Question},
};

#[derive(FromRow)]
struct AssessmentTypeRow {
    id: i64,
    name: String,
    pass_ratio: Option<f64>,
}

#[derive(FromRow)]
struct QuestionRow {
    id: i64,
    type_id: i64,
    prompt: String,
    level: i32,
}

#[derive(FromRow)]
struct ChoiceRow {
    id: i64,
    question_id: i64,
    text: String,
    is_correct: bool,
}

/// Looks identities up in `authorized_candidates`.
#[derive(Clone)]
pub struct PgAuthorizationRegistry {
    pool: PgPool,
}

impl PgAuthorizationRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationRegistry for PgAuthorizationRegistry {
    async fn is_authorized(&self, identity: &Identity) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM authorized_candidates WHERE lower(email) = $1)",
        )
        .bind(identity.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

#[derive(Clone)]
pub struct PgQuestionRepository {
    pool: PgPool,
}

impl PgQuestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn get_type(&self, type_id: i64) -> Result<Option<AssessmentType>, RepositoryError> {
        let row = sqlx::query_as::<_, AssessmentTypeRow>(
            "SELECT id, name, pass_ratio FROM assessment_types WHERE id = $1",
        )
        .bind(type_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| AssessmentType {
            id: r.id,
            name: r.name,
            pass_ratio: r.pass_ratio,
        }))
    }

    async fn get_by_type(&self, type_id: i64) -> Result<Vec<Question>, RepositoryError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT id, type_id, prompt, level FROM questions WHERE type_id = $1 ORDER BY id",
        )
        .bind(type_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        // Dynamic IN clause for every returned question
        let mut query_builder = QueryBuilder::<Postgres>::new(
            "SELECT id, question_id, text, is_correct FROM choices WHERE question_id IN (",
        );
        let mut separated = query_builder.separated(",");
        for row in &rows {
            separated.push_bind(row.id);
        }
        separated.push_unseparated(") ORDER BY question_id, id");

        let choice_rows: Vec<ChoiceRow> = query_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        let mut choices_by_question: HashMap<i64, Vec<Choice>> = HashMap::new();
        for c in choice_rows {
            choices_by_question.entry(c.question_id).or_default().push(Choice {
                id: c.id,
                question_id: c.question_id,
                text: c.text,
                is_correct: c.is_correct,
            });
        }

        Ok(rows
            .into_iter()
            .map(|q| Question {
                choices: choices_by_question.remove(&q.id).unwrap_or_default(),
                id: q.id,
                type_id: q.type_id,
                prompt: q.prompt,
                level: q.level,
            })
            .collect())
    }
}

#[derive(Clone)]
pub struct PgHistoryRepository {
    pool: PgPool,
}

impl PgHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn append(&self, record: &HistoryRecord) -> Result<AppendOutcome, RepositoryError> {
        let correct = db_count("correct", record.correct)?;
        let total = db_count("total", record.total)?;

        let result = sqlx::query(
            r#"
            INSERT INTO exam_history (attempt_id, identity, type_id, correct, total, passed, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (attempt_id) DO NOTHING
            "#,
        )
        .bind(record.attempt_id)
        .bind(&record.identity)
        .bind(record.type_id)
        .bind(correct)
        .bind(total)
        .bind(record.passed)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            Ok(AppendOutcome::Duplicate)
        } else {
            Ok(AppendOutcome::Inserted)
        }
    }
}

/// Counts are stored as `INTEGER`; refuse values that would not fit.
fn db_count(column: &str, value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value)
        .map_err(|_| RepositoryError::Data(format!("{column} {value} does not fit an INTEGER column")))
}

// src/handlers/assessment.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppError,
    exam::ExamEngine,
    models::{
        exam::{NavigateRequest, SelectAnswerRequest, SessionView, StartExamRequest},
        test_reference::TestReference,
    },
    state::{SessionStore, SharedSession},
};

async fn find_session(sessions: &SessionStore, id: Uuid) -> Result<SharedSession, AppError> {
    sessions
        .get(id)
        .await
        .ok_or(AppError::NotFound("Session not found".to_string()))
}

/// Opens a shareable test link.
///
/// * Parses the slug into a test reference.
/// * Authorizes the identity and loads the question set.
/// * Stores the live session and returns it with its questions (no answer keys).
///
/// A failed start drops its session. Posting again opens a new session with a new attempt id.
pub async fn start_exam(
    State(engine): State<Arc<ExamEngine>>,
    State(sessions): State<SessionStore>,
    Path(slug): Path<String>,
    Json(payload): Json<StartExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let reference = TestReference::parse(&slug)?;
    let mut session = engine.open_session(reference);
    session.start(&payload.identity).await?;

    let view = SessionView::from_session(&session, true);
    sessions.insert(session).await;

    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the current snapshot, including the result and save status once submitted.
pub async fn get_session(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shared = find_session(&sessions, id).await?;
    let session = shared.lock().await;

    Ok(Json(SessionView::from_session(&session, true)))
}

pub async fn select_answer(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let shared = find_session(&sessions, id).await?;
    let mut session = shared.lock().await;
    session.select_answer(req.question_id, req.choice_id)?;

    Ok(Json(SessionView::from_session(&session, false)))
}

pub async fn navigate(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
    Json(req): Json<NavigateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let shared = find_session(&sessions, id).await?;
    let mut session = shared.lock().await;
    session.navigate(req.delta)?;

    Ok(Json(SessionView::from_session(&session, false)))
}

/// Submits the attempt.
///
/// The score is returned right away; saving it to history continues in the
/// background and shows up on later snapshots.
pub async fn submit(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shared = find_session(&sessions, id).await?;
    let mut session = shared.lock().await;
    session.submit()?;

    Ok(Json(SessionView::from_session(&session, false)))
}

/// Re-sends a history write that failed. Only legal after a failed save.
pub async fn retry_history(
    State(sessions): State<SessionStore>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let shared = find_session(&sessions, id).await?;
    let mut session = shared.lock().await;
    session.retry_persist()?;

    Ok((StatusCode::ACCEPTED, Json(SessionView::from_session(&session, false))))
}

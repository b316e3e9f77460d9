//! Axum route handlers for the Sessions API.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::info;
use uuid::Uuid;

use crate::analysis::clarity::{analyze, ClarityReport};
use crate::cards::{synthesize, validate_for_synthesis, CardSet};
use crate::conversation::answers::read_step_answer;
use crate::conversation::models::Message;
use crate::conversation::state::{ConversationState, Phase, Step, StepStatus};
use crate::conversation::store::SharedSession;
use crate::errors::{ApiJson, AppError};
use crate::models::extracted::ExtractedData;
use crate::models::posting::{JobPosting, JobPostingView, RequiredField};
use crate::models::scraped::{ScrapedPosting, ScrapedProfile};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionCardsRequest {
    pub peer_postings: Vec<ScrapedPosting>,
    pub candidate_profiles: Vec<ScrapedProfile>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub phase: Phase,
    pub active_step: Step,
    pub steps: Vec<StepStatus>,
    pub data: ExtractedData,
    pub posting: JobPostingView,
    pub missing_fields: Vec<RequiredField>,
    pub clarity: ClarityReport,
    pub messages: Vec<Message>,
}

impl From<&ConversationState> for SessionSnapshot {
    fn from(session: &ConversationState) -> Self {
        let posting = session.posting();
        Self {
            id: session.id,
            phase: session.phase(),
            active_step: session.active_step(),
            steps: session.steps(),
            data: session.data().clone(),
            missing_fields: posting.missing_fields(),
            clarity: analyze(&session.user_input(), &posting),
            posting: posting.into(),
            messages: session.messages().to_vec(),
        }
    }
}

async fn find_session(state: &AppState, id: Uuid) -> Result<SharedSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionSnapshot>) {
    let session = state.sessions.create().await;
    let session = session.lock().await;
    info!(session_id = %session.id, "Session created");
    (StatusCode::CREATED, Json(SessionSnapshot::from(&*session)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let session = session.lock().await;
    Ok(Json(SessionSnapshot::from(&*session)))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.sessions.remove(id).await {
        return Err(AppError::NotFound(format!("Session {id} not found")));
    }
    info!(session_id = %id, "Session discarded");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/messages
/// Parses the message, drops low-confidence fields, reads what is left as an
/// answer to the active step, and merges the result.
pub async fn handle_post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<MessageRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let content = req.content.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("message content must not be empty".to_string()));
    }

    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.ensure_open()?;

    let backend_timeout = state.config.backend_timeout;
    let parsed = timeout(backend_timeout, state.parser.parse(content, session.data()))
        .await
        .map_err(|_| {
            AppError::BackendUnavailable(format!(
                "{} parser timed out after {backend_timeout:?}",
                state.parser.name()
            ))
        })??;
    let mut update = parsed.accepted(state.config.min_field_confidence);
    let answer = read_step_answer(session.active_step(), content, session.data(), &update);
    update.fill_gaps(&answer);

    let phase = session.accept(content, &update)?;
    info!(session_id = %id, ?phase, step = ?session.active_step(), "Message accepted");
    Ok(Json(SessionSnapshot::from(&*session)))
}

/// POST /api/v1/sessions/:id/advance
pub async fn handle_advance(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    let phase = session.advance()?;
    info!(session_id = %id, ?phase, "Session advanced");
    Ok(Json(SessionSnapshot::from(&*session)))
}

/// POST /api/v1/sessions/:id/cancel
pub async fn handle_cancel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = find_session(&state, id).await?;
    let mut session = session.lock().await;
    session.cancel();
    Ok(Json(SessionSnapshot::from(&*session)))
}

/// POST /api/v1/sessions/:id/cards
/// Synthesizes cards from a read-only snapshot of a Ready session.
pub async fn handle_session_cards(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<CardSet>, AppError> {
    // An empty body means no peers or profiles.
    let req: SessionCardsRequest = if body.iter().all(u8::is_ascii_whitespace) {
        SessionCardsRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::InvalidInput(e.to_string()))?
    };

    let posting = {
        let session = find_session(&state, id).await?;
        let session = session.lock().await;
        session.ready_posting()?
    };
    validate_for_synthesis(&posting)?;

    let peers: Vec<JobPosting> = req.peer_postings.iter().map(JobPosting::from_scraped).collect();
    Ok(Json(synthesize(&posting, &peers, &req.candidate_profiles)))
}

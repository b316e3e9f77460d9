//! Axum route handlers for the Postings API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::{ApiJson, AppError};
use crate::extraction::pipeline::{posting_from_text, posting_from_url};
use crate::extraction::{Extraction, ExtractionMethod};
use crate::models::posting::{JobPostingView, RequiredField};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FromUrlRequest {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct FromTextRequest {
    pub text: String,
    /// Provenance label; defaults to "text".
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostingResponse {
    pub posting: JobPostingView,
    pub missing_fields: Vec<RequiredField>,
    pub method: ExtractionMethod,
}

impl From<Extraction> for PostingResponse {
    fn from(extraction: Extraction) -> Self {
        Self {
            missing_fields: extraction.missing_fields(),
            method: extraction.method,
            posting: extraction.posting.into(),
        }
    }
}

/// POST /api/v1/postings/from-url
pub async fn handle_from_url(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FromUrlRequest>,
) -> Result<Json<PostingResponse>, AppError> {
    let extraction = posting_from_url(&state, &req.url).await?;
    Ok(Json(extraction.into()))
}

/// POST /api/v1/postings/from-text
pub async fn handle_from_text(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<FromTextRequest>,
) -> Result<Json<PostingResponse>, AppError> {
    let extraction = posting_from_text(&state, &req.text, req.source.as_deref()).await?;
    Ok(Json(extraction.into()))
}

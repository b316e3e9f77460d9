//! Axum route handlers for the Cards API.

use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cards::models::RoleCard;
use crate::cards::role::role_card;
use crate::cards::{synthesize, validate_for_synthesis, CardSet};
use crate::errors::{ApiJson, AppError};
use crate::models::posting::JobPosting;
use crate::models::scraped::{ScrapedPosting, ScrapedProfile};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SynthesizeRequest {
    /// The first entry is the posting the cards describe; any others count as peers.
    pub postings: Vec<ScrapedPosting>,
    pub peer_postings: Vec<ScrapedPosting>,
    pub candidate_profiles: Vec<ScrapedProfile>,
}

#[derive(Debug, Deserialize)]
pub struct RoleCardRequest {
    pub posting: ScrapedPosting,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleCardResponse {
    pub role_card: RoleCard,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/cards/synthesize
pub async fn handle_synthesize(
    ApiJson(req): ApiJson<SynthesizeRequest>,
) -> Result<Json<CardSet>, AppError> {
    let mut postings = req.postings.iter().map(JobPosting::from_scraped);
    let posting = postings
        .next()
        .ok_or_else(|| {
            AppError::InvalidInput("postings must contain at least one entry".to_string())
        })?;
    validate_for_synthesis(&posting)?;

    let peers: Vec<JobPosting> = postings
        .chain(req.peer_postings.iter().map(JobPosting::from_scraped))
        .collect();

    let set = synthesize(&posting, &peers, &req.candidate_profiles);
    info!(
        peers = peers.len(),
        profiles = req.candidate_profiles.len(),
        confidence = posting.confidence,
        "Cards synthesized"
    );
    Ok(Json(set))
}

/// POST /api/v1/cards/role
/// Builds a RoleCard straight from a scraped posting, without the parsing backend.
pub async fn handle_role_card(
    ApiJson(req): ApiJson<RoleCardRequest>,
) -> Json<RoleCardResponse> {
    let posting = JobPosting::from_scraped(&req.posting);
    Json(RoleCardResponse {
        role_card: role_card(&posting, &[]),
    })
}

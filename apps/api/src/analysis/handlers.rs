//! Axum route handlers for the Roles API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::analysis::clarity::{analyze, ClarityReport};
use crate::errors::{ApiJson, AppError};
use crate::extraction::pipeline::parse_role_text;
use crate::models::posting::JobPostingView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseRoleRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseRoleResponse {
    pub parsed_data: JobPostingView,
    pub analysis: ClarityReport,
}

/// POST /api/v1/roles/parse
/// Parses a free-text role description and scores how complete it is.
pub async fn handle_parse_role(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ParseRoleRequest>,
) -> Result<Json<ParseRoleResponse>, AppError> {
    let extraction = parse_role_text(&state, &req.text).await?;
    let analysis = analyze(&req.text, &extraction.posting);
    info!(
        clarity = analysis.clarity,
        missing = analysis.missing_fields.len(),
        "Role description parsed"
    );
    Ok(Json(ParseRoleResponse {
        parsed_data: extraction.posting.into(),
        analysis,
    }))
}

//! Fetch → extract → enrich, with a bounded timeout around every external call.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::extraction::parser::FieldParser;
use crate::extraction::{extract, extract_document, Extraction};
use crate::fetch::{validate_url, FetchError};
use crate::models::posting::RequiredField;
use crate::state::AppState;

/// Fetches `url` once and extracts a posting from whatever came back.
pub async fn posting_from_url(state: &AppState, url: &str) -> Result<Extraction, AppError> {
    validate_url(url)?;

    let fetch_timeout = state.config.fetch_timeout;
    let raw = match timeout(fetch_timeout, state.fetcher.fetch(url)).await {
        Ok(Ok(raw)) => raw,
        Ok(Err(e)) => {
            warn!(url, kind = ?e.kind(), "Fetch failed: {e}");
            return Err(e.into());
        }
        Err(_) => {
            warn!(url, "Fetch exceeded {fetch_timeout:?}");
            return Err(FetchError::Timeout(fetch_timeout).into());
        }
    };

    let extraction = extract_document(&raw.body, raw.is_markup(), &raw.origin, true);
    info!(
        origin = %raw.origin,
        method = ?extraction.method,
        confidence = extraction.posting.confidence,
        "Extracted posting from URL"
    );
    finish(state, extraction).await
}

/// Extracts a posting from pasted text or HTML.
pub async fn posting_from_text(
    state: &AppState,
    content: &str,
    source: Option<&str>,
) -> Result<Extraction, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".to_string()));
    }
    let source = source.map(str::trim).filter(|s| !s.is_empty()).unwrap_or("text");
    let extraction = extract(content, source, false);
    finish(state, extraction).await
}

/// Extracts a role description for analysis. An input with no recoverable
/// fields is still a result here; the clarity report says what is missing.
pub async fn parse_role_text(state: &AppState, content: &str) -> Result<Extraction, AppError> {
    if content.trim().is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".to_string()));
    }
    let extraction = extract(content, "text", false);
    enrich_with_state(state, extraction).await
}

async fn finish(state: &AppState, extraction: Extraction) -> Result<Extraction, AppError> {
    let extraction = enrich_with_state(state, extraction).await?;
    ensure_recoverable(extraction)
}

async fn enrich_with_state(state: &AppState, extraction: Extraction) -> Result<Extraction, AppError> {
    enrich(
        state.parser.as_ref(),
        extraction,
        state.config.backend_timeout,
        state.config.min_field_confidence,
    )
    .await
}

/// Lets the parsing backend fill fields the deterministic passes left empty.
/// Deterministic values always win; backend values only fill gaps.
pub async fn enrich(
    parser: &dyn FieldParser,
    mut extraction: Extraction,
    backend_timeout: Duration,
    min_field_confidence: f32,
) -> Result<Extraction, AppError> {
    if extraction.missing_fields().is_empty() || extraction.text.trim().is_empty() {
        return Ok(extraction);
    }

    let parsed = timeout(backend_timeout, parser.parse(&extraction.text, &extraction.data))
        .await
        .map_err(|_| {
            AppError::BackendUnavailable(format!(
                "{} parser timed out after {backend_timeout:?}",
                parser.name()
            ))
        })??;

    extraction.data.fill_gaps(&parsed.accepted(min_field_confidence));
    extraction.rebuild();
    Ok(extraction)
}

/// Zero recovered fields is the one case extraction escalates to a failure.
fn ensure_recoverable(extraction: Extraction) -> Result<Extraction, AppError> {
    if extraction.data.is_empty() {
        return Err(AppError::ExtractionUncertain {
            message: "No job-posting fields could be recovered from the input".to_string(),
            missing_fields: RequiredField::ALL.to_vec(),
        });
    }
    Ok(extraction)
}

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::conversation::state::TransitionError;
use crate::fetch::{FetchError, SourceFailureKind};
use crate::models::posting::RequiredField;

const PASTE_TEXT_GUIDANCE: &str = "Paste the text of the job posting instead.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Escalated only when not a single field could be recovered.
    #[error("Extraction uncertain: {message}")]
    ExtractionUncertain {
        message: String,
        missing_fields: Vec<RequiredField>,
    },

    #[error("Source unavailable ({}): {detail}", .kind.as_str())]
    SourceUnavailable {
        kind: SourceFailureKind,
        detail: String,
    },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// `Json` body extractor whose rejections use the `AppError` envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

impl From<FetchError> for AppError {
    fn from(e: FetchError) -> Self {
        match e.kind() {
            Some(kind) => AppError::SourceUnavailable {
                kind,
                detail: e.to_string(),
            },
            None => AppError::InvalidInput(e.to_string()),
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(e: TransitionError) -> Self {
        AppError::InvalidTransition(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut guidance: Option<&str> = None;
        let mut retryable = false;
        let mut missing: Option<Value> = None;

        let (status, code, category, message) = match &self {
            AppError::InvalidInput(msg) => (
                StatusCode::BAD_REQUEST,
                "INVALID_INPUT",
                "InvalidInput",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", "NotFound", msg.clone()),
            AppError::InvalidTransition(msg) => (
                StatusCode::CONFLICT,
                "INVALID_TRANSITION",
                "InvalidTransition",
                msg.clone(),
            ),
            AppError::ExtractionUncertain {
                message,
                missing_fields,
            } => {
                missing = Some(json!(missing_fields));
                guidance = Some(PASTE_TEXT_GUIDANCE);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "EXTRACTION_UNCERTAIN",
                    "ExtractionUncertain",
                    message.clone(),
                )
            }
            AppError::SourceUnavailable { kind, detail } => {
                tracing::warn!("Source unavailable ({}): {detail}", kind.as_str());
                guidance = Some(PASTE_TEXT_GUIDANCE);
                (
                    StatusCode::BAD_GATEWAY,
                    "SOURCE_UNAVAILABLE",
                    kind.as_str(),
                    format!(
                        "The source page is inaccessible ({}). Paste the text instead.",
                        kind.as_str().to_lowercase()
                    ),
                )
            }
            AppError::BackendUnavailable(msg) => {
                tracing::error!("Backend unavailable: {msg}");
                retryable = true;
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "BACKEND_UNAVAILABLE",
                    "BackendUnavailable",
                    "The parsing backend is unavailable; try again shortly".to_string(),
                )
            }
            AppError::InternalInconsistency(msg) => {
                tracing::error!("Internal inconsistency: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "InternalInconsistency",
                    "An internal server error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let mut error = json!({
            "code": code,
            "category": category,
            "message": message,
            "retryable": retryable,
        });
        if let Some(guidance) = guidance {
            error["guidance"] = json!(guidance);
        }
        if let Some(missing) = missing {
            error["missingFields"] = missing;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_blocked_source_carries_category_and_guidance() {
        let err = AppError::from(FetchError::Blocked {
            status: Some(403),
            reason: "HTTP 403".to_string(),
        });
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], "SOURCE_UNAVAILABLE");
        assert_eq!(body["error"]["category"], "Blocked");
        assert!(body["error"]["message"].as_str().unwrap().contains("Paste the text"));
        assert_eq!(body["error"]["guidance"], PASTE_TEXT_GUIDANCE);
        assert_eq!(body["error"]["retryable"], false);
    }

    #[tokio::test]
    async fn test_invalid_url_is_caller_error() {
        let (status, body) =
            body_of(AppError::from(FetchError::InvalidUrl("nope".to_string()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert!(body["error"].get("guidance").is_none());
    }

    #[tokio::test]
    async fn test_timeout_maps_to_source_unavailable() {
        let err = AppError::from(FetchError::Timeout(Duration::from_secs(10)));
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["category"], "Timeout");
    }

    #[tokio::test]
    async fn test_backend_unavailable_is_retryable() {
        let (status, body) = body_of(AppError::BackendUnavailable("503".to_string())).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["retryable"], true);
    }

    #[tokio::test]
    async fn test_extraction_uncertain_lists_missing_fields() {
        let err = AppError::ExtractionUncertain {
            message: "no fields recovered".to_string(),
            missing_fields: vec![RequiredField::Title, RequiredField::MinSalary],
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["missingFields"], json!(["title", "minSalary"]));
    }

    #[tokio::test]
    async fn test_inconsistency_hides_detail() {
        let (status, body) =
            body_of(AppError::InternalInconsistency("min > max".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal server error occurred");
    }
}

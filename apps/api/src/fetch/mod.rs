//! Source Fetcher: one best-effort GET per call, no retries.
//!
//! Transport failures are classified (blocked / unreachable / timeout) here so
//! the request layer can report them as a single "source inaccessible"
//! category while the logs keep the distinction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::extraction::text::{looks_like_html, visible_text};

pub const DEFAULT_USER_AGENT: &str = "jobcards/0.1 (+single-page fetch)";

/// Statuses an origin uses to turn automated clients away.
const BLOCKING_STATUSES: [u16; 5] = [401, 403, 407, 429, 451];

/// Lowercase markers of bot walls, matched against the raw body of a refused response.
const ANTI_BOT_MARKERS: &[&str] = &[
    "captcha",
    "verify you are human",
    "are you a robot",
    "checking your browser",
    "cf-challenge",
    "challenge-platform",
    "unusual traffic",
    "access denied",
    "enable javascript and cookies to continue",
];

/// Lowercase phrases a challenge page shows in place of content. Only matched
/// against the visible text of a short 2xx page.
const CHALLENGE_PHRASES: &[&str] = &[
    "just a moment",
    "attention required",
    "verify you are human",
    "are you a robot",
    "checking your browser",
    "unusual traffic",
    "access denied",
    "complete the captcha",
    "enable javascript and cookies to continue",
];

/// A 2xx page with more visible text than this is treated as content.
const CHALLENGE_TEXT_MAX_CHARS: usize = 600;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Source unreachable: {0}")]
    Unreachable(String),

    #[error("Source blocked automated access: {reason}")]
    Blocked { status: Option<u16>, reason: String },

    #[error("Source did not respond within {0:?}")]
    Timeout(Duration),
}

/// Internal failure kind, exposed on the wire as the error `category`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SourceFailureKind {
    Blocked,
    Unreachable,
    Timeout,
}

impl SourceFailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFailureKind::Blocked => "Blocked",
            SourceFailureKind::Unreachable => "Unreachable",
            SourceFailureKind::Timeout => "Timeout",
        }
    }
}

impl FetchError {
    /// `None` for caller errors (malformed URL), which are not source failures.
    pub fn kind(&self) -> Option<SourceFailureKind> {
        match self {
            FetchError::InvalidUrl(_) => None,
            FetchError::Unreachable(_) => Some(SourceFailureKind::Unreachable),
            FetchError::Blocked { .. } => Some(SourceFailureKind::Blocked),
            FetchError::Timeout(_) => Some(SourceFailureKind::Timeout),
        }
    }
}

/// Raw page content plus the provenance label later stored as `source`.
#[derive(Debug, Clone)]
pub struct RawContent {
    pub url: String,
    pub origin: String,
    pub body: String,
    pub content_type: Option<String>,
    pub status: u16,
}

impl RawContent {
    pub fn is_markup(&self) -> bool {
        is_markup(self.content_type.as_deref(), &self.body)
    }
}

/// The scraping backend contract. Carried in `AppState` as `Arc<dyn SourceFetcher>`.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError>;
}

// ────────────────────────────────────────────────────────────────────────────
// HttpFetcher (reqwest-backed default)
// ────────────────────────────────────────────────────────────────────────────

pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration, max_bytes: usize) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            timeout,
            max_bytes,
        })
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
        let parsed = validate_url(url)?;
        let origin = host_label(&parsed);

        let response = self
            .client
            .get(parsed.clone())
            .header("accept", "text/html,application/xhtml+xml,text/plain;q=0.9,*/*;q=0.5")
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = read_capped(response, self.max_bytes)
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        classify_response(status, &body, is_markup(content_type.as_deref(), &body))?;
        debug!("Fetched {} bytes from {origin} (status {status})", body.len());

        Ok(RawContent {
            url: parsed.to_string(),
            origin,
            body,
            content_type,
            status,
        })
    }
}

/// Accepts absolute `http`/`https` URLs with a host; anything else is a caller error.
pub fn validate_url(raw: &str) -> Result<Url, FetchError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(FetchError::InvalidUrl("url is empty".to_string()));
    }
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("{raw}: missing host")));
    }
    Ok(url)
}

/// Whether a body should be read as HTML. A declared non-HTML type wins over
/// tags that happen to appear in the body; an unknown type falls back to sniffing.
pub fn is_markup(content_type: Option<&str>, body: &str) -> bool {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    match essence.as_deref() {
        Some("text/html" | "application/xhtml+xml") => true,
        Some("text/plain" | "text/markdown" | "text/csv" | "application/json") => false,
        _ => looks_like_html(body),
    }
}

/// Host label of a URL string, without a leading `www.`.
pub fn origin_of(raw: &str) -> Option<String> {
    validate_url(raw).ok().map(|u| host_label(&u))
}

fn host_label(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    host.strip_prefix("www.").unwrap_or(host).to_string()
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(timeout)
    } else {
        FetchError::Unreachable(e.to_string())
    }
}

async fn read_capped(mut response: reqwest::Response, max_bytes: usize) -> Result<String, reqwest::Error> {
    let mut buf: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = max_bytes.saturating_sub(buf.len());
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if buf.len() >= max_bytes {
            break;
        }
    }
    Ok(decode_truncated(&buf))
}

/// Decodes a possibly cut-off body, dropping a trailing partial character.
fn decode_truncated(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

fn classify_response(status: u16, body: &str, markup: bool) -> Result<(), FetchError> {
    if BLOCKING_STATUSES.contains(&status) {
        return Err(FetchError::Blocked {
            status: Some(status),
            reason: format!("HTTP {status}"),
        });
    }

    if !(200..300).contains(&status) {
        let lower = body.to_lowercase();
        if let Some(marker) = ANTI_BOT_MARKERS.iter().find(|m| lower.contains(*m)) {
            return Err(FetchError::Blocked {
                status: Some(status),
                reason: format!("anti-bot page ({marker})"),
            });
        }
        return Err(FetchError::Unreachable(format!("HTTP {status}")));
    }

    let text = if markup {
        visible_text(body)
    } else {
        body.to_string()
    };
    let text = text.trim();
    if text.is_empty() {
        return Err(FetchError::Blocked {
            status: Some(status),
            reason: "no readable content".to_string(),
        });
    }
    if let Some(phrase) = challenge_phrase(text) {
        return Err(FetchError::Blocked {
            status: Some(status),
            reason: format!("anti-bot page ({phrase})"),
        });
    }
    Ok(())
}

/// The challenge phrase shown by a short page, if any.
fn challenge_phrase(visible: &str) -> Option<&'static str> {
    if visible.chars().count() > CHALLENGE_TEXT_MAX_CHARS {
        return None;
    }
    let lower = visible.to_lowercase();
    CHALLENGE_PHRASES.iter().copied().find(|p| lower.contains(p))
}

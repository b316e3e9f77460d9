pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as roles;
use crate::cards::handlers as cards;
use crate::conversation::handlers as sessions;
use crate::extraction::handlers as postings;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Postings API
        .route("/api/v1/postings/from-url", post(postings::handle_from_url))
        .route("/api/v1/postings/from-text", post(postings::handle_from_text))
        // Cards API
        .route("/api/v1/cards/synthesize", post(cards::handle_synthesize))
        .route("/api/v1/cards/role", post(cards::handle_role_card))
        // Roles API
        .route("/api/v1/roles/parse", post(roles::handle_parse_role))
        // Sessions API
        .route("/api/v1/sessions", post(sessions::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(sessions::handle_get_session).delete(sessions::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/messages",
            post(sessions::handle_post_message),
        )
        .route("/api/v1/sessions/:id/advance", post(sessions::handle_advance))
        .route("/api/v1/sessions/:id/cancel", post(sessions::handle_cancel))
        .route(
            "/api/v1/sessions/:id/cards",
            post(sessions::handle_session_cards),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::fetch::{FetchError, RawContent, SourceFetcher};

    const EXAMPLE_PAGE: &str = "<html><body><h1>Senior Backend Engineer</h1>\
        <p>Remote</p><p>$140,000–$170,000</p></body></html>";

    struct PageFetcher;

    #[async_trait]
    impl SourceFetcher for PageFetcher {
        async fn fetch(&self, url: &str) -> Result<RawContent, FetchError> {
            Ok(RawContent {
                url: url.to_string(),
                origin: "jobs.example.com".to_string(),
                body: EXAMPLE_PAGE.to_string(),
                content_type: Some("text/html".to_string()),
                status: 200,
            })
        }
    }

    struct BlockedFetcher;

    #[async_trait]
    impl SourceFetcher for BlockedFetcher {
        async fn fetch(&self, _url: &str) -> Result<RawContent, FetchError> {
            Err(FetchError::Blocked {
                status: Some(403),
                reason: "HTTP 403".to_string(),
            })
        }
    }

    fn app(fetcher: Arc<dyn SourceFetcher>) -> Router {
        build_router(AppState::for_tests(fetcher))
    }

    async fn call(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let body = body.map(|v| v.to_string()).unwrap_or_default();
        call_raw(app, method, uri, &body).await
    }

    async fn call_raw(app: &Router, method: Method, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn message(app: &Router, base: &str, content: &str) -> Value {
        let (status, body) = call(
            app,
            Method::POST,
            &format!("{base}/messages"),
            Some(json!({ "content": content })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "message {content:?}: {body}");
        body
    }

    async fn advance(app: &Router, base: &str) -> Value {
        let (status, body) = call(app, Method::POST, &format!("{base}/advance"), None).await;
        assert_eq!(status, StatusCode::OK, "advance: {body}");
        body
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "jobcards");
    }

    #[tokio::test]
    async fn test_from_url_example_posting() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/postings/from-url",
            Some(json!({"url": "https://jobs.example.com/posting/42"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let posting = &body["posting"];
        assert_eq!(posting["title"], "Senior Backend Engineer");
        assert_eq!(posting["workModel"], "Remote");
        assert_eq!(posting["minSalary"], 140_000);
        assert_eq!(posting["maxSalary"], 170_000);
        assert_eq!(posting["source"], "jobs.example.com");
        assert!(posting["confidence"].as_f64().unwrap() >= 0.8);
    }

    #[tokio::test]
    async fn test_blocked_source_carries_guidance() {
        let app = app(Arc::new(BlockedFetcher));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/postings/from-url",
            Some(json!({"url": "https://www.linkedin.com/jobs/view/1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let error = &body["error"];
        assert_eq!(error["code"], "SOURCE_UNAVAILABLE");
        assert_eq!(error["category"], "Blocked");
        assert!(error["message"].as_str().unwrap().contains("Paste the text"));
        assert!(error["guidance"].as_str().unwrap().contains("Paste the text"));
    }

    #[tokio::test]
    async fn test_invalid_url_is_bad_request() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/postings/from-url",
            Some(json!({"url": "ftp://jobs.example.com/1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_synthesize_from_scraped_collections() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/cards/synthesize",
            Some(json!({
                "postings": [{
                    "jobTitle": "Data Engineer",
                    "companyName": "Acme",
                    "salary": "$120k - $150k",
                    "skills": ["Python", "Airflow"]
                }],
                "peerPostings": [{
                    "title": "Data Engineer",
                    "skills": ["python"],
                    "salaryMin": 110000,
                    "salaryMax": 130000
                }],
                "candidateProfiles": [{"title": "Data Engineer", "skills": ["Python"]}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["payCard"]["salaryBand"]["min"], 120_000);
        assert_eq!(body["payCard"]["benchmark"]["basis"], "peers");
        assert_eq!(body["marketCard"]["peerPostingCount"], 1);
        assert_eq!(body["roleCard"]["criticalSkill"], "Python");
        assert_eq!(body["metadata"]["inputsConsidered"]["candidateProfiles"], 1);
        assert_eq!(body["metadata"]["cardsGenerated"], json!(["pay", "market", "role"]));
    }

    #[tokio::test]
    async fn test_synthesize_without_postings_is_bad_request() {
        let app = app(Arc::new(PageFetcher));
        let (status, _) = call(
            &app,
            Method::POST,
            "/api/v1/cards/synthesize",
            Some(json!({"postings": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_role_card_from_raw_posting() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/cards/role",
            Some(json!({
                "posting": {"position": "Site Reliability Engineer", "employer": "Globex"}
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["roleCard"]["title"], "Site Reliability Engineer");
        assert_eq!(body["roleCard"]["company"], "Globex");
    }

    #[tokio::test]
    async fn test_parse_role_returns_analysis() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/roles/parse",
            Some(json!({"text": "Senior Backend Engineer\nRemote\n$140,000–$170,000"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["parsedData"]["title"], "Senior Backend Engineer");
        let clarity = body["analysis"]["clarity"].as_u64().unwrap();
        assert!(clarity <= 100);
        assert!(body["analysis"]["missingFields"]
            .as_array()
            .unwrap()
            .contains(&json!("timeline")));
    }

    #[tokio::test]
    async fn test_session_flow_to_cards() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["phase"], "Collecting");
        let id = body["id"].as_str().unwrap().to_string();
        let base = format!("/api/v1/sessions/{id}");

        // Cards are refused until the session is ready.
        let (status, _) = call(&app, Method::POST, &format!("{base}/cards"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = call(&app, Method::POST, &format!("{base}/cancel"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("{base}/messages"),
            Some(json!({"content": "Senior Engineer"})),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

        let (status, _) = call(&app, Method::DELETE, &base, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::GET, &base, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let app = app(Arc::new(PageFetcher));
        for uri in [
            "/api/v1/postings/from-url",
            "/api/v1/postings/from-text",
            "/api/v1/cards/synthesize",
            "/api/v1/cards/role",
            "/api/v1/roles/parse",
        ] {
            let (status, body) = call_raw(&app, Method::POST, uri, "{not json").await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "INVALID_INPUT", "{uri}");
            assert_eq!(body["error"]["retryable"], false);
        }

        let (_, session) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        let base = format!("/api/v1/sessions/{}", session["id"].as_str().unwrap());
        for uri in [format!("{base}/messages"), format!("{base}/cards")] {
            let (status, body) = call_raw(&app, Method::POST, &uri, "{not json").await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["code"], "INVALID_INPUT", "{uri}");
        }
    }

    #[tokio::test]
    async fn test_synthesize_accepts_null_lists() {
        let app = app(Arc::new(PageFetcher));
        let (status, body) = call(
            &app,
            Method::POST,
            "/api/v1/cards/synthesize",
            Some(json!({
                "postings": [{"jobTitle": "Data Engineer", "skills": null, "requirements": null}],
                "candidateProfiles": [{"title": "Data Engineer", "skills": null}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["roleCard"]["title"], "Data Engineer");
    }

    #[tokio::test]
    async fn test_session_reaches_ready_through_messages() {
        let app = app(Arc::new(PageFetcher));
        let (_, body) = call(&app, Method::POST, "/api/v1/sessions", None).await;
        let base = format!("/api/v1/sessions/{}", body["id"].as_str().unwrap());

        let body = message(
            &app,
            &base,
            "Job Title: Senior Backend Engineer\nDepartment: Platform\nSeniority: Senior\nWork model: Hybrid",
        )
        .await;
        assert_eq!(body["phase"], "Collecting");
        assert_eq!(body["steps"][0]["missingFields"], json!(["location"]));
        let body = message(&app, &base, "Austin").await;
        assert_eq!(body["phase"], "StepComplete");
        assert_eq!(body["data"]["location"], "Austin");

        let body = advance(&app, &base).await;
        assert_eq!(body["activeStep"], "skills");
        message(&app, &base, "Rust, Kafka, PostgreSQL").await;

        let body = advance(&app, &base).await;
        assert_eq!(body["activeStep"], "compensation");
        let body = message(&app, &base, "120k - 150k").await;
        assert_eq!(body["phase"], "StepComplete");
        assert_eq!(body["data"]["minSalary"], 120_000);
        assert_eq!(body["data"]["maxSalary"], 150_000);

        let body = advance(&app, &base).await;
        assert_eq!(body["activeStep"], "timeline");
        message(&app, &base, "within 30 days").await;

        let body = advance(&app, &base).await;
        assert_eq!(body["phase"], "Ready");
        assert_eq!(body["missingFields"], json!([]));

        let (status, cards) = call(&app, Method::POST, &format!("{base}/cards"), None).await;
        assert_eq!(status, StatusCode::OK, "{cards}");
        assert_eq!(cards["payCard"]["salaryBand"]["min"], 120_000);
        assert_eq!(cards["roleCard"]["title"], "Senior Backend Engineer");
    }
}

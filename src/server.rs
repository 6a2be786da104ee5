//! HTTP API for the extractor.
//!
//! `POST /api/scrape` takes `{ "url": "...", "dynamic": false }` and answers
//! with a JSON array of absolute image URLs. Failures carry only a generic
//! message; the underlying error is logged here and never returned.

use crate::{ErrorKind, ExtractionError, ExtractionService};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Inbound body of `POST /api/scrape`.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeBody {
    pub url: Option<String>,
    #[serde(default)]
    pub dynamic: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ExtractionService>,
    pub metrics: Option<PrometheusHandle>,
}

/// Build the axum Router with all endpoints.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(render_metrics))
        .route("/api/scrape", post(scrape))
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    addr: SocketAddr,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics disabled").into_response(),
    }
}

async fn scrape(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeBody>, JsonRejection>,
) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            warn!("Rejected scrape body: {}", rejection.body_text());
            return missing_url();
        }
    };

    let Some(url) = body.url.filter(|url| !url.trim().is_empty()) else {
        return missing_url();
    };

    match state.service.extract_url(&url, body.dynamic).await {
        Ok(outcome) => Json(outcome.images).into_response(),
        Err(e) => ApiError(e).into_response(),
    }
}

fn missing_url() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": "Missing URL" })),
    )
        .into_response()
}

struct ApiError(ExtractionError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match self.0.kind() {
            ErrorKind::InvalidInput => "Invalid URL",
            _ => "Scraping failed",
        };

        if status.is_server_error() {
            error!("Scrape request failed: {}", self.0);
        }

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, MockBrowserLauncher, MockPageFetcher};
    use serde_json::Value;

    async fn spawn_app(fetcher: MockPageFetcher, launcher: MockBrowserLauncher) -> String {
        let service = ExtractionService::with_collaborators(
            &Config::default(),
            Arc::new(fetcher),
            Arc::new(launcher),
        );
        let state = AppState {
            service: Arc::new(service),
            metrics: None,
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        format!("http://{addr}")
    }

    async fn post_scrape(base: &str, body: Value) -> (u16, Value) {
        let response = reqwest::Client::new()
            .post(format!("{base}/api/scrape"))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_scrape_returns_image_array() {
        let mut fetcher = MockPageFetcher::new();
        fetcher
            .expect_fetch()
            .times(1)
            .returning(|_| Ok(r#"<img src="/a.png"><img data-src="b.png">"#.to_string()));
        let mut launcher = MockBrowserLauncher::new();
        launcher.expect_launch().times(0);

        let base = spawn_app(fetcher, launcher).await;
        let (status, body) =
            post_scrape(&base, serde_json::json!({ "url": "https://example.com/shop/" })).await;

        assert_eq!(status, 200);
        assert_eq!(
            body,
            serde_json::json!(["https://example.com/a.png", "https://example.com/shop/b.png"])
        );
    }

    #[tokio::test]
    async fn test_missing_url_is_bad_request() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(0);
        let base = spawn_app(fetcher, MockBrowserLauncher::new()).await;

        let (status, body) = post_scrape(&base, serde_json::json!({ "dynamic": true })).await;
        assert_eq!(status, 400);
        assert_eq!(body, serde_json::json!({ "error": "Missing URL" }));
    }

    #[tokio::test]
    async fn test_unreadable_body_is_missing_url() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(0);
        let base = spawn_app(fetcher, MockBrowserLauncher::new()).await;
        let client = reqwest::Client::new();

        let no_body = client
            .post(format!("{base}/api/scrape"))
            .send()
            .await
            .unwrap();
        assert_eq!(no_body.status().as_u16(), 400);
        assert_eq!(
            no_body.json::<Value>().await.unwrap(),
            serde_json::json!({ "error": "Missing URL" })
        );

        let empty_json = client
            .post(format!("{base}/api/scrape"))
            .header("content-type", "application/json")
            .send()
            .await
            .unwrap();
        assert_eq!(empty_json.status().as_u16(), 400);
        assert_eq!(
            empty_json.json::<Value>().await.unwrap(),
            serde_json::json!({ "error": "Missing URL" })
        );

        let (status, body) = post_scrape(&base, serde_json::json!({ "url": 5 })).await;
        assert_eq!(status, 400);
        assert_eq!(body, serde_json::json!({ "error": "Missing URL" }));
    }

    #[tokio::test]
    async fn test_malformed_url_is_bad_request() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(0);
        let base = spawn_app(fetcher, MockBrowserLauncher::new()).await;

        let (status, body) = post_scrape(&base, serde_json::json!({ "url": "example dot com" })).await;
        assert_eq!(status, 400);
        assert_eq!(body, serde_json::json!({ "error": "Invalid URL" }));
    }

    #[tokio::test]
    async fn test_fetch_failure_hides_detail() {
        let mut fetcher = MockPageFetcher::new();
        fetcher.expect_fetch().times(1).returning(|url| {
            Err(ExtractionError::FetchFailed(format!("{url}: HTTP 404")))
        });
        let mut launcher = MockBrowserLauncher::new();
        launcher.expect_launch().times(0);

        let base = spawn_app(fetcher, launcher).await;
        let (status, body) =
            post_scrape(&base, serde_json::json!({ "url": "https://example.com/gone" })).await;

        assert_eq!(status, 500);
        assert_eq!(body, serde_json::json!({ "error": "Scraping failed" }));
    }

    #[tokio::test]
    async fn test_health_and_disabled_metrics() {
        let base = spawn_app(MockPageFetcher::new(), MockBrowserLauncher::new()).await;
        let client = reqwest::Client::new();

        let health: Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "ok");

        let metrics = client.get(format!("{base}/metrics")).send().await.unwrap();
        assert_eq!(metrics.status().as_u16(), 404);
    }
}

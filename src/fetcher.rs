//! Raw page retrieval for the static pass

use crate::{Config, ExtractionError};
use async_trait::async_trait;
use tracing::debug;
use url::Url;

/// Fetches the HTML body of a page with a single GET.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, ExtractionError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, ExtractionError> {
        let mut builder = reqwest::Client::builder().timeout(config.fetch_timeout);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.as_str());
        }

        let client = builder
            .build()
            .map_err(|e| ExtractionError::ConfigurationError(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, ExtractionError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ExtractionError::FetchFailed(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::FetchFailed(format!(
                "{url}: HTTP {}",
                status.as_u16()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::FetchFailed(format!("{url}: {e}")))?;

        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn page_url(server: &MockServer, route: &str) -> Url {
        Url::parse(&format!("{}{}", server.uri(), route)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/gallery"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<img src=\"/a.png\">"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&Config::default()).unwrap();
        let body = tokio_test::assert_ok!(fetcher.fetch(&page_url(&server, "/gallery")).await);
        assert_eq!(body, "<img src=\"/a.png\">");
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(&Config::default()).unwrap();
        let err = fetcher
            .fetch(&page_url(&server, "/missing"))
            .await
            .unwrap_err();

        match err {
            ExtractionError::FetchFailed(message) => assert!(message.contains("404")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_sends_configured_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(wiremock::matchers::header("user-agent", "image-extractor/test"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config {
            user_agent: Some("image-extractor/test".to_string()),
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert_eq!(fetcher.fetch(&page_url(&server, "/")).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_fetch_connection_error() {
        let fetcher = HttpFetcher::new(&Config::default()).unwrap();
        let url = Url::parse("http://127.0.0.1:1/unreachable").unwrap();
        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(ExtractionError::FetchFailed(_))
        ));
    }
}

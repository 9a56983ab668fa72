use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error};

use crate::model::Cursor;

pub const PRACTICUM_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking API returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("failed to reach tracking API: {0}")]
    Network(#[source] reqwest::Error),
    #[error("tracking API response is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("failed to build tracking API request: {0}")]
    Request(String),
}

/// Outcome of one fetch.
pub type PollResult = std::result::Result<Value, TrackingError>;

#[async_trait]
pub trait TrackingApi: Send + Sync {
    async fn fetch(&self, cursor: Cursor) -> PollResult;
}

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    pub fn new(token: String, endpoint: Url, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .user_agent("homework-watchbot/0.1")
            .timeout(timeout)
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn build_request(&self, cursor: Cursor) -> reqwest::Result<reqwest::Request> {
        self.http
            .get(self.endpoint.clone())
            .header("Authorization", format!("OAuth {}", self.token))
            .query(&[("from_date", cursor.as_secs())])
            .build()
    }
}

#[async_trait]
impl TrackingApi for PracticumClient {
    async fn fetch(&self, cursor: Cursor) -> PollResult {
        let request = self
            .build_request(cursor)
            .map_err(|err| TrackingError::Request(err.to_string()))?;
        debug!(url = %request.url(), "polling tracking API");

        let res = self.http.execute(request).await.map_err(|err| {
            error!(?err, "tracking API request failed");
            TrackingError::Network(err)
        })?;

        let status = res.status();
        if status != StatusCode::OK {
            let body = res.text().await.unwrap_or_default();
            error!(%status, body = %body, "tracking API returned an error status");
            return Err(TrackingError::Http { status, body });
        }

        res.json::<Value>().await.map_err(|err| {
            error!(?err, "tracking API returned malformed JSON");
            TrackingError::Decode(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PracticumClient {
        PracticumClient::new(
            "secret".into(),
            Url::parse(PRACTICUM_ENDPOINT).unwrap(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn build_request_sets_oauth_header_and_cursor() {
        let request = client().build_request(Cursor(1_700_000_000)).unwrap();
        assert_eq!(request.method(), reqwest::Method::GET);
        assert_eq!(request.url().path(), "/api/user_api/homework_statuses/");
        assert_eq!(request.url().query(), Some("from_date=1700000000"));
        assert_eq!(
            request
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .unwrap(),
            "OAuth secret"
        );
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", client());
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("practicum.yandex.ru"));
    }

    #[test]
    fn http_error_mentions_status_and_body() {
        let err = TrackingError::Http {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "maintenance".into(),
        };
        let text = err.to_string();
        assert!(text.contains("503"));
        assert!(text.contains("maintenance"));
    }
}

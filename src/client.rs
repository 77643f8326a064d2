use crate::config::Config;
use crate::controller::AnswerResult;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::Serialize;
use tokio::time::Duration;

/// Header carrying the session token in both directions
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Why a question did not produce an answer
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("answering service returned {0}")]
    Status(StatusCode),
    #[error("malformed answer body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// A successful answer plus the session token the service attached, if any
#[derive(Debug, Clone, PartialEq)]
pub struct QueryReply {
    pub answer: AnswerResult,
    pub session_id: Option<String>,
}

/// Anything that can answer a question
#[async_trait]
pub trait AnswerService: Send + Sync {
    async fn query(
        &self,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<QueryReply, AnswerError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    question: &'a str,
}

/// HTTP client for the remote answering service
#[derive(Clone)]
pub struct HttpAnswerClient {
    client: reqwest::Client,
    query_url: String,
}

impl HttpAnswerClient {
    pub fn new(config: &Config) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build().context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            query_url: config.query_url(),
        })
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }
}

#[async_trait]
impl AnswerService for HttpAnswerClient {
    async fn query(
        &self,
        question: &str,
        session_id: Option<&str>,
    ) -> Result<QueryReply, AnswerError> {
        tracing::debug!(
            url = %self.query_url,
            has_session = session_id.is_some(),
            "posting question"
        );

        let mut request = self.client.post(&self.query_url).json(&QueryRequest { question });
        if let Some(session_id) = session_id {
            request = request.header(SESSION_HEADER, session_id);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnswerError::Status(status));
        }

        let session_id = session_id_from_headers(response.headers());
        let body = response.bytes().await?;
        let answer: AnswerResult = serde_json::from_slice(&body)?;

        tracing::debug!(citations = answer.citations.len(), "answer received");

        Ok(QueryReply { answer, session_id })
    }
}

/// Session token from response headers. Header names compare case-insensitively.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    fn headers_with(name: &str, value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
        headers
    }

    #[test]
    fn reads_session_header_in_any_case() {
        for name in ["X-Session-Id", "x-session-id", "X-SESSION-ID"] {
            assert_eq!(
                session_id_from_headers(&headers_with(name, "tok-1")).as_deref(),
                Some("tok-1"),
                "header {name} should be recognised",
            );
        }
    }

    #[test]
    fn blank_session_header_is_ignored() {
        assert_eq!(session_id_from_headers(&headers_with("x-session-id", "  ")), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn client_posts_to_query_path() {
        let config = Config {
            endpoint: "http://127.0.0.1:9/".to_string(),
            ..Config::default()
        };
        let client = HttpAnswerClient::new(&config).unwrap();
        assert_eq!(client.query_url(), "http://127.0.0.1:9/query");
    }
}

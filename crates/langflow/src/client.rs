use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::api::RunRequest;

/// Header carrying the deployment API key on every upstream call.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Failures talking to a Langflow run endpoint.
///
/// Nothing here is retried: every failure is classified and handed back to
/// the caller as-is.
#[derive(Debug, thiserror::Error)]
pub enum LangflowError {
    #[error("upstream url must not be empty")]
    EmptyUrl,
    #[error("api key must not be empty")]
    MissingApiKey,
    #[error("upstream returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("request to upstream failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream returned invalid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),
}

/// Client for Langflow run endpoints.
///
/// Holds one `reqwest::Client` so the underlying connection pool is shared
/// across every flow URL and every concurrent call; each `run` is an
/// independent one-shot request with its own deadline.
pub struct LangflowClient {
    http: reqwest::Client,
    api_key: String,
}

impl LangflowClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LangflowError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LangflowError::MissingApiKey);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
        })
    }

    /// Execute one run against the flow at `url`.
    ///
    /// Sends the JSON-encoded envelope with the API key header and waits at
    /// most `timeout`. A 4xx/5xx status becomes `HttpStatus` with the body
    /// text attached; connection, DNS, and deadline failures become
    /// `Transport`; a 2xx body that is not JSON becomes `InvalidJson`.
    pub async fn run(
        &self,
        url: &str,
        request: &RunRequest,
        timeout: Duration,
    ) -> Result<Value, LangflowError> {
        if url.is_empty() {
            return Err(LangflowError::EmptyUrl);
        }
        let url = url.trim_end_matches('/');

        debug!(
            "sending run request to {} (session: {})",
            url, request.session_id
        );

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .timeout(timeout)
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(LangflowError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(LangflowError::InvalidJson)
    }
}

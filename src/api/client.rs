//! Typed HTTP client for the documentation Q&A backend.
//!
//! Every operation maps the transport outcome into exactly one [`ApiError`]
//! variant; callers never see a raw `reqwest::Error`. The client performs no
//! retries; retry policy, if any, belongs to the caller.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::api::{
    AskRequest, AskResponse, ChatTurn, HealthResponse, KbEntry, KbEntryPatch, NewKbEntry,
    ServiceInfo,
};
use crate::utils::url::{endpoint_url, normalize_base_url};

const CONNECT_TIMEOUT_SECONDS: u64 = 10;

/// Health probes answer fast or not at all, so they get a shorter budget
/// than regular requests.
const HEALTH_TIMEOUT_SECONDS: u64 = 5;

/// Classified failure of an API operation.
#[derive(Debug)]
pub enum ApiError {
    /// Connection, DNS, or timeout failure before a response arrived.
    Unreachable(String),

    /// The backend rejected the request (4xx). Carries the decoded server
    /// message when the body had one.
    ClientError { status: u16, message: String },

    /// The backend failed (5xx).
    ServerError { status: u16 },

    /// Local pre-flight validation failed; no network call was made.
    InvalidInput(String),

    /// The response body could not be parsed as the expected shape.
    Decode(String),
}

impl ApiError {
    /// Short stable label for the variant, used when a failure is rendered
    /// into a conversation turn.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Unreachable(_) => "unreachable",
            ApiError::ClientError { .. } => "client_error",
            ApiError::ServerError { .. } => "server_error",
            ApiError::InvalidInput(_) => "invalid_input",
            ApiError::Decode(_) => "decode",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unreachable(message) => {
                write!(f, "Cannot reach the API ({message}). Is the backend running?")
            }
            ApiError::ClientError { status, message } => {
                write!(f, "API rejected the request ({status}): {message}")
            }
            ApiError::ServerError { status } => {
                write!(f, "API error: {status}")
            }
            ApiError::InvalidInput(message) => write!(f, "{message}"),
            ApiError::Decode(message) => {
                write!(f, "Unexpected response from the API: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Reject empty and over-length questions before any network I/O.
pub fn validate_question(question: &str, max_len: usize) -> Result<(), ApiError> {
    if question.trim().is_empty() {
        return Err(ApiError::InvalidInput("Question is empty.".to_string()));
    }
    if question.chars().count() > max_len {
        return Err(ApiError::InvalidInput(format!(
            "Question is too long (max {max_len} characters). Please shorten it."
        )));
    }
    Ok(())
}

fn classify_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Unreachable("request timed out".to_string())
    } else if err.is_connect() {
        ApiError::Unreachable(format!("connection failed: {err}"))
    } else {
        ApiError::Unreachable(err.to_string())
    }
}

/// Pull a human-readable message out of a 4xx body. The backend sends
/// `{"detail": "..."}`; anything else falls back to the raw body.
fn decode_client_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["detail", "message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.chars().take(200).collect()
    }
}

/// The `ask` operation behind a seam, so the session controller can run
/// against a test double.
#[async_trait::async_trait]
pub trait AskBackend: Send + Sync {
    async fn ask(
        &self,
        question: &str,
        context: Option<&[ChatTurn]>,
        show_pipeline: bool,
    ) -> Result<AskResponse, ApiError>;
}

/// Stateless request/response mapping to the backend's HTTP surface.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    max_question_len: usize,
}

impl ApiClient {
    pub fn new(base_url: &str, request_timeout: Duration, max_question_len: usize) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECONDS))
            .timeout(request_timeout)
            .build()
            .map_err(|err| ApiError::Unreachable(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: normalize_base_url(base_url),
            max_question_len,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        endpoint_url(&self.base_url, endpoint)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let body = self.execute_raw(request).await?;
        serde_json::from_str(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn execute_raw(&self, request: reqwest::RequestBuilder) -> Result<String, ApiError> {
        let response = request.send().await.map_err(classify_transport)?;
        let status = response.status();
        if status.is_client_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::ClientError {
                status: status.as_u16(),
                message: decode_client_message(&body, status.as_u16()),
            });
        }
        if status.is_server_error() {
            return Err(ApiError::ServerError {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(ApiError::Decode(format!("unexpected status {status}")));
        }
        response.text().await.map_err(classify_transport)
    }

    /// `GET /health`
    pub async fn check_health(&self) -> Result<HealthResponse, ApiError> {
        let url = self.url("health");
        debug!(url = %url, "health check");
        let request = self
            .http
            .get(url)
            .timeout(Duration::from_secs(HEALTH_TIMEOUT_SECONDS));
        self.execute(request).await
    }

    /// `GET /api/v1/kb/services`
    pub async fn list_services(&self) -> Result<Vec<ServiceInfo>, ApiError> {
        let url = self.url("api/v1/kb/services");
        debug!(url = %url, "fetching service list");
        self.execute(self.http.get(url)).await
    }

    /// `POST /api/v1/ask`
    pub async fn ask(
        &self,
        question: &str,
        context: Option<&[ChatTurn]>,
        show_pipeline: bool,
    ) -> Result<AskResponse, ApiError> {
        validate_question(question, self.max_question_len)?;
        let url = self.url("api/v1/ask");
        debug!(url = %url, question_len = question.len(), "sending question");
        let payload = AskRequest {
            question: question.to_string(),
            show_pipeline,
            context: context.map(<[ChatTurn]>::to_vec),
        };
        self.execute(self.http.post(url).json(&payload)).await
    }

    /// `GET /api/v1/kb/entries`, optionally filtered by service.
    pub async fn list_kb_entries(&self, service: Option<&str>) -> Result<Vec<KbEntry>, ApiError> {
        let url = self.url("api/v1/kb/entries");
        let mut request = self.http.get(url);
        if let Some(service) = service {
            request = request.query(&[("service", service)]);
        }
        self.execute(request).await
    }

    /// `POST /api/v1/kb/entries`
    pub async fn create_kb_entry(&self, entry: &NewKbEntry) -> Result<KbEntry, ApiError> {
        self.post_json("api/v1/kb/entries", entry).await
    }

    /// `PUT /api/v1/kb/entries/{id}`
    pub async fn update_kb_entry(&self, id: &str, patch: &KbEntryPatch) -> Result<KbEntry, ApiError> {
        let url = self.url(&format!("api/v1/kb/entries/{id}"));
        self.execute(self.http.put(url).json(patch)).await
    }

    /// `DELETE /api/v1/kb/entries/{id}`
    pub async fn delete_kb_entry(&self, id: &str) -> Result<(), ApiError> {
        let url = self.url(&format!("api/v1/kb/entries/{id}"));
        self.execute_raw(self.http.delete(url)).await?;
        Ok(())
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        self.execute(self.http.post(url).json(body)).await
    }
}

#[async_trait::async_trait]
impl AskBackend for ApiClient {
    async fn ask(
        &self,
        question: &str,
        context: Option<&[ChatTurn]>,
        show_pipeline: bool,
    ) -> Result<AskResponse, ApiError> {
        ApiClient::ask(self, question, context, show_pipeline).await
    }
}

use serde::{Deserialize, Serialize};

/// One prior conversation turn sent as context with an ask request.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Serialize)]
pub struct AskRequest {
    pub question: String,
    pub show_pipeline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Vec<ChatTurn>>,
}

/// A sensitive span the backend (or the client-side detector) found in an
/// answer. `span` is a `[start, end)` byte range over the raw answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub entity_type: String,
    pub original_value: String,
    pub span: [usize; 2],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocLink {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub description: String,
}

fn default_in_scope() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub confidence: f64,
    /// False when the backend judged the question outside its corpus.
    #[serde(default = "default_in_scope")]
    pub in_scope: bool,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub links: Vec<DocLink>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Orchestration step labels, present when the request asked for them.
    #[serde(default)]
    pub pipeline: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceInfo {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub doc_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KbEntry {
    pub id: String,
    pub service_key: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewKbEntry {
    pub service_key: String,
    pub title: String,
    pub url: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Partial update for a knowledge-base entry; only set fields are sent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct KbEntryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl KbEntryPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.url.is_none()
            && self.description.is_none()
            && self.tags.is_none()
    }
}

pub mod client;

pub use client::{ApiClient, ApiError, AskBackend};

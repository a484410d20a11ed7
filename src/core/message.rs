use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::DocLink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }

    pub fn is_user(self) -> bool {
        self == MessageRole::User
    }

    pub fn is_assistant(self) -> bool {
        self == MessageRole::Assistant
    }
}

impl AsRef<str> for MessageRole {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl TryFrom<&str> for MessageRole {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(MessageRole::User),
            "assistant" => Ok(MessageRole::Assistant),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for MessageRole {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<MessageRole> for String {
    fn from(value: MessageRole) -> Self {
        value.as_str().to_string()
    }
}

/// Answer details attached to an assistant turn. User turns carry no
/// metadata; failed exchanges carry only `error_kind`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageMeta {
    pub confidence: Option<f64>,
    /// Whether the backend judged the question to be inside its
    /// documentation corpus.
    pub in_scope: Option<bool>,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub links: Vec<DocLink>,
    #[serde(default)]
    pub pipeline: Vec<String>,
    /// Failure classification label when this turn reports an API error
    /// instead of an answer.
    pub error_kind: Option<String>,
}

impl MessageMeta {
    pub fn is_error(&self) -> bool {
        self.error_kind.is_some()
    }
}

/// One turn in a conversation. Turns are append-only: once a message is in
/// a conversation it is never edited or reordered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    /// Raw text for user turns; rendered (entity-masked) markup for
    /// assistant turns.
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
}

impl Message {
    pub fn new(role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            created_at: Utc::now(),
            meta: None,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(MessageRole::User, text)
    }

    pub fn assistant(text: impl Into<String>, meta: MessageMeta) -> Self {
        Self {
            meta: Some(meta),
            ..Self::new(MessageRole::Assistant, text)
        }
    }

    /// Assistant-style turn reporting a failed exchange, so the question
    /// stays visible in the thread next to what went wrong.
    pub fn assistant_failure(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self::assistant(
            text,
            MessageMeta {
                error_kind: Some(kind.into()),
                ..MessageMeta::default()
            },
        )
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }

    pub fn is_failure(&self) -> bool {
        self.meta.as_ref().is_some_and(MessageMeta::is_error)
    }
}

//! Session controller: orchestrates conversations against the backend.
//!
//! A [`ChatSession`] is an explicitly owned value with no ambient globals,
//! so several sessions can coexist in one process. Each user action runs
//! to completion before the next is accepted; the backend call is the only
//! suspension point.

use std::fmt;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::api::client::validate_question;
use crate::api::{AskBackend, AskResponse, ChatTurn};
use crate::core::config::Config;
use crate::core::conversation::{
    Conversation, ConversationId, ConversationStore, ConversationSummary, StoreError,
};
use crate::core::message::{Message, MessageMeta};
use crate::masking::{self, MaskingPolicy};

/// Where the session currently stands in the conversation lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoActiveConversation,
    ActiveEmpty,
    ActiveWithHistory,
}

/// A submission the controller refused before touching the network.
#[derive(Debug)]
pub enum SubmitError {
    NoActiveConversation,
    InvalidQuestion(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::NoActiveConversation => {
                write!(f, "no active conversation; start a new chat first")
            }
            SubmitError::InvalidQuestion(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for SubmitError {}

pub struct ChatSession {
    store: ConversationStore,
    backend: Arc<dyn AskBackend>,
    policy: MaskingPolicy,
    show_pipeline: bool,
    max_question_length: usize,
    suggested_questions: Vec<String>,
    banner: Option<String>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn AskBackend>, config: &Config) -> Self {
        Self {
            store: ConversationStore::new(),
            backend,
            policy: config.masking_policy(),
            show_pipeline: config.show_pipeline(),
            max_question_length: config.max_question_length(),
            suggested_questions: config.suggested_questions(),
            banner: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match self.store.active() {
            None => SessionState::NoActiveConversation,
            Some(conversation) if conversation.is_empty() => SessionState::ActiveEmpty,
            Some(_) => SessionState::ActiveWithHistory,
        }
    }

    /// Conversations in creation order, for a picker.
    pub fn conversations(&self) -> Vec<ConversationSummary> {
        self.store.list()
    }

    pub fn active_id(&self) -> Option<ConversationId> {
        self.store.active_id()
    }

    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.store.active()
    }

    /// The active conversation's messages, already masked. Empty when no
    /// conversation is active.
    pub fn active_messages(&self) -> &[Message] {
        self.store
            .active()
            .map(Conversation::messages)
            .unwrap_or_default()
    }

    /// Starter questions offered while the active conversation is empty.
    pub fn suggested_questions(&self) -> &[String] {
        &self.suggested_questions
    }

    /// Pending error banner, if the last action left one.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    pub fn take_banner(&mut self) -> Option<String> {
        self.banner.take()
    }

    /// Start a fresh conversation and make it active. An active empty draft
    /// is reused rather than stacked, so at most one draft exists and it is
    /// always the active conversation.
    pub fn new_chat(&mut self) -> ConversationId {
        self.banner = None;
        if let Some(active) = self.store.active() {
            if active.is_empty() {
                return active.id();
            }
        }
        self.store.create()
    }

    pub fn switch_chat(&mut self, id: ConversationId) -> Result<SessionState, StoreError> {
        let previous = self.store.active_id();
        self.store.switch_active(id)?;
        self.banner = None;
        if let Some(previous) = previous.filter(|previous| *previous != id) {
            self.drop_abandoned_draft(previous);
        }
        Ok(self.state())
    }

    pub fn delete_chat(&mut self, id: ConversationId) -> Result<SessionState, StoreError> {
        self.store.delete(id)?;
        self.banner = None;
        Ok(self.state())
    }

    fn drop_abandoned_draft(&mut self, id: ConversationId) {
        if self.store.get(id).is_some_and(Conversation::is_empty) {
            let _ = self.store.delete(id);
        }
    }

    /// Send a question in the active conversation and append the exchange.
    ///
    /// Local validation failures are returned without touching the store or
    /// the network. Backend failures are converted into a visible
    /// assistant-style turn so the question is never silently dropped, and
    /// the session stays usable either way.
    pub async fn submit_question(&mut self, text: &str) -> Result<SessionState, SubmitError> {
        self.submit_question_with_cancel(text, CancellationToken::new())
            .await
    }

    /// Like [`submit_question`](Self::submit_question), racing the backend
    /// call against `cancel`. A cancelled exchange keeps the user's question
    /// with no reply; a response that arrives after the conversation moved
    /// on (newer question, deletion) is discarded.
    pub async fn submit_question_with_cancel(
        &mut self,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<SessionState, SubmitError> {
        let (conversation_id, context) = match self.store.active() {
            Some(conversation) => (conversation.id(), context_turns(conversation)),
            None => return Err(SubmitError::NoActiveConversation),
        };
        if let Err(err) = validate_question(text, self.max_question_length) {
            return Err(SubmitError::InvalidQuestion(err.to_string()));
        }

        self.banner = None;
        if let Err(err) = self.store.append(conversation_id, Message::user(text)) {
            // Ids are controller-internal; reaching this is an invariant
            // violation, surfaced instead of crashing the session.
            self.banner = Some(err.to_string());
            return Ok(self.state());
        }
        let seq = self
            .store
            .get(conversation_id)
            .map(Conversation::exchange_seq)
            .unwrap_or(0);

        let backend = Arc::clone(&self.backend);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(conversation = %conversation_id, "ask cancelled; question left without a reply");
                return Ok(self.state());
            }
            response = backend.ask(text, Some(&context), self.show_pipeline) => response,
        };

        let still_current = self
            .store
            .get(conversation_id)
            .is_some_and(|conversation| conversation.exchange_seq() == seq);
        if !still_current {
            debug!(conversation = %conversation_id, "discarding stale response");
            return Ok(self.state());
        }

        let message = match response {
            Ok(response) => self.render_answer(response),
            Err(err) => {
                let rendered = err.to_string();
                self.banner = Some(rendered.clone());
                Message::assistant_failure(err.kind(), rendered)
            }
        };
        if let Err(err) = self.store.append(conversation_id, message) {
            self.banner = Some(err.to_string());
        }
        Ok(self.state())
    }

    fn render_answer(&self, response: AskResponse) -> Message {
        let detected = masking::detect_client_entities(&response.answer);
        let entities = masking::merge_entities(&response.entities, detected);
        let text = masking::mask_entities(&response.answer, &entities, &self.policy);
        Message::assistant(
            text,
            MessageMeta {
                confidence: Some(response.confidence),
                in_scope: Some(response.in_scope),
                services: response.services,
                links: response.links,
                pipeline: response.pipeline.unwrap_or_default(),
                error_kind: None,
            },
        )
    }
}

/// Prior turns of a conversation as ask-request context. Failure turns are
/// not part of the dialogue and are excluded.
fn context_turns(conversation: &Conversation) -> Vec<ChatTurn> {
    conversation
        .messages()
        .iter()
        .filter(|message| !message.is_failure())
        .map(|message| ChatTurn {
            role: message.role.as_str().to_string(),
            content: message.text.clone(),
        })
        .collect()
}

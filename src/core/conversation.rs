//! In-memory conversation threads and the active-thread pointer.
//!
//! Conversations live exactly as long as the session that owns them; there
//! is no persistence and no sharing between sessions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::core::message::Message;

/// Derived titles keep the first user message up to this many characters.
const TITLE_MAX_CHARS: usize = 48;

/// Store-generated conversation identifier. Ids are monotonic within a
/// store and never reused, even after deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConversationId(u64);

impl ConversationId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug)]
pub enum StoreError {
    /// The referenced conversation does not exist (or no longer exists).
    NotFound(ConversationId),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound(id) => write!(f, "conversation {id} not found"),
        }
    }
}

impl std::error::Error for StoreError {}

/// One question/answer thread.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: ConversationId,
    created_at: DateTime<Utc>,
    title: Option<String>,
    messages: Vec<Message>,
    exchange_seq: u64,
}

impl Conversation {
    fn new(id: ConversationId) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            title: None,
            messages: Vec::new(),
            exchange_seq: 0,
        }
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Derived from the first user message; `None` while drafting.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn last_message_at(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(|message| message.created_at)
    }

    /// Bumped on every user append; an in-flight answer whose captured
    /// sequence no longer matches is stale and must be discarded.
    pub fn exchange_seq(&self) -> u64 {
        self.exchange_seq
    }

    fn push(&mut self, message: Message) {
        if message.is_user() {
            self.exchange_seq += 1;
            if self.title.is_none() {
                self.title = Some(derive_title(&message.text));
            }
        }
        self.messages.push(message);
    }
}

fn derive_title(text: &str) -> String {
    let text = text.trim();
    let mut title: String = text.chars().take(TITLE_MAX_CHARS).collect();
    if title.len() < text.len() {
        title.push('…');
    }
    title
}

/// Listing row for a conversation picker. Presentation order (for example
/// most-recent-first) is the caller's concern; the store lists in creation
/// order.
#[derive(Debug, Clone)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// All conversations of one session plus the active-thread pointer.
///
/// Invariant: `active` is either unset or references an existing
/// conversation; never a dangling id.
#[derive(Debug, Default)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    next_id: u64,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty conversation, make it active, and return its id.
    pub fn create(&mut self) -> ConversationId {
        self.next_id += 1;
        let id = ConversationId(self.next_id);
        self.conversations.push(Conversation::new(id));
        self.active = Some(id);
        id
    }

    pub fn append(&mut self, id: ConversationId, message: Message) -> Result<(), StoreError> {
        let conversation = self
            .conversations
            .iter_mut()
            .find(|conversation| conversation.id == id)
            .ok_or(StoreError::NotFound(id))?;
        conversation.push(message);
        Ok(())
    }

    /// Conversations in creation order.
    pub fn list(&self) -> Vec<ConversationSummary> {
        self.conversations
            .iter()
            .map(|conversation| ConversationSummary {
                id: conversation.id,
                title: conversation.title.clone(),
                created_at: conversation.created_at,
                last_message_at: conversation.last_message_at(),
            })
            .collect()
    }

    pub fn switch_active(&mut self, id: ConversationId) -> Result<(), StoreError> {
        if self.get(id).is_none() {
            return Err(StoreError::NotFound(id));
        }
        self.active = Some(id);
        Ok(())
    }

    /// Remove a conversation. If it was active, the most recently created
    /// remaining conversation becomes active, or the pointer is unset when
    /// none remain.
    pub fn delete(&mut self, id: ConversationId) -> Result<(), StoreError> {
        let index = self
            .conversations
            .iter()
            .position(|conversation| conversation.id == id)
            .ok_or(StoreError::NotFound(id))?;
        self.conversations.remove(index);
        if self.active == Some(id) {
            self.active = self.conversations.last().map(Conversation::id);
        }
        Ok(())
    }

    pub fn active_id(&self) -> Option<ConversationId> {
        self.active
    }

    pub fn get(&self, id: ConversationId) -> Option<&Conversation> {
        self.conversations
            .iter()
            .find(|conversation| conversation.id == id)
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_activates_and_generates_unique_ids() {
        let mut store = ConversationStore::new();
        let first = store.create();
        let second = store.create();
        assert_ne!(first, second);
        assert_eq!(store.active_id(), Some(second));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn append_preserves_insertion_order() {
        let mut store = ConversationStore::new();
        let id = store.create();
        for text in ["first", "second", "third"] {
            store.append(id, Message::user(text)).expect("append ok");
        }
        let texts: Vec<&str> = store
            .get(id)
            .expect("conversation exists")
            .messages()
            .iter()
            .map(|message| message.text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn append_to_unknown_id_is_not_found() {
        let mut store = ConversationStore::new();
        let id = store.create();
        store.delete(id).expect("delete ok");
        assert!(matches!(
            store.append(id, Message::user("late")),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn title_comes_from_first_user_message_only() {
        let mut store = ConversationStore::new();
        let id = store.create();
        assert_eq!(store.get(id).unwrap().title(), None);
        store
            .append(id, Message::user("How do I deploy a model?"))
            .expect("append ok");
        store
            .append(id, Message::user("And how do I undeploy it?"))
            .expect("append ok");
        assert_eq!(
            store.get(id).unwrap().title(),
            Some("How do I deploy a model?")
        );
    }

    #[test]
    fn long_titles_are_truncated_on_char_boundaries() {
        let mut store = ConversationStore::new();
        let id = store.create();
        let question = "é".repeat(80);
        store
            .append(id, Message::user(question.as_str()))
            .expect("append ok");
        let title = store.get(id).unwrap().title().unwrap().to_string();
        assert!(title.ends_with('…'));
        assert_eq!(title.chars().count(), 49);
    }

    #[test]
    fn switch_active_rejects_unknown_ids() {
        let mut store = ConversationStore::new();
        let id = store.create();
        store.delete(id).expect("delete ok");
        assert!(matches!(
            store.switch_active(id),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.active_id(), None);
    }

    #[test]
    fn deleting_active_reassigns_to_most_recently_created() {
        let mut store = ConversationStore::new();
        let first = store.create();
        let second = store.create();
        let third = store.create();
        store.switch_active(second).expect("switch ok");
        store.delete(second).expect("delete ok");
        assert_eq!(store.active_id(), Some(third));
        store.delete(third).expect("delete ok");
        assert_eq!(store.active_id(), Some(first));
    }

    #[test]
    fn deleting_last_conversation_unsets_active() {
        let mut store = ConversationStore::new();
        let id = store.create();
        store.delete(id).expect("delete ok");
        assert_eq!(store.active_id(), None);
        assert!(store.is_empty());
    }

    #[test]
    fn deleting_inactive_conversation_keeps_active_pointer() {
        let mut store = ConversationStore::new();
        let first = store.create();
        let second = store.create();
        store.delete(first).expect("delete ok");
        assert_eq!(store.active_id(), Some(second));
    }

    #[test]
    fn ids_are_never_reused_after_deletion() {
        let mut store = ConversationStore::new();
        let first = store.create();
        store.delete(first).expect("delete ok");
        let second = store.create();
        assert_ne!(first, second);
    }

    #[test]
    fn list_reflects_creation_order_and_last_activity() {
        let mut store = ConversationStore::new();
        let first = store.create();
        let second = store.create();
        store.append(second, Message::user("hello")).expect("append ok");
        let listed = store.list();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first);
        assert!(listed[0].last_message_at.is_none());
        assert_eq!(listed[1].id, second);
        assert!(listed[1].last_message_at.is_some());
    }

    #[test]
    fn user_appends_bump_the_exchange_sequence() {
        let mut store = ConversationStore::new();
        let id = store.create();
        assert_eq!(store.get(id).unwrap().exchange_seq(), 0);
        store.append(id, Message::user("one")).expect("append ok");
        store
            .append(id, Message::assistant("answer", Default::default()))
            .expect("append ok");
        store.append(id, Message::user("two")).expect("append ok");
        assert_eq!(store.get(id).unwrap().exchange_seq(), 2);
    }
}

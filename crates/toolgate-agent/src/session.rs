use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use toolgate_core::{Message, Role, SessionId, Timestamp};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub message_count: usize,
    pub tool_call_count: usize,
    pub iteration_count: usize,
}

#[derive(Debug, Default)]
struct SessionInner {
    messages: Vec<Message>,
    tool_call_count: usize,
    iteration_count: usize,
}

/// Conversation history shared between clones.
#[derive(Clone, Debug)]
pub struct Session {
    id: SessionId,
    created_at: Timestamp,
    inner: Arc<RwLock<SessionInner>>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(SessionId::new())
    }

    pub fn with_id(id: SessionId) -> Self {
        Self {
            id,
            created_at: Timestamp::now(),
            inner: Arc::new(RwLock::new(SessionInner::default())),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_message(&self, message: Message) {
        self.write().messages.push(message);
    }

    pub fn add_messages(&self, messages: impl IntoIterator<Item = Message>) {
        self.write().messages.extend(messages);
    }

    pub fn messages(&self) -> Vec<Message> {
        self.read().messages.clone()
    }

    pub fn message_count(&self) -> usize {
        self.read().messages.len()
    }

    pub fn last_message(&self) -> Option<Message> {
        self.read().messages.last().cloned()
    }

    /// The newest `n` messages, never starting with an orphaned tool result.
    pub fn last_messages(&self, n: usize) -> Vec<Message> {
        let inner = self.read();
        let mut start = inner.messages.len().saturating_sub(n);
        while inner
            .messages
            .get(start)
            .is_some_and(|m| m.role == Role::Tool)
        {
            start += 1;
        }
        inner.messages[start..].to_vec()
    }

    /// Index of the most recent user message.
    pub fn last_user_index(&self) -> Option<usize> {
        self.read().messages.iter().rposition(|m| m.role == Role::User)
    }

    /// Drops every message after the first `len`.
    pub fn truncate(&self, len: usize) {
        self.write().messages.truncate(len);
    }

    pub fn clear(&self) {
        *self.write() = SessionInner::default();
    }

    pub fn stats(&self) -> SessionStats {
        let inner = self.read();
        SessionStats {
            message_count: inner.messages.len(),
            tool_call_count: inner.tool_call_count,
            iteration_count: inner.iteration_count,
        }
    }

    pub fn increment_tool_calls(&self, count: usize) {
        self.write().tool_call_count += count;
    }

    pub fn increment_iterations(&self) {
        self.write().iteration_count += 1;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

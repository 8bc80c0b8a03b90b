use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::CompletionProvider;
use crate::error::ChatError;
use crate::records::ChatMessage;
use crate::session::Role;
use crate::store::{LocalStorage, keys};

/// Reply appended when the completion call fails.
pub const FALLBACK_REPLY: &str = "I apologize, but I encountered an error. Please try again.";

/// Storage key for a role's chat history.
pub fn chat_history_key(role: Role) -> String {
    format!("{}:{}", keys::CHAT_HISTORY_PREFIX, role.as_str())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatState {
    Idle,
    Sending,
}

/// Clears the in-flight flag when a send finishes or is dropped.
struct SendingGuard<'a>(&'a AtomicBool);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Assistant conversation for one role.
///
/// The full history is persisted after every append. Only one send may be
/// in flight at a time; a second call while one is pending is rejected
/// without touching the provider.
pub struct ChatSession<P> {
    provider: P,
    storage: LocalStorage,
    key: String,
    messages: Mutex<Vec<ChatMessage>>,
    sending: AtomicBool,
}

impl<P: CompletionProvider> ChatSession<P> {
    /// Open the session and load the role's stored history.
    pub fn new(provider: P, storage: LocalStorage, role: Role) -> Self {
        let key = chat_history_key(role);
        let messages = storage.load(&key);
        Self {
            provider,
            storage,
            key,
            messages: Mutex::new(messages),
            sending: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> ChatState {
        if self.sending.load(Ordering::Acquire) {
            ChatState::Sending
        } else {
            ChatState::Idle
        }
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ChatMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, message: ChatMessage) {
        let mut messages = self.lock();
        messages.push(message);
        if let Err(e) = self.storage.save(&self.key, messages.as_slice()) {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist chat history");
        }
    }

    /// Send `text` to the assistant and return the reply that was appended.
    ///
    /// The user message is appended before the provider is called. A failed
    /// completion appends [`FALLBACK_REPLY`] instead of returning an error.
    pub async fn send(&self, text: &str) -> Result<ChatMessage, ChatError> {
        if text.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        if self
            .sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ChatError::SendInFlight);
        }
        let _in_flight = SendingGuard(&self.sending);

        self.append(ChatMessage::user(text));

        let reply = match self.provider.complete(text).await {
            Ok(reply) => ChatMessage::assistant(reply),
            Err(e) => {
                tracing::warn!(error = %e, "Assistant completion failed; using fallback reply");
                ChatMessage::assistant(FALLBACK_REPLY)
            }
        };
        self.append(reply.clone());
        Ok(reply)
    }

    /// Drop the whole history, in memory and in storage.
    pub fn clear_history(&self) {
        let mut messages = self.lock();
        messages.clear();
        if let Err(e) = self.storage.save(&self.key, messages.as_slice()) {
            tracing::warn!(key = %self.key, error = %e, "Failed to persist cleared chat history");
        }
    }
}

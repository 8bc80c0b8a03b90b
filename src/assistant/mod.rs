//! Assistant chat.
//!
//! ```text
//! idle --send--> sending --reply--> idle     (user + assistant appended)
//!                        \--error--> idle    (user + fallback appended)
//! ```

mod chat;
mod provider;

pub use chat::{ChatSession, ChatState, FALLBACK_REPLY, chat_history_key};
pub use provider::{CompletionProvider, HttpCompletionProvider};

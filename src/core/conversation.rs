//! Ordered chat history exchanged with the completion endpoint.

use crate::api::ChatMessage;

pub const ROLE_SYSTEM: &str = "system";
pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";

/// Running conversation, seeded with one system message and retained across
/// turns so every completion call carries the full history.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(system_prompt: &str) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: ROLE_SYSTEM.to_string(),
                content: system_prompt.to_string(),
            }],
        }
    }

    /// History plus a trailing user turn, without committing the turn.
    /// Callers commit with [`push_user`](Self::push_user) only once the
    /// completion call has succeeded, so a failed turn leaves no trace.
    pub fn with_user_turn(&self, content: &str) -> Vec<ChatMessage> {
        let mut messages = self.messages.clone();
        messages.push(ChatMessage {
            role: ROLE_USER.to_string(),
            content: content.to_string(),
        });
        messages
    }

    pub fn push_user(&mut self, content: &str) {
        self.messages.push(ChatMessage {
            role: ROLE_USER.to_string(),
            content: content.to_string(),
        });
    }

    pub fn push_assistant(&mut self, content: &str) {
        self.messages.push(ChatMessage {
            role: ROLE_ASSISTANT.to_string(),
            content: content.to_string(),
        });
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

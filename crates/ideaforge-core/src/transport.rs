use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// One completion request: messages plus sampling limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    pub messages: Vec<PromptMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Sends a prompt to a language model and returns the completion text.
///
/// Implementations block until the reply arrives or their timeout elapses.
/// Any failure (non-2xx, timeout, malformed or empty body) is reported as
/// [`ForgeError::Transport`](crate::ForgeError::Transport); the orchestrator
/// does not retry.
pub trait ModelTransport {
    fn complete(&self, request: &ModelRequest) -> Result<String>;
}

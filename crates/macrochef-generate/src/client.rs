//! Generation client trait.

use std::fmt;

use async_trait::async_trait;
use macrochef_core::{InstructionMode, Result};
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;

/// Role of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// A single message of a chat-style generation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Lay out prompt and format instructions according to the instruction mode.
///
/// System mode sends the instructions as their own system message; inline mode
/// appends them to the prompt after a single space. Empty instructions are omitted.
pub fn compose_messages(
    prompt: &str,
    format_instructions: &str,
    mode: InstructionMode,
) -> Vec<ChatMessage> {
    if format_instructions.is_empty() {
        return vec![ChatMessage {
            role: Role::User,
            content: prompt.to_string(),
        }];
    }

    match mode {
        InstructionMode::System => vec![
            ChatMessage {
                role: Role::System,
                content: format_instructions.to_string(),
            },
            ChatMessage {
                role: Role::User,
                content: prompt.to_string(),
            },
        ],
        InstructionMode::Inline => vec![ChatMessage {
            role: Role::User,
            content: format!("{} {}", prompt, format_instructions),
        }],
    }
}

/// A remote text-generation service.
///
/// Implementations must be thread-safe; one instance is shared by every worker.
#[async_trait]
pub trait GenerationClient: Send + Sync + fmt::Debug {
    /// Send the prompt and return the raw generated text.
    ///
    /// Fails with `Upstream` on a non-success status and `Timeout` when the
    /// configured deadline elapses.
    async fn generate(
        &self,
        prompt: &str,
        format_instructions: &str,
        config: &ModelConfig,
    ) -> Result<String>;

    /// Provider name, e.g. "openai" or "fake".
    fn provider_name(&self) -> &'static str;
}

//! Model configuration.

use macrochef_core::InstructionMode;
use serde::{Deserialize, Serialize};

/// Configuration passed with every generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model identifier understood by the provider.
    pub model: String,

    /// Maximum number of tokens to generate.
    pub max_output_tokens: u32,

    /// Sampling temperature.
    pub temperature: f32,

    /// Request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Whether format instructions travel as a system message or inline.
    pub instruction_mode: InstructionMode,

    /// Prefix-cut the prompt to this many characters before sending.
    pub max_prompt_chars: Option<usize>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            max_output_tokens: 3000,
            temperature: 0.7,
            timeout_ms: 50_000,
            instruction_mode: InstructionMode::System,
            max_prompt_chars: None,
        }
    }
}

impl ModelConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_instruction_mode(mut self, mode: InstructionMode) -> Self {
        self.instruction_mode = mode;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_prompt_chars(mut self, max: Option<usize>) -> Self {
        self.max_prompt_chars = max;
        self
    }
}

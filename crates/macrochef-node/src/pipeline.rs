//! The per-job pipeline: profile fetch, encode, generate, sanitize.

use std::sync::Arc;

use macrochef_core::{sanitize, strip_echo, ConstraintEncoder, RecipeRequest, Result};
use macrochef_generate::{GenerationClient, ModelConfig};
use macrochef_state::ProfileStore;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything a job needs besides its request. Stateless between jobs.
pub struct Pipeline {
    pub profiles: Arc<dyn ProfileStore>,
    pub generator: Arc<dyn GenerationClient>,
    pub encoder: ConstraintEncoder,
    pub model: ModelConfig,
}

impl Pipeline {
    /// Run the stages in order and return the sanitized payload.
    pub async fn run(&self, op_id: Uuid, request: &RecipeRequest) -> Result<String> {
        let profile = self.profiles.get_profile(&request.user_id).await?;
        debug!("[{}] Profile loaded for user {}", op_id, request.user_id);

        let document = self.encoder.encode(request, &profile);
        let prompt = match self.model.max_prompt_chars {
            Some(max) => document.truncated(max),
            None => document.text(),
        };
        info!(
            "[{}] Prompt encoded ({} chars, format {}, fingerprint {})",
            op_id,
            prompt.chars().count(),
            document.format,
            &document.fingerprint()[..12]
        );

        let raw = self
            .generator
            .generate(&prompt, &document.format_instructions, &self.model)
            .await?;
        debug!(
            "[{}] {} replied with {} chars",
            op_id,
            self.generator.provider_name(),
            raw.len()
        );

        let reply = strip_echo(&raw, &prompt).into_owned();
        let reply = strip_echo(&reply, &document.format_instructions).into_owned();
        sanitize(&reply, document.format)
    }
}

//! Fake generation client for tests and local runs.
//!
//! Replies are matched by checking whether the prompt contains a registered
//! substring, so tests run without network access or API costs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use macrochef_core::{RecipeError, Result};

use crate::client::GenerationClient;
use crate::config::ModelConfig;

/// Canned reply in the batch recipe format.
pub const SAMPLE_RECIPES: &str = r#"Here are your recipes:
[
  {
    "recipeName": "Chicken and Rice Bowl",
    "cookingTime": "25 minutes",
    "caloriesAndMacros": {"calories": "600", "protein": "45g", "carbs": "60g", "fat": "18g"},
    "ingredientsAndQuantities": [
      {"ingredient": "chicken", "quantity": "200g"},
      {"ingredient": "rice", "quantity": "150g"}
    ],
    "cookingProcess": ["Cook the rice", "Grill the chicken", "Serve together"]
  }
]
Enjoy!"#;

/// A fake generation client.
#[derive(Debug)]
pub struct FakeGenerator {
    /// Prompt substring -> reply, checked in insertion order.
    responses: Vec<(String, Result<String>)>,
    /// Reply when nothing matches.
    default_response: Option<String>,
    /// Artificial latency per call.
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            default_response: Some(SAMPLE_RECIPES.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }
}

impl FakeGenerator {
    /// Create a FakeGenerator with no registered responses and no default.
    pub fn new() -> Self {
        Self {
            default_response: None,
            ..Self::default()
        }
    }

    /// Reply with `response` to prompts containing `prompt_contains` (case-insensitive).
    pub fn with_response(mut self, prompt_contains: &str, response: &str) -> Self {
        self.responses
            .push((prompt_contains.to_lowercase(), Ok(response.to_string())));
        self
    }

    /// Fail with `error` for prompts containing `prompt_contains`.
    pub fn with_error(mut self, prompt_contains: &str, error: RecipeError) -> Self {
        self.responses.push((prompt_contains.to_lowercase(), Err(error)));
        self
    }

    /// Set the default reply when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Sleep this long before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of generate calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationClient for FakeGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _format_instructions: &str,
        _config: &ModelConfig,
    ) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let prompt_lower = prompt.to_lowercase();
        for (pattern, response) in &self.responses {
            if prompt_lower.contains(pattern.as_str()) {
                return response.clone();
            }
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(RecipeError::Upstream {
                status: 404,
                message: format!(
                    "FakeGenerator: no response configured for prompt (first 100 chars): {}",
                    prompt.chars().take(100).collect::<String>()
                ),
            }),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let fake = FakeGenerator::new().with_response("THAI", "[\"Pad Thai\"]");
        let reply = fake
            .generate("a focus on thai cuisine", "", &ModelConfig::default())
            .await
            .unwrap();
        assert_eq!(reply, "[\"Pad Thai\"]");
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_no_match_without_default_fails() {
        let fake = FakeGenerator::new();
        let result = fake.generate("anything", "", &ModelConfig::default()).await;
        assert!(matches!(result, Err(RecipeError::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_default_is_sample_recipes() {
        let fake = FakeGenerator::default();
        let reply = fake.generate("anything", "", &ModelConfig::default()).await.unwrap();
        assert_eq!(reply, SAMPLE_RECIPES);
    }

    #[tokio::test]
    async fn test_registered_error() {
        let fake = FakeGenerator::default().with_error(
            "explode",
            RecipeError::Timeout {
                duration_ms: 10,
                message: "slow".to_string(),
            },
        );
        let result = fake.generate("please explode", "", &ModelConfig::default()).await;
        assert!(matches!(result, Err(RecipeError::Timeout { .. })));
    }
}

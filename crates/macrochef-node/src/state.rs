//! Application state.

use std::sync::Arc;

use anyhow::Context;
use macrochef_core::ConstraintEncoder;
use macrochef_generate::{FakeGenerator, GenerationClient, OpenAiClient};
use macrochef_state::{InMemoryProfileStore, InMemoryResultStore, ProfileStore, ResultStore};

use crate::config::{JobSettings, NodeConfig, Provider};
use crate::correlator::JobCorrelator;
use crate::pipeline::Pipeline;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Accepts submissions and runs jobs.
    pub correlator: Arc<JobCorrelator>,

    /// Where job states live until they expire.
    pub results: Arc<dyn ResultStore>,
}

impl AppState {
    /// Wire state from already-built parts. Must be called inside a Tokio runtime.
    pub fn new(pipeline: Pipeline, results: Arc<dyn ResultStore>, settings: JobSettings) -> Self {
        let correlator = JobCorrelator::start(Arc::new(pipeline), results.clone(), settings);
        Self {
            correlator: Arc::new(correlator),
            results,
        }
    }

    /// Build stores, generator and correlator from configuration.
    pub async fn from_config(config: &NodeConfig) -> anyhow::Result<Self> {
        let profiles: Arc<dyn ProfileStore> = match &config.profiles_path {
            Some(path) => Arc::new(
                InMemoryProfileStore::load_file(path)
                    .await
                    .with_context(|| format!("loading profiles from {}", path.display()))?,
            ),
            None => Arc::new(InMemoryProfileStore::new()),
        };

        let generator: Arc<dyn GenerationClient> = match &config.provider {
            Provider::Fake => Arc::new(FakeGenerator::default()),
            Provider::OpenAi { api_key, base_url } => Arc::new(match base_url {
                Some(url) => OpenAiClient::with_base_url(api_key.clone(), url),
                None => OpenAiClient::new(api_key.clone()),
            }),
        };
        tracing::info!(
            "Using {} generator with model {}",
            generator.provider_name(),
            config.model.model
        );

        let pipeline = Pipeline {
            profiles,
            generator,
            encoder: ConstraintEncoder::new(config.output_format),
            model: config.model.clone(),
        };

        Ok(Self::new(
            pipeline,
            Arc::new(InMemoryResultStore::new()),
            config.jobs.clone(),
        ))
    }
}

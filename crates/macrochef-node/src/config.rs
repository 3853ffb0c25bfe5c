//! Node configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use macrochef_core::{InstructionMode, OutputFormat};
use macrochef_generate::ModelConfig;

/// Which generation backend to use.
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    /// Canned replies, no network.
    Fake,
    /// OpenAI-compatible chat completions.
    OpenAi { api_key: String, base_url: Option<String> },
}

/// Settings for the job correlator.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSettings {
    /// Lifetime of a terminal result, counted from completion.
    pub result_ttl: Duration,
    /// Lifetime of a pending marker, counted from submission.
    pub pending_ttl: Duration,
    pub worker_count: usize,
    pub queue_capacity: usize,
}

impl Default for JobSettings {
    fn default() -> Self {
        Self {
            result_ttl: Duration::from_secs(5 * 60),
            pending_ttl: Duration::from_secs(15 * 60),
            worker_count: 4,
            queue_capacity: 256,
        }
    }
}

/// Full node configuration.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub addr: SocketAddr,
    pub provider: Provider,
    pub model: ModelConfig,
    pub output_format: OutputFormat,
    pub jobs: JobSettings,
    pub profiles_path: Option<PathBuf>,
    pub purge_interval: Duration,
}

impl NodeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let provider = match var("GENERATION_PROVIDER").as_deref().unwrap_or("fake") {
            "fake" => Provider::Fake,
            "openai" => Provider::OpenAi {
                api_key: var("OPENAI_API_KEY")
                    .context("OPENAI_API_KEY must be set when GENERATION_PROVIDER=openai")?,
                base_url: var("OPENAI_BASE_URL"),
            },
            other => bail!("Unknown GENERATION_PROVIDER '{}'", other),
        };

        let defaults = ModelConfig::default();
        let model = ModelConfig {
            model: var("OPENAI_MODEL").unwrap_or(defaults.model),
            max_output_tokens: parse_or(&var, "MAX_OUTPUT_TOKENS", defaults.max_output_tokens)?,
            temperature: parse_or(&var, "TEMPERATURE", defaults.temperature)?,
            timeout_ms: parse_or(&var, "GENERATION_TIMEOUT_SECS", defaults.timeout_ms / 1000)? * 1000,
            instruction_mode: parse_or(&var, "INSTRUCTION_MODE", InstructionMode::default())?,
            max_prompt_chars: parse_opt(&var, "MAX_PROMPT_CHARS")?,
        };

        let job_defaults = JobSettings::default();
        let jobs = JobSettings {
            result_ttl: Duration::from_secs(parse_or(
                &var,
                "RESULT_TTL_SECS",
                job_defaults.result_ttl.as_secs(),
            )?),
            pending_ttl: Duration::from_secs(parse_or(
                &var,
                "PENDING_TTL_SECS",
                job_defaults.pending_ttl.as_secs(),
            )?),
            worker_count: parse_or(&var, "WORKER_COUNT", job_defaults.worker_count)?,
            queue_capacity: parse_or(&var, "QUEUE_CAPACITY", job_defaults.queue_capacity)?,
        };
        if jobs.worker_count == 0 {
            bail!("WORKER_COUNT must be at least 1");
        }
        if jobs.queue_capacity == 0 {
            bail!("QUEUE_CAPACITY must be at least 1");
        }
        if jobs.pending_ttl <= Duration::from_millis(model.timeout_ms) {
            bail!(
                "PENDING_TTL_SECS ({}) must exceed GENERATION_TIMEOUT_SECS ({})",
                jobs.pending_ttl.as_secs(),
                model.timeout_ms / 1000
            );
        }

        let purge_interval = Duration::from_secs(parse_or(&var, "PURGE_INTERVAL_SECS", 30u64)?);
        if purge_interval.is_zero() {
            bail!("PURGE_INTERVAL_SECS must be at least 1");
        }

        Ok(Self {
            addr: parse_or(&var, "MACROCHEF_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            provider,
            model,
            output_format: parse_or(&var, "OUTPUT_FORMAT", OutputFormat::default())?,
            jobs,
            profiles_path: var("PROFILES_PATH").map(PathBuf::from),
            purge_interval,
        })
    }
}

fn parse_opt<T>(var: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value '{}' for {}", raw, name)),
        None => Ok(None),
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(var, name)?.unwrap_or(default))
}

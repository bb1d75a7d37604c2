//! Configuration parsing and validation for the story server
//!
//! Every setting can be given as a command-line flag or through the environment. The provider
//! credential has no default: the server refuses to start without one.
use crate::errors::ConfigError;
use crate::provider::ProviderSettings;
use clap::Parser;
use url::Url;

const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The port on which the story server will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// API key for the text-generation provider.
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Model identifier sent with every completion request.
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// Base URL of the OpenAI-compatible API. `chat/completions` is resolved against it.
    #[arg(long, env = "OPENAI_BASE_URL", default_value = "https://api.openai.com/v1/")]
    pub provider_url: Url,

    /// Sampling temperature. Left to the provider's default when unset.
    #[arg(long, env = "STORY_TEMPERATURE")]
    pub temperature: Option<f32>,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, env = "STORY_METRICS", default_value_t = true)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "birth_story")]
    pub metrics_prefix: String,

    /// Maximum number of idle connections kept alive to the provider.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle provider connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

// Hand-written so the credential never reaches the logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_url", &self.provider_url.as_str())
            .field("temperature", &self.temperature)
            .field("metrics", &self.metrics)
            .field("metrics_port", &self.metrics_port)
            .field("metrics_prefix", &self.metrics_prefix)
            .field("pool_max_idle_per_host", &self.pool_max_idle_per_host)
            .field("pool_idle_timeout_secs", &self.pool_idle_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Extracts the provider settings, failing when no usable credential was supplied.
    pub fn provider_settings(&self) -> Result<ProviderSettings, ConfigError> {
        let api_key = self
            .openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential { var: API_KEY_ENV })?;

        Ok(ProviderSettings::builder()
            .api_key(api_key.to_string())
            .model(self.model.clone())
            .base_url(self.provider_url.clone())
            .maybe_temperature(self.temperature)
            .build())
    }
}

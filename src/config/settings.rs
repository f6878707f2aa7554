//! Configuration settings for the Almanac resolution engine.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resolution: ResolutionConfig,
    pub embedding: EmbeddingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::ReadFile)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default locations or use defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            PathBuf::from("config.toml"),
            PathBuf::from("almanac.toml"),
            dirs::config_dir()
                .map(|p| p.join("almanac/config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".almanac/config.toml"))
                .unwrap_or_default(),
        ];

        for path in &config_paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<()> {
        let r = &self.resolution;
        if r.top_k == 0 || r.top_k > r.max_top_k {
            return Err(ConfigError::Invalid(format!(
                "resolution.top_k must be in 1..={}",
                r.max_top_k
            ))
            .into());
        }
        if r.score_epsilon < 0.0 {
            return Err(ConfigError::Invalid("score_epsilon must be >= 0".to_string()).into());
        }
        if r.prefilter_cap == 0 {
            return Err(ConfigError::Invalid("prefilter_cap must be > 0".to_string()).into());
        }

        if self.embedding.enabled {
            if self.embedding.api.base_url.is_empty() {
                return Err(ConfigError::MissingField("embedding.api.base_url".to_string()).into());
            }
            if self.embedding.api.model.is_empty() {
                return Err(ConfigError::MissingField("embedding.api.model".to_string()).into());
            }
        }

        Ok(())
    }
}

/// Tuning knobs for candidate scoring and ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionConfig {
    /// Number of candidates presented to the caller.
    pub top_k: usize,
    /// Hard ceiling for `top_k`.
    pub max_top_k: usize,
    /// Candidates scoring at or below this are not presented.
    pub score_epsilon: f64,
    /// Pool cap applied by the semantic prefilter.
    pub prefilter_cap: usize,
    /// Half-width in days of the fallback retrieval window.
    pub fallback_days: i64,
    /// Bonus when every title hint matches title or notes.
    pub title_hint_bonus: f64,
    /// Per-token bonus for a title match.
    pub title_token_weight: f64,
    /// Per-token bonus for a notes match.
    pub notes_token_weight: f64,
    /// Cap on the attendee-overlap bonus.
    pub attendee_cap: f64,
    /// Bonus for a location-hint match.
    pub location_bonus: f64,
    /// Base of the time-proximity bonus.
    pub time_decay_base: f64,
    /// Hours of distance that cancel one point of proximity bonus.
    pub time_decay_rate: f64,
    /// Bonus for an all-day entry when the phrase says "all day".
    pub all_day_bonus: f64,
    /// Penalty for a timed entry when the phrase says "all day".
    pub all_day_penalty: f64,
    /// Semantic weight when the utterance has no explicit time hint.
    pub semantic_weight_no_time: f64,
    /// Semantic weight when the default fallback window was used.
    pub semantic_weight_fallback: f64,
    /// Semantic weight otherwise.
    pub semantic_weight_timed: f64,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            max_top_k: 6,
            score_epsilon: 0.05,
            prefilter_cap: 40,
            fallback_days: 3,
            title_hint_bonus: 2.0,
            title_token_weight: 0.8,
            notes_token_weight: 0.4,
            attendee_cap: 2.0,
            location_bonus: 0.6,
            time_decay_base: 3.0,
            time_decay_rate: 2.0,
            all_day_bonus: 0.5,
            all_day_penalty: 0.2,
            semantic_weight_no_time: 20.0,
            semantic_weight_fallback: 6.0,
            semantic_weight_timed: 10.0,
        }
    }
}

/// Embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Whether semantic scoring is enabled at all.
    pub enabled: bool,
    /// API provider configuration.
    pub api: ApiEmbeddingConfig,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api: ApiEmbeddingConfig::default(),
        }
    }
}

/// OpenAI-compatible API embedding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiEmbeddingConfig {
    /// Base URL of the embeddings endpoint.
    pub base_url: String,
    /// Model name.
    pub model: String,
    /// API key; falls back to the OPENAI_API_KEY environment variable.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum texts per request.
    pub batch_size: usize,
    /// Embedding dimension.
    pub dimension: usize,
}

impl Default for ApiEmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            timeout_secs: 30,
            batch_size: 100,
            dimension: 1536,
        }
    }
}

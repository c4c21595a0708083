//! Configuration management for the tutor CLI.
//!
//! Configuration is merged from three sources, lowest precedence first:
//! built-in defaults, an optional YAML config file, environment variables,
//! and finally command-line flags.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Known generation providers.
pub const KNOWN_PROVIDERS: &[&str] = &["gemini"];

/// Known embedding providers.
pub const KNOWN_EMBEDDING_PROVIDERS: &[&str] = &["gemini", "trigram"];

/// Retry policy knobs for the resilient generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff delay in seconds
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Maximum backoff delay in seconds
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_initial_delay_secs() -> u64 {
    1
}

fn default_max_delay_secs() -> u64 {
    60
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_secs: default_initial_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the corpus document (reference text for retrieval)
    #[serde(default = "default_corpus_path")]
    pub corpus_path: PathBuf,

    /// Optional config file path
    #[serde(skip)]
    pub config_file: Option<PathBuf>,

    /// Generation provider
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Generation model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Embedding provider ("gemini" or "trigram")
    #[serde(default = "default_embedding_provider")]
    pub embedding_provider: String,

    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Optional custom API endpoint
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Environment variable holding the API credential
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Number of prior turns folded into the prompt
    #[serde(default = "default_history_turns")]
    pub history_turns: usize,

    /// Character budget for the composed prompt
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,

    /// Retry policy for the generation call
    #[serde(default)]
    pub retry: RetryConfig,

    /// Optional persona YAML file (built-in persona when absent)
    #[serde(default)]
    pub persona_file: Option<PathBuf>,

    /// Log level override (error, warn, info, debug, trace)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Verbose mode (implies debug logging)
    #[serde(default)]
    pub verbose: bool,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/discussion_guide.txt")
}

fn default_provider() -> String {
    "gemini".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_embedding_provider() -> String {
    "gemini".to_string()
}

fn default_embedding_model() -> String {
    "embedding-001".to_string()
}

fn default_api_key_env() -> String {
    "GOOGLE_API_KEY".to_string()
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    4
}

fn default_history_turns() -> usize {
    5
}

fn default_max_prompt_chars() -> usize {
    24_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            config_file: None,
            provider: default_provider(),
            model: default_model(),
            embedding_provider: default_embedding_provider(),
            embedding_model: default_embedding_model(),
            endpoint: None,
            api_key_env: default_api_key_env(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            history_turns: default_history_turns(),
            max_prompt_chars: default_max_prompt_chars(),
            retry: RetryConfig::default(),
            persona_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional YAML file, then apply
    /// environment variables.
    pub fn load(config_file: Option<&PathBuf>) -> AppResult<Self> {
        let mut config = match config_file {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                let mut parsed: AppConfig = serde_yaml::from_str(&raw)
                    .map_err(|e| AppError::Config(format!("Invalid config file: {}", e)))?;
                parsed.config_file = Some(path.clone());
                parsed
            }
            None => AppConfig::default(),
        };

        // Environment overrides
        if let Ok(corpus) = std::env::var("TUTOR_CORPUS") {
            config.corpus_path = PathBuf::from(corpus);
        }
        if let Ok(provider) = std::env::var("TUTOR_PROVIDER") {
            config.provider = provider;
        }
        if let Ok(model) = std::env::var("TUTOR_MODEL") {
            config.model = model;
        }
        if let Ok(provider) = std::env::var("TUTOR_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        Ok(config)
    }

    /// Apply CLI overrides, giving precedence to command-line flags.
    #[allow(clippy::too_many_arguments)]
    pub fn with_overrides(
        mut self,
        corpus: Option<PathBuf>,
        provider: Option<String>,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(corpus) = corpus {
            self.corpus_path = corpus;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(model) = model {
            self.model = model;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve the API credential from the configured environment variable.
    ///
    /// Local providers do not need a credential; remote ones do, and a
    /// missing credential must surface as a single clear startup error
    /// rather than failing deep inside the pipeline.
    pub fn resolve_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok()
    }

    /// Whether the configured embedding provider performs network calls.
    pub fn embedding_is_remote(&self) -> bool {
        self.embedding_provider != "trigram"
    }

    /// Validate configuration at startup.
    pub fn validate(&self) -> AppResult<()> {
        if self.chunk_size == 0 {
            return Err(AppError::Config("chunk_size must be positive".to_string()));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }

        if !KNOWN_PROVIDERS.contains(&self.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown provider: {}. Supported: {}",
                self.provider,
                KNOWN_PROVIDERS.join(", ")
            )));
        }

        if !KNOWN_EMBEDDING_PROVIDERS.contains(&self.embedding_provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding_provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.retry.max_attempts == 0 {
            return Err(AppError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        // Remote generation always needs a credential; remote embedding
        // shares the same one.
        if self.resolve_api_key().is_none() {
            return Err(AppError::Config(format!(
                "Missing API key: set the {} environment variable",
                self.api_key_env
            )));
        }

        Ok(())
    }
}

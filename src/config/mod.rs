//! Configuration management.
//!
//! All runtime configuration comes from environment variables (a `.env` file
//! is honored via `dotenvy` at binary startup). Builders follow the
//! `Default` + `from_env()` + `with_env_overrides()` pattern so tests can
//! construct configurations without touching the process environment.
//!
//! # Environment Variables
//!
//! | Name | Effect |
//! |------|--------|
//! | `LLM_PROVIDER` | Active provider: `openai`, `claude`, `gemini`, `ollama` |
//! | `<PROVIDER>_API_KEY` | Credential for hosted providers (read per provider) |
//! | `<PROVIDER>_MODEL` | Model name passed through to the provider |
//! | `MKSAP_DATA_ROOT` | Root of the question corpus |
//! | `MKSAP_ARTIFACTS_DIR` | Checkpoints and log files root |
//! | `MKSAP_NLP_MODEL` | Medical lexicon directory; absent → legacy mode |
//! | `USE_HYBRID_PIPELINE` | NLP preprocessing and prompt guidance on/off |
//! | `MKSAP_ENHANCE_CONTEXT` | Context-enhancement stage B on/off |
//! | `MKSAP_LLM_CACHE_ENABLED` | Response cache on/off |
//! | `MKSAP_LLM_CACHE_TTL` | Response cache TTL in seconds |
//! | `MKSAP_LLM_TIMEOUT_SECS` | Per provider call timeout |
//! | `MKSAP_LLM_MAX_RETRIES` | Retry attempts for transient failures |
//! | `MKSAP_PROMPTS_DIR` | Prompt template override directory |

use std::path::PathBuf;

/// Parses a boolean environment value.
///
/// Accepts `1`, `true`, `yes`, `on` (case-insensitive) as true; everything
/// else is false.
#[must_use]
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name).map_or(default, |v| parse_bool(&v))
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

/// Main configuration for clozegen.
#[derive(Debug, Clone)]
pub struct Config {
    /// Active provider short name.
    pub provider: String,
    /// Root directory of the question corpus.
    pub data_root: PathBuf,
    /// Root directory for checkpoints and logs.
    pub artifacts_dir: PathBuf,
    /// Medical lexicon directory; `None` triggers legacy-mode degradation.
    pub nlp_model_dir: Option<PathBuf>,
    /// Whether NLP preprocessing and prompt guidance are enabled.
    pub hybrid_pipeline: bool,
    /// Whether context-enhancement stage B may call the provider.
    pub enhance_context: bool,
    /// Prompt template override directory.
    pub prompts_dir: Option<PathBuf>,
    /// Response cache settings.
    pub cache: CacheSettings,
    /// LLM call settings.
    pub llm: LlmSettings,
}

/// Response cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct CacheSettings {
    /// Whether the response cache is consulted at all.
    pub enabled: bool,
    /// Time-to-live for cache entries in seconds.
    pub ttl_secs: u64,
    /// Maximum number of entries before LRU eviction.
    pub max_entries: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_entries: 10_000,
        }
    }
}

impl CacheSettings {
    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.enabled = env_bool("MKSAP_LLM_CACHE_ENABLED", self.enabled);
        self.ttl_secs = env_parse("MKSAP_LLM_CACHE_TTL", self.ttl_secs);
        self.max_entries = env_parse("MKSAP_LLM_CACHE_MAX_ENTRIES", self.max_entries);
        self
    }
}

/// LLM call configuration.
#[derive(Debug, Clone, Copy)]
pub struct LlmSettings {
    /// Per provider call timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum retry attempts for transient failures.
    pub max_retries: u32,
    /// Sampling temperature passed to the provider and into the cache key.
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 5,
            temperature: 0.0,
        }
    }
}

impl LlmSettings {
    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        self.timeout_secs = env_parse("MKSAP_LLM_TIMEOUT_SECS", self.timeout_secs);
        self.max_retries = env_parse("MKSAP_LLM_MAX_RETRIES", self.max_retries);
        self.temperature = env_parse("MKSAP_LLM_TEMPERATURE", self.temperature);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            data_root: PathBuf::from("data"),
            artifacts_dir: default_artifacts_dir(),
            nlp_model_dir: None,
            hybrid_pipeline: true,
            enhance_context: true,
            prompts_dir: None,
            cache: CacheSettings::default(),
            llm: LlmSettings::default(),
        }
    }
}

/// Default artifacts root when `MKSAP_ARTIFACTS_DIR` is unset.
///
/// Falls back to `./artifacts` when no platform data directory is available.
fn default_artifacts_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "clozegen").map_or_else(
        || PathBuf::from("artifacts"),
        |dirs| dirs.data_local_dir().to_path_buf(),
    )
}

impl Config {
    /// Loads configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(provider) = std::env::var("LLM_PROVIDER") {
            if !provider.trim().is_empty() {
                self.provider = provider.trim().to_lowercase();
            }
        }
        if let Ok(root) = std::env::var("MKSAP_DATA_ROOT") {
            if !root.trim().is_empty() {
                self.data_root = PathBuf::from(root);
            }
        }
        if let Ok(dir) = std::env::var("MKSAP_ARTIFACTS_DIR") {
            if !dir.trim().is_empty() {
                self.artifacts_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = std::env::var("MKSAP_NLP_MODEL") {
            if !dir.trim().is_empty() {
                self.nlp_model_dir = Some(PathBuf::from(dir));
            }
        }
        if let Ok(dir) = std::env::var("MKSAP_PROMPTS_DIR") {
            if !dir.trim().is_empty() {
                self.prompts_dir = Some(PathBuf::from(dir));
            }
        }
        self.hybrid_pipeline = env_bool("USE_HYBRID_PIPELINE", self.hybrid_pipeline);
        self.enhance_context = env_bool("MKSAP_ENHANCE_CONTEXT", self.enhance_context);
        self.cache = self.cache.with_env_overrides();
        self.llm = self.llm.with_env_overrides();
        self
    }

    /// Directory holding per-provider checkpoint files.
    #[must_use]
    pub fn checkpoints_dir(&self) -> PathBuf {
        self.artifacts_dir.join("checkpoints")
    }

    /// Directory holding per-run log files.
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.artifacts_dir.join("logs")
    }
}

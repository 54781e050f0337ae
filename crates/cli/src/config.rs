//! Process configuration: a single immutable snapshot loaded once at
//! startup (§1 "Config"), re-loadable behind a write lock for `init
//! --force`-style re-initialization without a restart.

use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

fn default_data_dir() -> PathBuf {
    std::env::var("CONTEXTD_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|home| home.join(".contextd").join("data"))
                .unwrap_or_else(|| PathBuf::from(".contextd/data"))
        })
}

fn default_config_path() -> PathBuf {
    std::env::var("CONTEXTD_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|home| home.join(".contextd").join("config.toml"))
                .unwrap_or_else(|| PathBuf::from(".contextd/config.toml"))
        })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// local | remote | stub
    pub provider: String,
    pub model_id: String,
    pub dimension: usize,
    pub max_sequence_length: usize,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "local".to_string(),
            model_id: "bge-small-en-v1.5".to_string(),
            dimension: 384,
            max_sequence_length: 256,
            endpoint: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerConfig {
    /// none | anthropic | openai
    pub provider: String,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: "none".to_string(),
            model: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    pub burst: f64,
    pub refill_per_sec: f64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            burst: 5.0,
            refill_per_sec: 0.83,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionDetectorToml {
    pub confidence_threshold: f32,
    pub llm_refine_threshold: f32,
}

impl Default for DecisionDetectorToml {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            llm_refine_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrubConfig {
    /// Ingest scrubbing is always on per spec.md §4.4; this only gates
    /// whether outbound-only patterns also apply during ingest, for
    /// deployments that want belt-and-suspenders redaction before storage.
    pub strict_ingest: bool,
}

impl Default for ScrubConfig {
    fn default() -> Self {
        Self {
            strict_ingest: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultTenantToml {
    pub tenant_id: Option<String>,
    pub team_id: Option<String>,
    pub project_id: Option<String>,
}

impl Default for DefaultTenantToml {
    fn default() -> Self {
        Self {
            tenant_id: None,
            team_id: None,
            project_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoCheckpointConfig {
    pub token_threshold: u64,
}

impl Default for AutoCheckpointConfig {
    fn default() -> Self {
        Self {
            token_threshold: 150_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub public: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8765".to_string(),
            public: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub embedding: EmbeddingConfig,
    pub summarizer: SummarizerConfig,
    pub rate_limiter: RateLimiterConfig,
    pub decision_detector: DecisionDetectorToml,
    pub scrub: ScrubConfig,
    pub default_tenant: DefaultTenantToml,
    pub auto_checkpoint: AutoCheckpointConfig,
    pub http: HttpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            embedding: EmbeddingConfig::default(),
            summarizer: SummarizerConfig::default(),
            rate_limiter: RateLimiterConfig::default(),
            decision_detector: DecisionDetectorToml::default(),
            scrub: ScrubConfig::default(),
            default_tenant: DefaultTenantToml::default(),
            auto_checkpoint: AutoCheckpointConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl Config {
    /// Load from `path` if it exists, falling back to defaults with a debug
    /// log. A malformed file is a fatal startup error (§7 `ErrValidation`)
    /// rather than a silent fallback, since a typo'd config shouldn't
    /// silently behave like no config at all.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn default_path() -> PathBuf {
        default_config_path()
    }
}

/// Hot-reloadable snapshot: readers take a cheap `Arc` clone under a read
/// lock, writers (`init --force`) replace the whole snapshot atomically.
#[derive(Clone)]
pub struct ConfigHandle(Arc<RwLock<Arc<Config>>>);

impl ConfigHandle {
    pub fn new(config: Config) -> Self {
        Self(Arc::new(RwLock::new(Arc::new(config))))
    }

    pub fn current(&self) -> Arc<Config> {
        self.0.read().expect("config lock poisoned").clone()
    }

    pub fn replace(&self, config: Config) {
        *self.0.write().expect("config lock poisoned") = Arc::new(config);
    }
}

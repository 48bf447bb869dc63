//! TOML configuration parsing and validation.
//!
//! Every section has defaults, so an empty file (or no file at all, see
//! [`Config::minimal`]) is a valid configuration: remote spaCy catalog, builtin
//! extractor, English / Small, every metric group the extractor can compute,
//! split by line.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::metrics::supported_metrics;
use crate::options::{self, MetricGroup, ModelSize};

/// Default location of the spaCy model compatibility table.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/explosion/spacy-models/master/compatibility.json";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Built-in defaults, used when no configuration file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    /// `remote` (fetch compatibility JSON) or `static` (use `models`).
    #[serde(default = "default_catalog_source")]
    pub source: String,
    #[serde(default = "default_catalog_url")]
    pub url: String,
    /// Version key to read from the compatibility table. Newest when unset.
    #[serde(default)]
    pub spacy_version: Option<String>,
    /// Model identifiers for the static source.
    #[serde(default)]
    pub models: Vec<String>,
    /// Whitelist of model sizes offered to users.
    #[serde(default = "default_model_sizes")]
    pub model_sizes: Vec<ModelSize>,
    #[serde(default = "default_catalog_timeout")]
    pub timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: default_catalog_source(),
            url: default_catalog_url(),
            spacy_version: None,
            models: Vec::new(),
            model_sizes: default_model_sizes(),
            timeout_secs: default_catalog_timeout(),
        }
    }
}

fn default_catalog_source() -> String {
    "remote".to_string()
}
fn default_catalog_url() -> String {
    DEFAULT_CATALOG_URL.to_string()
}
fn default_model_sizes() -> Vec<ModelSize> {
    options::DEFAULT_MODEL_SIZES.to_vec()
}
fn default_catalog_timeout() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractorConfig {
    /// `disabled`, `builtin`, `http`, or `command`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default = "default_extractor_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            url: None,
            command: Vec::new(),
            timeout_secs: default_extractor_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_provider() -> String {
    "builtin".to_string()
}
fn default_extractor_timeout() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    3
}

/// Preselected values for an analysis; each can be overridden per request.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_model_size")]
    pub model_size: String,
    /// Empty or unset means every group the configured provider supports.
    #[serde(default)]
    pub metrics: Vec<MetricGroup>,
    #[serde(default = "default_split_by_line")]
    pub split_by_line: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            model_size: default_model_size(),
            metrics: supported_metrics(&default_provider()),
            split_by_line: default_split_by_line(),
        }
    }
}

fn default_language() -> String {
    options::DEFAULT_LANGUAGE.to_string()
}
fn default_model_size() -> String {
    ModelSize::Small.pretty().to_string()
}
fn default_split_by_line() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Maximum number of memoized extraction results; `0` disables caching.
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
        }
    }
}

fn default_cache_capacity() -> usize {
    64
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8501".to_string()
}

/// Parse and validate a configuration string.
pub fn parse_config(content: &str) -> Result<Config> {
    let mut config: Config =
        toml::from_str(content).with_context(|| "Failed to parse config file")?;
    if config.analysis.metrics.is_empty() {
        config.analysis.metrics = supported_metrics(&config.extractor.provider);
    }
    validate(&config)?;
    Ok(config)
}

/// Read, parse, and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Load `path` if it exists, otherwise fall back to [`Config::minimal`].
pub fn load_or_default(path: &Path) -> Result<Config> {
    if path.exists() {
        load_config(path)
    } else {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        Ok(Config::minimal())
    }
}

fn validate(config: &Config) -> Result<()> {
    // Catalog
    match config.catalog.source.as_str() {
        "remote" => {
            if config.catalog.url.trim().is_empty() {
                bail!("catalog.url must not be empty when source is 'remote'");
            }
        }
        "static" => {
            if config.catalog.models.is_empty() {
                bail!("catalog.models must list at least one model when source is 'static'");
            }
        }
        other => bail!(
            "Unknown catalog source: '{}'. Must be remote or static.",
            other
        ),
    }
    if config.catalog.model_sizes.is_empty() {
        bail!("catalog.model_sizes must contain at least one size");
    }
    if config.catalog.timeout_secs == 0 {
        bail!("catalog.timeout_secs must be > 0");
    }

    // Extractor
    match config.extractor.provider.as_str() {
        "disabled" | "builtin" => {}
        "http" => {
            if config.extractor.url.as_deref().unwrap_or("").trim().is_empty() {
                bail!("extractor.url must be specified when provider is 'http'");
            }
        }
        "command" => {
            if config.extractor.command.is_empty() {
                bail!("extractor.command must be specified when provider is 'command'");
            }
        }
        other => bail!(
            "Unknown extractor provider: '{}'. Must be disabled, builtin, http, or command.",
            other
        ),
    }
    if config.extractor.timeout_secs == 0 {
        bail!("extractor.timeout_secs must be > 0");
    }

    // Analysis defaults
    config
        .analysis
        .model_size
        .parse::<ModelSize>()
        .with_context(|| "analysis.model_size is invalid")?;
    let supported = supported_metrics(&config.extractor.provider);
    if let Some(group) = config
        .analysis
        .metrics
        .iter()
        .find(|g| !supported.contains(g))
    {
        bail!(
            "analysis.metrics includes '{}', which the '{}' extractor cannot compute",
            group,
            config.extractor.provider
        );
    }

    Ok(())
}

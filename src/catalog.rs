//! Language-model compatibility catalog.
//!
//! The catalog lists which model identifiers currently exist, e.g.
//! `en_core_web_sm` or `da_core_news_trf`. Each identifier encodes a language
//! (first underscore token) and a size (last underscore token).
//!
//! Fetching is separated from parsing: a [`CatalogSource`] produces the raw
//! list of identifiers and [`LanguageModelCatalog::from_model_names`] turns it
//! into a lookup table. Two sources are provided:
//!
//! - **[`RemoteCatalog`]** — downloads spaCy's `compatibility.json`.
//! - **[`StaticCatalog`]** — a fixed list, typically from configuration.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::config::CatalogConfig;

/// Language code → size code → model identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageModelCatalog {
    languages: BTreeMap<String, BTreeMap<String, BTreeSet<String>>>,
}

impl LanguageModelCatalog {
    /// Build a catalog from model identifiers.
    ///
    /// Identifiers with fewer than two underscore-separated tokens are
    /// ignored since they encode no size.
    pub fn from_model_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut languages: BTreeMap<String, BTreeMap<String, BTreeSet<String>>> = BTreeMap::new();
        for name in names {
            let name = name.as_ref().trim();
            let tokens: Vec<&str> = name.split('_').collect();
            if tokens.len() < 2 || tokens[0].is_empty() || tokens[tokens.len() - 1].is_empty() {
                continue;
            }
            let lang = tokens[0];
            let size = tokens[tokens.len() - 1];
            languages
                .entry(lang.to_string())
                .or_default()
                .entry(size.to_string())
                .or_default()
                .insert(name.to_string());
        }
        Self { languages }
    }

    /// Size codes seen for `language`, whitelisted or not.
    pub fn sizes(&self, language: &str) -> BTreeSet<&str> {
        self.languages
            .get(language)
            .map(|sizes| sizes.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Model identifiers for a language and size code.
    pub fn models(&self, language: &str, size: &str) -> Vec<&str> {
        self.languages
            .get(language)
            .and_then(|sizes| sizes.get(size))
            .map(|names| names.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

/// Something that can produce the list of available model identifiers.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Short description used in log lines and `tdesc catalog` output.
    fn describe(&self) -> String;

    /// Fetch the model identifiers. Failing to reach the catalog is an error;
    /// there is no fallback.
    async fn fetch(&self) -> Result<Vec<String>>;
}

/// A fixed list of model identifiers.
pub struct StaticCatalog {
    models: Vec<String>,
}

impl StaticCatalog {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            models: models.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    fn describe(&self) -> String {
        format!("static ({} models)", self.models.len())
    }

    async fn fetch(&self) -> Result<Vec<String>> {
        Ok(self.models.clone())
    }
}

/// spaCy's compatibility table, fetched over HTTP.
///
/// The document has the shape
/// `{"spacy": {"<version>": {"<model>": ["<model version>", ...]}}}`.
pub struct RemoteCatalog {
    url: String,
    version: Option<String>,
    timeout: Duration,
}

impl RemoteCatalog {
    pub fn new(url: impl Into<String>, version: Option<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            version,
            timeout,
        }
    }
}

#[async_trait]
impl CatalogSource for RemoteCatalog {
    fn describe(&self) -> String {
        match &self.version {
            Some(v) => format!("remote {} (spacy {})", self.url, v),
            None => format!("remote {}", self.url),
        }
    }

    async fn fetch(&self) -> Result<Vec<String>> {
        let client = reqwest::Client::builder().timeout(self.timeout).build()?;

        tracing::debug!(url = %self.url, "fetching model catalog");
        let response = client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach model catalog at {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Model catalog at {} returned HTTP {}", self.url, status);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .with_context(|| "Model catalog response is not valid JSON")?;

        parse_compatibility(&json, self.version.as_deref())
    }
}

/// Extract the model identifiers for one version from a compatibility table.
///
/// With `version = None` the highest version key is used.
pub fn parse_compatibility(json: &serde_json::Value, version: Option<&str>) -> Result<Vec<String>> {
    let table = json
        .get("spacy")
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow::anyhow!("Invalid compatibility table: missing 'spacy' object"))?;

    let key = match version {
        Some(v) => {
            if !table.contains_key(v) {
                bail!("Compatibility table has no entry for spacy version {}", v);
            }
            v.to_string()
        }
        None => table
            .keys()
            .max_by(|a, b| version_key(a).cmp(&version_key(b)))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Compatibility table lists no versions"))?,
    };

    let models = table
        .get(&key)
        .and_then(|v| v.as_object())
        .ok_or_else(|| anyhow::anyhow!("Invalid compatibility table entry for {}", key))?;

    tracing::debug!(version = %key, models = models.len(), "parsed compatibility table");
    Ok(models.keys().cloned().collect())
}

/// Numeric ordering for dotted version strings; non-numeric parts sort low.
fn version_key(version: &str) -> Vec<u64> {
    version
        .split('.')
        .map(|part| part.parse::<u64>().unwrap_or(0))
        .collect()
}

/// Instantiate the catalog source named by the configuration.
pub fn create_catalog_source(config: &CatalogConfig) -> Result<Box<dyn CatalogSource>> {
    match config.source.as_str() {
        "remote" => Ok(Box::new(RemoteCatalog::new(
            config.url.clone(),
            config.spacy_version.clone(),
            Duration::from_secs(config.timeout_secs),
        ))),
        "static" => Ok(Box::new(StaticCatalog::new(config.models.clone()))),
        other => bail!("Unknown catalog source: {}", other),
    }
}

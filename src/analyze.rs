//! The analysis pipeline.
//!
//! [`Analyzer`] owns the injectable collaborators (catalog source, model
//! provider, metrics extractor) plus the process-wide state (fetched catalog,
//! result cache) and runs one analysis:
//!
//! ```text
//! request ─► validate inputs ─► resolve language/size ─► catalog
//!         ─► availability check ─► prepare model
//!         ─► per document: normalize ─► cache / extract ─► label
//!         ─► concatenate
//! ```
//!
//! Every rejection that does not need the extractor happens before it is
//! called, so an unavailable (language, size) pair never triggers a model
//! download or computation.

use anyhow::Result;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::availability::{self, LanguageFilter};
use crate::cache::{CacheKey, ResultCache};
use crate::catalog::{create_catalog_source, CatalogSource, LanguageModelCatalog};
use crate::config::{AnalysisConfig, Config};
use crate::metrics::{create_extractor, ExtractionRequest, MetricsExtractor};
use crate::model_provider::{CatalogModelProvider, ModelProvider};
use crate::models::{Document, ModelHandle};
use crate::normalize::normalize_document;
use crate::options::{language_code, MetricGroup, ModelSize};
use crate::table::MetricsTable;

/// Name of the label column added in multi-document mode.
pub const FILE_COLUMN: &str = "File";

/// Message shown when a (language, size) pair cannot be used.
pub const MODEL_SIZE_UNAVAILABLE_MESSAGE: &str =
    "Sorry! The chosen model size is not available in this language. Please try another.";

/// What to analyze.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisInput {
    /// Free text; results carry no label column.
    Text(String),
    /// One or more documents; results get a leading `File` column.
    Files(Vec<Document>),
}

#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub input: AnalysisInput,
    /// Pretty name (`"Danish"`) or short code (`"da"`).
    pub language: String,
    /// Pretty name (`"Small"`) or short code (`"sm"`).
    pub model_size: String,
    pub metrics: Vec<MetricGroup>,
    pub split_by_line: bool,
}

impl AnalysisRequest {
    /// A request for `input` using the configured preselections.
    pub fn with_defaults(input: AnalysisInput, defaults: &AnalysisConfig) -> Self {
        Self {
            input,
            language: defaults.language.clone(),
            model_size: defaults.model_size.clone(),
            metrics: defaults.metrics.clone(),
            split_by_line: defaults.split_by_line,
        }
    }
}

/// Which required input was missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    Text,
    Files,
    Metrics,
}

impl MissingInput {
    pub fn message(self) -> &'static str {
        match self {
            MissingInput::Text => "Please enter some text to analyze.",
            MissingInput::Files => "Please upload at least one file with text in it.",
            MissingInput::Metrics => "Please select at least one metric group.",
        }
    }
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("{}", .0.message())]
    MissingInput(MissingInput),

    #[error("{0}")]
    UnknownModelSize(String),

    #[error("model size {size} is not available for language '{language}'")]
    ModelSizeUnavailable { language: String, size: ModelSize },

    #[error("model catalog is unavailable: {0:#}")]
    Catalog(anyhow::Error),

    #[error("could not prepare language model: {0:#}")]
    Model(anyhow::Error),

    #[error("metrics extraction failed: {0:#}")]
    Extraction(anyhow::Error),

    #[error("could not assemble results: {0:#}")]
    Table(anyhow::Error),
}

impl AnalyzeError {
    /// Text suitable for showing to the person who made the request.
    pub fn user_message(&self) -> String {
        match self {
            AnalyzeError::UnknownModelSize(_) | AnalyzeError::ModelSizeUnavailable { .. } => {
                MODEL_SIZE_UNAVAILABLE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result of a successful analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub model: ModelHandle,
    #[serde(flatten)]
    pub table: MetricsTable,
    /// Documents whose results came from the cache.
    #[serde(skip)]
    pub cache_hits: usize,
}

pub struct Analyzer {
    catalog_source: Box<dyn CatalogSource>,
    catalog: tokio::sync::Mutex<Option<Arc<LanguageModelCatalog>>>,
    whitelist: Vec<ModelSize>,
    models: Box<dyn ModelProvider>,
    extractor: Box<dyn MetricsExtractor>,
    cache: Mutex<ResultCache>,
}

impl Analyzer {
    /// Build an analyzer from configuration: catalog source and extractor
    /// per their sections, [`CatalogModelProvider`] for models.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            create_catalog_source(&config.catalog)?,
            config.catalog.model_sizes.clone(),
            Box::new(CatalogModelProvider),
            create_extractor(&config.extractor)?,
            config.cache.capacity,
        ))
    }

    pub fn new(
        catalog_source: Box<dyn CatalogSource>,
        whitelist: Vec<ModelSize>,
        models: Box<dyn ModelProvider>,
        extractor: Box<dyn MetricsExtractor>,
        cache_capacity: usize,
    ) -> Self {
        Self {
            catalog_source,
            catalog: tokio::sync::Mutex::new(None),
            whitelist,
            models,
            extractor,
            cache: Mutex::new(ResultCache::new(cache_capacity)),
        }
    }

    pub fn whitelist(&self) -> &[ModelSize] {
        &self.whitelist
    }

    pub fn extractor_name(&self) -> &str {
        self.extractor.name()
    }

    pub fn catalog_description(&self) -> String {
        self.catalog_source.describe()
    }

    /// The catalog, fetched on first use and kept for the life of the
    /// analyzer. A failed fetch is not cached.
    pub async fn catalog(&self) -> Result<Arc<LanguageModelCatalog>> {
        let mut slot = self.catalog.lock().await;
        if let Some(catalog) = slot.as_ref() {
            return Ok(catalog.clone());
        }

        let names = self.catalog_source.fetch().await?;
        let catalog = Arc::new(LanguageModelCatalog::from_model_names(names));
        tracing::info!(
            source = %self.catalog_source.describe(),
            languages = catalog.languages().count(),
            "loaded model catalog"
        );
        *slot = Some(catalog.clone());
        Ok(catalog)
    }

    /// Model sizes a user may choose for `filter`.
    ///
    /// [`LanguageFilter::All`] never touches the catalog.
    pub async fn available_sizes(&self, filter: &LanguageFilter) -> Result<Vec<ModelSize>> {
        match filter {
            LanguageFilter::All => Ok(availability::available_model_sizes(
                &LanguageModelCatalog::default(),
                &self.whitelist,
                filter,
            )),
            LanguageFilter::Code(_) => {
                let catalog = self.catalog().await?;
                Ok(availability::available_model_sizes(
                    &catalog,
                    &self.whitelist,
                    filter,
                ))
            }
        }
    }

    /// Run one analysis.
    ///
    /// Missing text or files is reported before a missing metric selection.
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisReport, AnalyzeError> {
        let (documents, labelled) = match &request.input {
            AnalysisInput::Text(text) => {
                if text.trim().is_empty() {
                    return Err(AnalyzeError::MissingInput(MissingInput::Text));
                }
                (vec![Document::unlabelled(text.clone())], false)
            }
            AnalysisInput::Files(documents) => {
                if documents.iter().all(|d| d.text.trim().is_empty()) {
                    return Err(AnalyzeError::MissingInput(MissingInput::Files));
                }
                (documents.clone(), true)
            }
        };
        if request.metrics.is_empty() {
            return Err(AnalyzeError::MissingInput(MissingInput::Metrics));
        }

        let size: ModelSize = request
            .model_size
            .parse()
            .map_err(|e: anyhow::Error| AnalyzeError::UnknownModelSize(e.to_string()))?;
        let language = language_code(&request.language);

        let catalog = self.catalog().await.map_err(AnalyzeError::Catalog)?;
        if !availability::is_available(&catalog, &self.whitelist, &language, size) {
            tracing::info!(language = %language, size = size.short(), "model size not available");
            return Err(AnalyzeError::ModelSizeUnavailable {
                language: request.language.clone(),
                size,
            });
        }

        let model = self
            .models
            .prepare(&catalog, &language, size)
            .await
            .map_err(AnalyzeError::Model)?;

        let mut metrics = request.metrics.clone();
        metrics.sort();
        metrics.dedup();

        let mut tables = Vec::with_capacity(documents.len());
        let mut cache_hits = 0;

        for (idx, document) in documents.iter().enumerate() {
            let label = labelled.then(|| {
                document
                    .label
                    .clone()
                    .unwrap_or_else(|| format!("document-{}", idx + 1))
            });

            let units = normalize_document(document, request.split_by_line);
            if units.is_empty() {
                tracing::warn!(
                    document = label.as_deref().unwrap_or(""),
                    "document has no text, skipping"
                );
                continue;
            }

            let key = CacheKey::new(
                &document.text,
                &language,
                size,
                &metrics,
                request.split_by_line,
                label.as_deref(),
            );
            if let Some(table) = self.cached(&key) {
                tracing::debug!(key = key.as_str(), "result cache hit");
                cache_hits += 1;
                tables.push(table);
                continue;
            }

            let mut table = self
                .extractor
                .extract(ExtractionRequest {
                    units: &units,
                    model: &model,
                    metrics: &metrics,
                })
                .await
                .map_err(AnalyzeError::Extraction)?;

            if let Some(label) = &label {
                table
                    .prepend_label(FILE_COLUMN, label)
                    .map_err(AnalyzeError::Table)?;
            }

            self.store(key, table.clone());
            tables.push(table);
        }

        let table = MetricsTable::concat(tables);
        tracing::info!(
            model = %model.name,
            documents = documents.len(),
            rows = table.num_rows(),
            cache_hits,
            "analysis complete"
        );

        Ok(AnalysisReport {
            model,
            table,
            cache_hits,
        })
    }

    /// Drop every memoized result, returning how many were removed.
    pub fn clear_cache(&self) -> usize {
        self.lock_cache().clear()
    }

    pub fn cached_results(&self) -> usize {
        self.lock_cache().len()
    }

    fn cached(&self, key: &CacheKey) -> Option<MetricsTable> {
        self.lock_cache().get(key)
    }

    fn store(&self, key: CacheKey, table: MetricsTable) {
        self.lock_cache().insert(key, table);
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, ResultCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::metrics::BuiltinExtractor;
    use crate::options::DEFAULT_MODEL_SIZES;

    fn analyzer(capacity: usize) -> Analyzer {
        Analyzer::new(
            Box::new(StaticCatalog::new([
                "en_core_web_sm",
                "en_core_web_md",
                "da_core_news_sm",
                "da_core_news_trf",
            ])),
            DEFAULT_MODEL_SIZES.to_vec(),
            Box::new(CatalogModelProvider),
            Box::new(BuiltinExtractor),
            capacity,
        )
    }

    fn request(input: AnalysisInput) -> AnalysisRequest {
        AnalysisRequest {
            input,
            language: "English".into(),
            model_size: "Small".into(),
            metrics: vec![MetricGroup::DescriptiveStats],
            split_by_line: true,
        }
    }

    #[tokio::test]
    async fn test_free_text_split_by_line() {
        let report = analyzer(0)
            .analyze(&request(AnalysisInput::Text("Hello.\n\nWorld.".into())))
            .await
            .unwrap();
        assert_eq!(report.model.name, "en_core_web_sm");
        assert_eq!(report.table.num_rows(), 2);
        assert_eq!(report.table.columns()[0], "text");
        assert!(report.table.column_index(FILE_COLUMN).is_none());
    }

    #[tokio::test]
    async fn test_files_get_label_column_in_order() {
        let mut req = request(AnalysisInput::Files(vec![
            Document::labelled("a.txt", "One."),
            Document::labelled("b.txt", "Two."),
        ]));
        req.split_by_line = false;
        let report = analyzer(0).analyze(&req).await.unwrap();

        assert_eq!(report.table.num_rows(), 2);
        assert_eq!(report.table.columns()[0], FILE_COLUMN);
        let files: Vec<_> = report.table.rows().iter().map(|r| r[0].as_str()).collect();
        assert_eq!(files, vec![Some("a.txt"), Some("b.txt")]);
    }

    #[tokio::test]
    async fn test_blank_document_contributes_no_rows() {
        let req = request(AnalysisInput::Files(vec![
            Document::labelled("a.txt", "One."),
            Document::labelled("blank.txt", "  \n "),
        ]));
        let report = analyzer(0).analyze(&req).await.unwrap();
        assert_eq!(report.table.num_rows(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_size_rejected() {
        let mut req = request(AnalysisInput::Text("Hej.".into()));
        req.language = "Danish".into();
        req.model_size = "Transformer".into();
        let err = analyzer(0).analyze(&req).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::ModelSizeUnavailable { .. }));
        assert_eq!(err.user_message(), MODEL_SIZE_UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_inputs() {
        let a = analyzer(0);

        let err = a.analyze(&request(AnalysisInput::Text("  ".into()))).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::MissingInput(MissingInput::Text)));

        let err = a.analyze(&request(AnalysisInput::Files(vec![]))).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::MissingInput(MissingInput::Files)));

        let mut req = request(AnalysisInput::Text("Hi.".into()));
        req.metrics.clear();
        let err = a.analyze(&req).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::MissingInput(MissingInput::Metrics)));

        let mut req = request(AnalysisInput::Files(vec![]));
        req.metrics.clear();
        let err = a.analyze(&req).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::MissingInput(MissingInput::Files)));
    }

    #[tokio::test]
    async fn test_default_config_analyzes_text() {
        let cfg = Config::minimal();
        let a = Analyzer::new(
            Box::new(StaticCatalog::new(["en_core_web_sm"])),
            cfg.catalog.model_sizes.clone(),
            Box::new(CatalogModelProvider),
            create_extractor(&cfg.extractor).unwrap(),
            cfg.cache.capacity,
        );
        let req =
            AnalysisRequest::with_defaults(AnalysisInput::Text("Hello.".into()), &cfg.analysis);
        let report = a.analyze(&req).await.unwrap();
        assert_eq!(report.table.num_rows(), 1);
        assert!(report.table.column_index("n_tokens").is_some());
        assert!(report.table.column_index("flesch_reading_ease").is_some());
    }

    #[tokio::test]
    async fn test_unknown_model_size() {
        let mut req = request(AnalysisInput::Text("Hi.".into()));
        req.model_size = "Huge".into();
        let err = analyzer(0).analyze(&req).await.unwrap_err();
        assert!(matches!(err, AnalyzeError::UnknownModelSize(_)));
    }

    #[tokio::test]
    async fn test_repeat_request_hits_cache() {
        let a = analyzer(8);
        let req = request(AnalysisInput::Text("Hello.".into()));
        assert_eq!(a.analyze(&req).await.unwrap().cache_hits, 0);
        assert_eq!(a.analyze(&req).await.unwrap().cache_hits, 1);
        assert_eq!(a.cached_results(), 1);
        assert_eq!(a.clear_cache(), 1);
        assert_eq!(a.analyze(&req).await.unwrap().cache_hits, 0);
    }

    #[tokio::test]
    async fn test_available_sizes() {
        let a = analyzer(0);
        assert_eq!(
            a.available_sizes(&LanguageFilter::parse("English")).await.unwrap(),
            vec![ModelSize::Medium, ModelSize::Small]
        );
        assert_eq!(
            a.available_sizes(&LanguageFilter::parse("da")).await.unwrap(),
            vec![ModelSize::Small]
        );
        assert_eq!(
            a.available_sizes(&LanguageFilter::All).await.unwrap(),
            DEFAULT_MODEL_SIZES.to_vec()
        );
    }
}

//! Metrics extractor abstraction and implementations.
//!
//! Defines the [`MetricsExtractor`] trait and concrete implementations:
//! - **[`DisabledExtractor`]** — returns errors; used when no backend is configured.
//! - **[`BuiltinExtractor`]** — native descriptive statistics and readability formulas.
//! - **[`HttpExtractor`]** — calls a remote metrics service with retry and backoff.
//! - **[`CommandExtractor`]** — runs a local program that speaks the same JSON protocol.
//!
//! # Wire Protocol
//!
//! The HTTP and command backends exchange the same JSON documents. Request:
//!
//! ```json
//! {
//!   "text": ["Hello, morning dew.", "The grass whispers low."],
//!   "lang": "en",
//!   "spacy_model": "en_core_web_sm",
//!   "spacy_model_size": "sm",
//!   "metrics": ["descriptive_stats", "readability"]
//! }
//! ```
//!
//! Response, one row per input text in input order:
//!
//! ```json
//! { "columns": ["text", "n_tokens"], "rows": [["Hello, morning dew.", 3], ["The grass whispers low.", 4]] }
//! ```
//!
//! # Provider Selection
//!
//! Use [`create_extractor`] to instantiate the extractor named by the
//! configuration:
//!
//! ```rust
//! # use tdesc::config::ExtractorConfig;
//! # use tdesc::metrics::create_extractor;
//! let config = ExtractorConfig::default(); // provider = "builtin"
//! let extractor = create_extractor(&config).unwrap();
//! assert_eq!(extractor.name(), "builtin");
//! ```

mod builtin;
mod command;
mod http;
pub mod text_stats;

pub use builtin::BuiltinExtractor;
pub use command::CommandExtractor;
pub use http::HttpExtractor;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ExtractorConfig;
use crate::models::ModelHandle;
use crate::options::MetricGroup;
use crate::table::{Cell, MetricsTable};

/// Inputs for one extraction call.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    /// Normalized text units; each becomes one row.
    pub units: &'a [String],
    pub model: &'a ModelHandle,
    pub metrics: &'a [MetricGroup],
}

/// A backend that turns text units into a table of metrics.
///
/// Implementations must return exactly one row per unit, in input order.
/// Unsupported language, model, or metric combinations are reported as
/// errors and propagate to the caller.
#[async_trait]
pub trait MetricsExtractor: Send + Sync {
    /// Provider identifier (e.g. `"builtin"`, `"http"`).
    fn name(&self) -> &str;

    async fn extract(&self, request: ExtractionRequest<'_>) -> Result<MetricsTable>;
}

// ============ Disabled ============

/// An extractor that always fails.
pub struct DisabledExtractor;

#[async_trait]
impl MetricsExtractor for DisabledExtractor {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn extract(&self, _request: ExtractionRequest<'_>) -> Result<MetricsTable> {
        bail!("Metrics extractor is disabled. Set [extractor].provider in the config.")
    }
}

// ============ Wire types ============

#[derive(Debug, Serialize)]
pub(crate) struct WireRequest<'a> {
    text: &'a [String],
    lang: &'a str,
    spacy_model: &'a str,
    spacy_model_size: &'a str,
    metrics: Vec<&'static str>,
}

impl<'a> WireRequest<'a> {
    pub(crate) fn new(request: &ExtractionRequest<'a>) -> Self {
        Self {
            text: request.units,
            lang: &request.model.language,
            spacy_model: &request.model.name,
            spacy_model_size: request.model.size.short(),
            metrics: request.metrics.iter().map(|m| m.as_str()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireResponse {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

/// Convert a backend response into a table, checking it has one row per unit.
pub(crate) fn parse_response(response: WireResponse, expected_rows: usize) -> Result<MetricsTable> {
    let table = MetricsTable::from_rows(response.columns, response.rows)?;
    if table.num_rows() != expected_rows {
        bail!(
            "Metrics backend returned {} rows for {} texts",
            table.num_rows(),
            expected_rows
        );
    }
    Ok(table)
}

/// Metric groups the named provider can compute.
///
/// Remote and command backends are assumed to run the full pipeline; the
/// builtin extractor covers only the model-free groups.
pub fn supported_metrics(provider: &str) -> Vec<MetricGroup> {
    match provider {
        "builtin" => MetricGroup::ALL
            .iter()
            .copied()
            .filter(|g| BuiltinExtractor::supports(*g))
            .collect(),
        _ => MetricGroup::ALL.to_vec(),
    }
}

/// Create the appropriate [`MetricsExtractor`] based on configuration.
///
/// | Config Value | Extractor |
/// |-------------|----------|
/// | `"disabled"` | [`DisabledExtractor`] |
/// | `"builtin"` | [`BuiltinExtractor`] |
/// | `"http"` | [`HttpExtractor`] |
/// | `"command"` | [`CommandExtractor`] |
pub fn create_extractor(config: &ExtractorConfig) -> Result<Box<dyn MetricsExtractor>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledExtractor)),
        "builtin" => Ok(Box::new(BuiltinExtractor)),
        "http" => Ok(Box::new(HttpExtractor::new(config)?)),
        "command" => Ok(Box::new(CommandExtractor::new(config)?)),
        other => bail!("Unknown extractor provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ModelSize;

    fn model() -> ModelHandle {
        ModelHandle {
            name: "en_core_web_sm".into(),
            language: "en".into(),
            size: ModelSize::Small,
        }
    }

    #[tokio::test]
    async fn test_disabled_extractor_errors() {
        let units = vec!["Hello.".to_string()];
        let model = model();
        let err = DisabledExtractor
            .extract(ExtractionRequest {
                units: &units,
                model: &model,
                metrics: &[MetricGroup::Readability],
            })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disabled"));
    }

    #[test]
    fn test_wire_request_shape() {
        let units = vec!["One.".to_string(), "Two.".to_string()];
        let model = model();
        let request = ExtractionRequest {
            units: &units,
            model: &model,
            metrics: &[MetricGroup::DescriptiveStats, MetricGroup::PosStats],
        };
        let json = serde_json::to_value(WireRequest::new(&request)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "text": ["One.", "Two."],
                "lang": "en",
                "spacy_model": "en_core_web_sm",
                "spacy_model_size": "sm",
                "metrics": ["descriptive_stats", "pos_stats"]
            })
        );
    }

    #[test]
    fn test_parse_response_checks_row_count() {
        let response: WireResponse = serde_json::from_value(serde_json::json!({
            "columns": ["text", "n_tokens"],
            "rows": [["One.", 1], ["Two.", null]]
        }))
        .unwrap();
        let table = parse_response(response, 2).unwrap();
        assert_eq!(table.rows()[1][1], Cell::Missing);

        let response: WireResponse = serde_json::from_value(serde_json::json!({
            "columns": ["text"],
            "rows": [["One."]]
        }))
        .unwrap();
        assert!(parse_response(response, 2).is_err());
    }

    #[test]
    fn test_supported_metrics_by_provider() {
        assert_eq!(
            supported_metrics("builtin"),
            vec![MetricGroup::DescriptiveStats, MetricGroup::Readability]
        );
        assert_eq!(supported_metrics("http").len(), MetricGroup::ALL.len());
        assert_eq!(supported_metrics("command").len(), MetricGroup::ALL.len());
    }

    #[test]
    fn test_create_extractor() {
        let mut config = ExtractorConfig::default();
        assert_eq!(create_extractor(&config).unwrap().name(), "builtin");
        config.provider = "disabled".into();
        assert_eq!(create_extractor(&config).unwrap().name(), "disabled");
        config.provider = "http".into();
        assert!(create_extractor(&config).is_err());
        config.url = Some("http://localhost:8000/extract".into());
        assert_eq!(create_extractor(&config).unwrap().name(), "http");
        config.provider = "nope".into();
        assert!(create_extractor(&config).is_err());
    }
}

//! Language-model resolution.
//!
//! Turning a (language, size) pair into a concrete, ready-to-use model is an
//! explicit collaborator rather than a hidden side effect of extraction.
//! [`CatalogModelProvider`] picks the model identifier from the catalog; a
//! provider that also downloads or warms the model can be injected through
//! [`crate::analyze::Analyzer::new`].

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::catalog::LanguageModelCatalog;
use crate::models::ModelHandle;
use crate::options::ModelSize;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Return a handle for `language` and `size`, or fail if no such model
    /// can be provided.
    async fn prepare(
        &self,
        catalog: &LanguageModelCatalog,
        language: &str,
        size: ModelSize,
    ) -> Result<ModelHandle>;
}

/// Resolves model identifiers from the catalog without loading anything.
///
/// When several pipelines exist for a pair (`en_core_web_sm`,
/// `en_ner_bc5cdr_sm`), the general-purpose `core` pipeline wins; otherwise
/// the first identifier in sort order is used.
pub struct CatalogModelProvider;

#[async_trait]
impl ModelProvider for CatalogModelProvider {
    async fn prepare(
        &self,
        catalog: &LanguageModelCatalog,
        language: &str,
        size: ModelSize,
    ) -> Result<ModelHandle> {
        let candidates = catalog.models(language, size.short());
        let name = candidates
            .iter()
            .find(|name| name.contains("_core_"))
            .or_else(|| candidates.first());

        match name {
            Some(name) => {
                tracing::debug!(model = %name, "resolved language model");
                Ok(ModelHandle {
                    name: name.to_string(),
                    language: language.to_string(),
                    size,
                })
            }
            None => bail!(
                "No {} model found for language '{}'",
                size.pretty(),
                language
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefers_core_pipeline() {
        let catalog = LanguageModelCatalog::from_model_names([
            "en_core_sci_sm",
            "en_core_web_sm",
            "en_ner_bc5cdr_sm",
        ]);
        // Both "core" names qualify; sort order decides between them.
        let handle = CatalogModelProvider
            .prepare(&catalog, "en", ModelSize::Small)
            .await
            .unwrap();
        assert_eq!(handle.name, "en_core_sci_sm");
        assert_eq!(handle.language, "en");
        assert_eq!(handle.size, ModelSize::Small);
    }

    #[tokio::test]
    async fn test_falls_back_to_first_model() {
        let catalog = LanguageModelCatalog::from_model_names(["xx_sent_ud_sm", "xx_ent_wiki_sm"]);
        let handle = CatalogModelProvider
            .prepare(&catalog, "xx", ModelSize::Small)
            .await
            .unwrap();
        assert_eq!(handle.name, "xx_ent_wiki_sm");
    }

    #[tokio::test]
    async fn test_missing_model_is_error() {
        let catalog = LanguageModelCatalog::from_model_names(["da_core_news_sm"]);
        let err = CatalogModelProvider
            .prepare(&catalog, "da", ModelSize::Transformer)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Transformer"));
    }
}

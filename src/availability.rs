//! Model availability per language.
//!
//! Intersects the sizes a [`LanguageModelCatalog`] lists for a language with
//! the whitelist of sizes offered to users. Pure: the catalog is passed in,
//! so results are deterministic for a given snapshot.

use crate::catalog::LanguageModelCatalog;
use crate::options::ModelSize;

/// Which language to resolve sizes for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageFilter {
    /// No filter: every whitelisted size.
    All,
    /// A short language code such as `"en"`.
    Code(String),
}

impl LanguageFilter {
    /// `"all"` (any case) means no filter; anything else is resolved through
    /// [`crate::options::language_code`].
    pub fn parse(selection: &str) -> Self {
        if selection.trim().eq_ignore_ascii_case("all") {
            LanguageFilter::All
        } else {
            LanguageFilter::Code(crate::options::language_code(selection))
        }
    }
}

/// Model sizes a user may pick for `filter`.
///
/// For [`LanguageFilter::All`] this is the whitelist in whitelist order. For a
/// language it is the whitelisted sizes the catalog lists, sorted by short
/// code (`lg`, `md`, `sm`). An unknown language yields an empty vector.
pub fn available_model_sizes(
    catalog: &LanguageModelCatalog,
    whitelist: &[ModelSize],
    filter: &LanguageFilter,
) -> Vec<ModelSize> {
    match filter {
        LanguageFilter::All => {
            let mut sizes = Vec::with_capacity(whitelist.len());
            for size in whitelist {
                if !sizes.contains(size) {
                    sizes.push(*size);
                }
            }
            sizes
        }
        LanguageFilter::Code(lang) => {
            let mut sizes: Vec<ModelSize> = catalog
                .sizes(lang)
                .into_iter()
                .filter_map(ModelSize::from_short)
                .filter(|size| whitelist.contains(size))
                .collect();
            sizes.sort_by_key(|size| size.short());
            sizes
        }
    }
}

/// Whether `size` may be used for `language`.
pub fn is_available(
    catalog: &LanguageModelCatalog,
    whitelist: &[ModelSize],
    language: &str,
    size: ModelSize,
) -> bool {
    available_model_sizes(catalog, whitelist, &LanguageFilter::Code(language.to_string()))
        .contains(&size)
}

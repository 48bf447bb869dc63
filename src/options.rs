//! Fixed option vocabularies: languages, model sizes, and metric groups.
//!
//! These tables back every selector in the CLI and HTTP API. Lookups accept
//! either the human-facing ("pretty") name or the short code used by the
//! metrics backend, so `"Danish"` and `"da"` resolve to the same language and
//! `"Small"` and `"sm"` to the same model size.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language options as `(pretty name, short code)`, ordered by pretty name.
pub const LANGUAGES: &[(&str, &str)] = &[
    ("Catalan", "ca"),
    ("Chinese", "zh"),
    ("Croatian", "hr"),
    ("Danish", "da"),
    ("Dutch", "nl"),
    ("English", "en"),
    ("Finnish", "fi"),
    ("French", "fr"),
    ("German", "de"),
    ("Greek", "el"),
    ("Italian", "it"),
    ("Japanese", "ja"),
    ("Korean", "ko"),
    ("Lithuanian", "lt"),
    ("Macedonian", "mk"),
    ("Norwegian Bokmål", "nb"),
    ("Polish", "pl"),
    ("Portuguese", "pt"),
    ("Romanian", "ro"),
    ("Russian", "ru"),
    ("Slovenian", "sl"),
    ("Spanish", "es"),
    ("Swedish", "sv"),
    ("Ukrainian", "uk"),
];

/// Language preselected when nothing else is configured.
pub const DEFAULT_LANGUAGE: &str = "English";

/// Resolve a language selection to its short code.
///
/// Pretty names match case-insensitively. Anything that is not a known pretty
/// name is treated as a short code and returned lowercased, so unknown codes
/// flow through to the availability check and come back as "not available"
/// rather than failing here.
pub fn language_code(selection: &str) -> String {
    let selection = selection.trim();
    LANGUAGES
        .iter()
        .find(|(pretty, _)| pretty.eq_ignore_ascii_case(selection))
        .map(|(_, short)| short.to_string())
        .unwrap_or_else(|| selection.to_lowercase())
}

/// Pretty name for a short language code, if it is one of [`LANGUAGES`].
pub fn language_name(code: &str) -> Option<&'static str> {
    LANGUAGES
        .iter()
        .find(|(_, short)| *short == code)
        .map(|(pretty, _)| *pretty)
}

/// Capacity tier of the underlying language-processing model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelSize {
    Small,
    Medium,
    Large,
    Transformer,
}

impl ModelSize {
    pub const ALL: [ModelSize; 4] = [
        ModelSize::Small,
        ModelSize::Medium,
        ModelSize::Large,
        ModelSize::Transformer,
    ];

    /// Short code used in model identifiers (`en_core_web_sm`).
    pub fn short(self) -> &'static str {
        match self {
            ModelSize::Small => "sm",
            ModelSize::Medium => "md",
            ModelSize::Large => "lg",
            ModelSize::Transformer => "trf",
        }
    }

    /// Human-facing label.
    pub fn pretty(self) -> &'static str {
        match self {
            ModelSize::Small => "Small",
            ModelSize::Medium => "Medium",
            ModelSize::Large => "Large",
            ModelSize::Transformer => "Transformer",
        }
    }

    /// Look up a size by its short code only.
    pub fn from_short(code: &str) -> Option<ModelSize> {
        ModelSize::ALL.into_iter().find(|s| s.short() == code)
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pretty())
    }
}

impl FromStr for ModelSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        ModelSize::ALL
            .into_iter()
            .find(|size| size.pretty().eq_ignore_ascii_case(s) || size.short() == s)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "unknown model size '{}'. Must be one of: Small (sm), Medium (md), Large (lg), Transformer (trf)",
                    s
                )
            })
    }
}

impl TryFrom<String> for ModelSize {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModelSize> for String {
    fn from(size: ModelSize) -> String {
        size.short().to_string()
    }
}

/// Sizes offered to users unless configuration says otherwise.
/// `Transformer` is deliberately left out.
pub const DEFAULT_MODEL_SIZES: [ModelSize; 3] =
    [ModelSize::Small, ModelSize::Medium, ModelSize::Large];

/// A named category of computed text statistics.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MetricGroup {
    DescriptiveStats,
    Readability,
    DependencyDistance,
    PosStats,
    Coherence,
    Quality,
}

impl MetricGroup {
    pub const ALL: [MetricGroup; 6] = [
        MetricGroup::DescriptiveStats,
        MetricGroup::Readability,
        MetricGroup::DependencyDistance,
        MetricGroup::PosStats,
        MetricGroup::Coherence,
        MetricGroup::Quality,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MetricGroup::DescriptiveStats => "descriptive_stats",
            MetricGroup::Readability => "readability",
            MetricGroup::DependencyDistance => "dependency_distance",
            MetricGroup::PosStats => "pos_stats",
            MetricGroup::Coherence => "coherence",
            MetricGroup::Quality => "quality",
        }
    }
}

impl fmt::Display for MetricGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricGroup {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match MetricGroup::ALL.into_iter().find(|m| m.as_str() == s.trim()) {
            Some(m) => Ok(m),
            None => bail!(
                "unknown metric group '{}'. Must be one of: {}",
                s,
                MetricGroup::ALL
                    .iter()
                    .map(|m| m.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_code_from_pretty_name() {
        assert_eq!(language_code("Danish"), "da");
        assert_eq!(language_code("english"), "en");
        assert_eq!(language_code("Norwegian Bokmål"), "nb");
    }

    #[test]
    fn test_language_code_passes_through_codes() {
        assert_eq!(language_code("da"), "da");
        assert_eq!(language_code("XX"), "xx");
    }

    #[test]
    fn test_default_language_is_english() {
        assert_eq!(language_code(DEFAULT_LANGUAGE), "en");
        assert_eq!(language_name("en"), Some("English"));
    }

    #[test]
    fn test_model_size_parses_pretty_and_short() {
        assert_eq!("Small".parse::<ModelSize>().unwrap(), ModelSize::Small);
        assert_eq!("lg".parse::<ModelSize>().unwrap(), ModelSize::Large);
        assert_eq!(
            "transformer".parse::<ModelSize>().unwrap(),
            ModelSize::Transformer
        );
        assert!("huge".parse::<ModelSize>().is_err());
    }

    #[test]
    fn test_model_size_pretty_short_lookup_is_bijective() {
        for size in ModelSize::ALL {
            assert_eq!(ModelSize::from_short(size.short()), Some(size));
            assert_eq!(size.pretty().parse::<ModelSize>().unwrap(), size);
        }
    }

    #[test]
    fn test_default_sizes_exclude_transformer() {
        assert!(!DEFAULT_MODEL_SIZES.contains(&ModelSize::Transformer));
    }

    #[test]
    fn test_metric_group_names() {
        assert_eq!(
            "dependency_distance".parse::<MetricGroup>().unwrap(),
            MetricGroup::DependencyDistance
        );
        assert!("sentiment".parse::<MetricGroup>().is_err());
        let json = serde_json::to_string(&MetricGroup::PosStats).unwrap();
        assert_eq!(json, "\"pos_stats\"");
    }
}

//! Native implementation of the `descriptive_stats` and `readability` groups.
//!
//! Works for any language written with whitespace-separated words and needs
//! no model download. Groups that require a parser (dependency distance,
//! part-of-speech proportions, coherence, quality) are rejected; use the
//! `http` or `command` provider for those.

use anyhow::{bail, Result};
use async_trait::async_trait;

use super::text_stats::{mean, median, std_dev, TextStats};
use super::{ExtractionRequest, MetricsExtractor};
use crate::options::MetricGroup;
use crate::table::{Cell, MetricsTable};

const DESCRIPTIVE_COLUMNS: [&str; 14] = [
    "token_length_mean",
    "token_length_median",
    "token_length_std",
    "sentence_length_mean",
    "sentence_length_median",
    "sentence_length_std",
    "syllables_per_token_mean",
    "syllables_per_token_median",
    "syllables_per_token_std",
    "n_tokens",
    "n_unique_tokens",
    "proportion_unique_tokens",
    "n_characters",
    "n_sentences",
];

const READABILITY_COLUMNS: [&str; 8] = [
    "flesch_reading_ease",
    "flesch_kincaid_grade",
    "smog",
    "gunning_fog",
    "automated_readability_index",
    "coleman_liau_index",
    "lix",
    "rix",
];

/// Extractor computing surface statistics in-process.
pub struct BuiltinExtractor;

impl BuiltinExtractor {
    pub fn supports(group: MetricGroup) -> bool {
        matches!(
            group,
            MetricGroup::DescriptiveStats | MetricGroup::Readability
        )
    }
}

#[async_trait]
impl MetricsExtractor for BuiltinExtractor {
    fn name(&self) -> &str {
        "builtin"
    }

    async fn extract(&self, request: ExtractionRequest<'_>) -> Result<MetricsTable> {
        if let Some(group) = request.metrics.iter().find(|g| !Self::supports(**g)) {
            bail!(
                "metric group '{}' is not supported by the builtin extractor; \
                 configure the http or command provider to compute it",
                group
            );
        }

        let descriptive = request.metrics.contains(&MetricGroup::DescriptiveStats);
        let readability = request.metrics.contains(&MetricGroup::Readability);

        let mut columns = vec!["text"];
        if descriptive {
            columns.extend(DESCRIPTIVE_COLUMNS);
        }
        if readability {
            columns.extend(READABILITY_COLUMNS);
        }

        let mut table = MetricsTable::new(columns);
        for unit in request.units {
            let stats = TextStats::from_text(unit);
            let mut row = vec![Cell::from(unit.as_str())];
            if descriptive {
                row.extend(descriptive_stats(&stats));
            }
            if readability {
                row.extend(readability_scores(&stats));
            }
            table.push_row(row)?;
        }

        tracing::debug!(
            model = %request.model.name,
            rows = table.num_rows(),
            "builtin extraction complete"
        );
        Ok(table)
    }
}

fn descriptive_stats(stats: &TextStats) -> Vec<Cell> {
    let token_lengths = stats.token_lengths();
    let sentence_lengths: Vec<f64> = stats.sentence_lengths.iter().map(|&n| n as f64).collect();
    let syllables: Vec<f64> = stats.syllables.iter().map(|&n| n as f64).collect();
    let n_tokens = stats.n_tokens() as f64;
    let n_unique = stats.n_unique_tokens() as f64;

    vec![
        Cell::number(mean(&token_lengths)),
        Cell::number(median(&token_lengths)),
        Cell::number(std_dev(&token_lengths)),
        Cell::number(mean(&sentence_lengths)),
        Cell::number(median(&sentence_lengths)),
        Cell::number(std_dev(&sentence_lengths)),
        Cell::number(mean(&syllables)),
        Cell::number(median(&syllables)),
        Cell::number(std_dev(&syllables)),
        Cell::number(n_tokens),
        Cell::number(n_unique),
        Cell::number(n_unique / n_tokens),
        Cell::number(stats.n_characters as f64),
        Cell::number(stats.n_sentences() as f64),
    ]
}

fn readability_scores(stats: &TextStats) -> Vec<Cell> {
    let words = stats.n_tokens() as f64;
    let sentences = stats.n_sentences() as f64;
    let syllables: f64 = stats.syllables.iter().sum::<usize>() as f64;
    let letters = stats.n_letters() as f64;
    let polysyllables = stats.n_polysyllables() as f64;
    let long_words = stats.n_long_words() as f64;

    // Divisions by zero produce NaN/inf, which Cell::number maps to missing.
    let asl = words / sentences;
    let asw = syllables / words;

    let smog = if stats.n_sentences() >= 3 {
        1.043 * (polysyllables * (30.0 / sentences)).sqrt() + 3.1291
    } else {
        f64::NAN
    };

    vec![
        Cell::number(206.835 - 1.015 * asl - 84.6 * asw),
        Cell::number(0.39 * asl + 11.8 * asw - 15.59),
        Cell::number(smog),
        Cell::number(0.4 * (asl + 100.0 * polysyllables / words)),
        Cell::number(4.71 * (letters / words) + 0.5 * asl - 21.43),
        Cell::number(0.0588 * (letters / words * 100.0) - 0.296 * (sentences / words * 100.0) - 15.8),
        Cell::number(asl + long_words * 100.0 / words),
        Cell::number(long_words / sentences),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelHandle;
    use crate::options::ModelSize;

    fn model() -> ModelHandle {
        ModelHandle {
            name: "en_core_web_sm".into(),
            language: "en".into(),
            size: ModelSize::Small,
        }
    }

    async fn run(units: &[&str], metrics: &[MetricGroup]) -> Result<MetricsTable> {
        let units: Vec<String> = units.iter().map(|s| s.to_string()).collect();
        let model = model();
        BuiltinExtractor
            .extract(ExtractionRequest {
                units: &units,
                model: &model,
                metrics,
            })
            .await
    }

    fn value(table: &MetricsTable, row: usize, column: &str) -> Option<f64> {
        let idx = table.column_index(column).unwrap();
        table.rows()[row][idx].as_f64()
    }

    #[tokio::test]
    async fn test_one_row_per_unit() {
        let table = run(&["One.", "Two words."], &[MetricGroup::DescriptiveStats])
            .await
            .unwrap();
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.columns()[0], "text");
        assert_eq!(table.columns().len(), 1 + DESCRIPTIVE_COLUMNS.len());
        assert_eq!(value(&table, 0, "n_tokens"), Some(1.0));
        assert_eq!(value(&table, 1, "n_tokens"), Some(2.0));
        assert_eq!(table.rows()[1][0].as_str(), Some("Two words."));
    }

    #[tokio::test]
    async fn test_descriptive_values() {
        let table = run(&["The cat sat. The cat ran."], &[MetricGroup::DescriptiveStats])
            .await
            .unwrap();
        assert_eq!(value(&table, 0, "n_sentences"), Some(2.0));
        assert_eq!(value(&table, 0, "n_unique_tokens"), Some(4.0));
        assert_eq!(value(&table, 0, "proportion_unique_tokens"), Some(4.0 / 6.0));
        assert_eq!(value(&table, 0, "token_length_mean"), Some(3.0));
        assert_eq!(value(&table, 0, "sentence_length_std"), Some(0.0));
    }

    #[tokio::test]
    async fn test_readability_values() {
        // 6 words, 2 sentences, 6 syllables.
        let table = run(&["The cat sat. The cat ran."], &[MetricGroup::Readability])
            .await
            .unwrap();
        let fre = value(&table, 0, "flesch_reading_ease").unwrap();
        assert!((fre - (206.835 - 1.015 * 3.0 - 84.6)).abs() < 1e-9);
        // Fewer than three sentences: SMOG undefined.
        assert_eq!(value(&table, 0, "smog"), None);
        assert_eq!(value(&table, 0, "rix"), Some(0.0));
    }

    #[tokio::test]
    async fn test_both_groups_column_order() {
        let table = run(
            &["Hello."],
            &[MetricGroup::Readability, MetricGroup::DescriptiveStats],
        )
        .await
        .unwrap();
        assert_eq!(table.columns()[1], "token_length_mean");
        assert_eq!(table.columns().last().unwrap(), "rix");
    }

    #[tokio::test]
    async fn test_unsupported_group_rejected() {
        let err = run(&["Hello."], &[MetricGroup::Coherence]).await.unwrap_err();
        assert!(err.to_string().contains("coherence"));
    }

    #[tokio::test]
    async fn test_punctuation_only_unit_has_missing_values() {
        let table = run(&["..."], &[MetricGroup::Readability]).await.unwrap();
        assert_eq!(value(&table, 0, "flesch_reading_ease"), None);
    }
}

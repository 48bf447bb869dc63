//! Option and catalog listings for `tdesc languages`, `tdesc sizes`,
//! `tdesc metrics`, and `tdesc catalog`.

use anyhow::Result;

use crate::analyze::{Analyzer, MODEL_SIZE_UNAVAILABLE_MESSAGE};
use crate::availability::LanguageFilter;
use crate::options::{self, MetricGroup, LANGUAGES};

pub fn list_languages() {
    println!("{:<20} CODE", "LANGUAGE");
    for (pretty, short) in LANGUAGES {
        let marker = if *pretty == options::DEFAULT_LANGUAGE {
            " (default)"
        } else {
            ""
        };
        println!("{:<20} {}{}", pretty, short, marker);
    }
}

pub fn list_metrics() {
    for group in MetricGroup::ALL {
        println!("{}", group);
    }
}

/// Print the sizes available for `selection` (a language or `all`).
pub async fn list_sizes(analyzer: &Analyzer, selection: &str) -> Result<()> {
    let filter = LanguageFilter::parse(selection);
    let sizes = analyzer.available_sizes(&filter).await?;

    if sizes.is_empty() {
        // No valid answer for this language; not a failure.
        println!("{}", MODEL_SIZE_UNAVAILABLE_MESSAGE);
        return Ok(());
    }

    println!("{:<12} CODE", "SIZE");
    for size in sizes {
        println!("{:<12} {}", size.pretty(), size.short());
    }
    Ok(())
}

/// Print the parsed catalog: one line per language with every size it lists.
/// Sizes outside the whitelist are shown in brackets.
pub async fn show_catalog(analyzer: &Analyzer) -> Result<()> {
    let catalog = analyzer.catalog().await?;

    println!("Catalog:   {}", analyzer.catalog_description());
    println!(
        "Offered:   {}",
        analyzer
            .whitelist()
            .iter()
            .map(|s| s.short())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Extractor: {}", analyzer.extractor_name());
    println!();

    if catalog.is_empty() {
        println!("No models listed.");
        return Ok(());
    }

    println!("{:<8} {:<20} SIZES", "CODE", "LANGUAGE");
    for lang in catalog.languages() {
        let sizes: Vec<String> = catalog
            .sizes(lang)
            .into_iter()
            .map(|code| {
                let offered = options::ModelSize::from_short(code)
                    .map(|s| analyzer.whitelist().contains(&s))
                    .unwrap_or(false);
                if offered {
                    code.to_string()
                } else {
                    format!("[{}]", code)
                }
            })
            .collect();
        println!(
            "{:<8} {:<20} {}",
            lang,
            options::language_name(lang).unwrap_or("-"),
            sizes.join(" ")
        );
    }
    Ok(())
}

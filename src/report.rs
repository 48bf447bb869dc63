//! `tdesc analyze`: gather input, run the analyzer, and write results.
//!
//! Results go to stdout as a transposed table (one row per metric, one column
//! per text unit), CSV, or JSON. `--output` additionally saves the
//! untransposed table as CSV, the same file the HTTP API offers for download.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::analyze::{AnalysisInput, AnalysisRequest, Analyzer};
use crate::config::Config;
use crate::models::Document;
use crate::options::MetricGroup;

/// File name used when results are saved into a directory.
pub const DEFAULT_CSV_NAME: &str = "text_metrics.csv";

/// Header of the first column in transposed output.
pub const METRIC_COLUMN: &str = "Metric";

const MAX_CELL_WIDTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

/// Command-line selections for one analysis. `None` and empty values fall
/// back to `[analysis]` in the configuration.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeOptions {
    pub files: Vec<PathBuf>,
    pub text: Option<String>,
    pub language: Option<String>,
    pub model_size: Option<String>,
    pub metrics: Vec<MetricGroup>,
    pub no_split: bool,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub no_transpose: bool,
}

pub async fn run_analyze(config: &Config, analyzer: &Analyzer, opts: AnalyzeOptions) -> Result<()> {
    let input = gather_input(&opts)?;
    let request = build_request(config, input, &opts);

    let report = analyzer
        .analyze(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    eprintln!(
        "Model: {}  Rows: {}",
        report.model.name,
        report.table.num_rows()
    );

    match opts.format {
        OutputFormat::Table => {
            if opts.no_transpose {
                print!("{}", report.table.render(MAX_CELL_WIDTH));
            } else {
                eprintln!("Note: the table has been transposed for readability.");
                print!(
                    "{}",
                    report.table.transpose(METRIC_COLUMN).render(MAX_CELL_WIDTH)
                );
            }
        }
        OutputFormat::Csv => {
            report.table.write_csv(std::io::stdout().lock())?;
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if let Some(output) = &opts.output {
        let path = csv_path(output);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        report.table.write_csv(file)?;
        eprintln!(
            "Saved {} rows to {}",
            report.table.num_rows(),
            path.display()
        );
    }

    Ok(())
}

/// Files first, then `--text`, then piped stdin. With none of them the
/// input is empty and the analyzer reports it as missing.
fn gather_input(opts: &AnalyzeOptions) -> Result<AnalysisInput> {
    if !opts.files.is_empty() {
        let documents = opts
            .files
            .iter()
            .map(|path| read_document(path))
            .collect::<Result<Vec<_>>>()?;
        return Ok(AnalysisInput::Files(documents));
    }

    if let Some(text) = &opts.text {
        return Ok(AnalysisInput::Text(text.clone()));
    }

    if atty::is(atty::Stream::Stdin) {
        return Ok(AnalysisInput::Text(String::new()));
    }
    let mut text = String::new();
    std::io::stdin()
        .lock()
        .read_to_string(&mut text)
        .with_context(|| "Failed to read text from stdin")?;
    Ok(AnalysisInput::Text(text))
}

fn read_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(Document::labelled(label, text))
}

fn build_request(config: &Config, input: AnalysisInput, opts: &AnalyzeOptions) -> AnalysisRequest {
    let mut request = AnalysisRequest::with_defaults(input, &config.analysis);
    if let Some(language) = &opts.language {
        request.language = language.clone();
    }
    if let Some(size) = &opts.model_size {
        request.model_size = size.clone();
    }
    if !opts.metrics.is_empty() {
        request.metrics = opts.metrics.clone();
    }
    if opts.no_split {
        request.split_by_line = false;
    }
    request
}

/// A directory gets the default file name appended.
fn csv_path(output: &Path) -> PathBuf {
    if output.is_dir() {
        output.join(DEFAULT_CSV_NAME)
    } else {
        output.to_path_buf()
    }
}

//! # tdesc CLI
//!
//! ## Usage
//!
//! ```bash
//! tdesc --config ./config/tdesc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tdesc analyze [FILES...]` | Compute metrics for text, files, or stdin |
//! | `tdesc languages` | List language options |
//! | `tdesc sizes [LANGUAGE]` | List model sizes available for a language |
//! | `tdesc metrics` | List metric groups |
//! | `tdesc catalog` | Show the parsed model catalog |
//! | `tdesc serve` | Start the JSON HTTP API |
//! | `tdesc completions <shell>` | Print shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # One row per line of a poem, shown transposed
//! tdesc analyze --text "$(cat poem.txt)" --metric descriptive_stats
//!
//! # Two files, one row each, saved as CSV
//! tdesc analyze a.txt b.txt --no-split --output text_metrics.csv
//!
//! # Danish sizes from the live catalog
//! tdesc sizes Danish
//! ```

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use tdesc::analyze::Analyzer;
use tdesc::options::MetricGroup;
use tdesc::report::{AnalyzeOptions, OutputFormat};
use tdesc::{config, listing, logging, report, server};

/// tdesc — descriptive statistics and readability metrics for text.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/tdesc.example.toml` for a full example. Without a file,
/// the remote spaCy catalog and the builtin extractor are used.
#[derive(Parser)]
#[command(
    name = "tdesc",
    about = "tdesc — descriptive statistics and readability metrics for text",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tdesc.toml")]
    config: PathBuf,

    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics for text.
    ///
    /// Input is taken from FILES (one labelled document each), else from
    /// `--text`, else from stdin when it is piped.
    Analyze {
        /// Plain-text files to analyze. Adds a leading `File` column.
        files: Vec<PathBuf>,

        /// Text to analyze.
        #[arg(long, short, conflicts_with = "files")]
        text: Option<String>,

        /// Language name or code (e.g. `Danish`, `da`).
        #[arg(long, short)]
        language: Option<String>,

        /// Model size name or code (e.g. `Small`, `sm`).
        #[arg(long, short = 's')]
        model_size: Option<String>,

        /// Metric group to compute; repeat for several. Defaults to the
        /// configured list.
        #[arg(long = "metric", short = 'm', value_enum)]
        metrics: Vec<MetricGroup>,

        /// Treat each input as a single unit instead of one per line.
        #[arg(long)]
        no_split: bool,

        /// Output format on stdout.
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Also save the results as CSV (a directory gets `text_metrics.csv`).
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print the table with one row per text unit.
        #[arg(long)]
        no_transpose: bool,
    },

    /// List language options.
    Languages,

    /// List model sizes available for a language.
    Sizes {
        /// Language name or code, or `all` for every offered size.
        #[arg(default_value = "all")]
        language: String,
    },

    /// List metric groups.
    Metrics,

    /// Show the model catalog: languages and the sizes each one lists.
    Catalog,

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,

    /// Print shell completions.
    Completions {
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    // Commands that don't require config
    match &cli.command {
        Commands::Languages => {
            listing::list_languages();
            return Ok(());
        }
        Commands::Metrics => {
            listing::list_metrics();
            return Ok(());
        }
        Commands::Completions { shell } => {
            clap_complete::generate(*shell, &mut Cli::command(), "tdesc", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let cfg = config::load_or_default(&cli.config)
        .with_context(|| format!("Invalid configuration in {}", cli.config.display()))?;

    match cli.command {
        Commands::Analyze {
            files,
            text,
            language,
            model_size,
            metrics,
            no_split,
            format,
            output,
            no_transpose,
        } => {
            let analyzer = Analyzer::from_config(&cfg)?;
            let opts = AnalyzeOptions {
                files,
                text,
                language,
                model_size,
                metrics,
                no_split,
                format,
                output,
                no_transpose,
            };
            report::run_analyze(&cfg, &analyzer, opts).await?;
        }
        Commands::Sizes { language } => {
            let analyzer = Analyzer::from_config(&cfg)?;
            listing::list_sizes(&analyzer, &language).await?;
        }
        Commands::Catalog => {
            let analyzer = Analyzer::from_config(&cfg)?;
            listing::show_catalog(&analyzer).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Languages | Commands::Metrics | Commands::Completions { .. } => {}
    }

    Ok(())
}

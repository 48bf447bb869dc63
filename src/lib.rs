//! # tdesc
//!
//! Text-metrics front-end: turns typed, piped, or uploaded text into a table
//! of descriptive statistics, readability scores, and other metric groups
//! computed by a pluggable extractor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌────────────┐   ┌──────────────┐
//! │ Text / files │──▶│ Normalizer │──▶│  Extractor    │
//! └─────────────┘   └────────────┘   │ builtin/http/ │
//!                                     │ command       │
//! ┌─────────────┐   ┌────────────┐   └──────┬───────┘
//! │  Catalog     │──▶│ Resolver   │──────────┤
//! │ remote/static│   │ lang→sizes │          ▼
//! └─────────────┘   └────────────┘   ┌──────────────┐
//!                                     │ Result table │──▶ CLI / HTTP / CSV
//!                                     └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tdesc sizes Danish                          # which model sizes exist
//! tdesc analyze --text "Hello.\nWorld."       # transposed table
//! tdesc analyze a.txt b.txt --format csv      # one row per line, File column
//! tdesc serve                                 # JSON API on 127.0.0.1:8501
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`options`] | Language, model size, and metric vocabularies |
//! | [`models`] | Core data types |
//! | [`normalize`] | Text → non-empty units |
//! | [`catalog`] | Model compatibility catalog and its sources |
//! | [`availability`] | Language → available model sizes |
//! | [`model_provider`] | (language, size) → model handle |
//! | [`metrics`] | Metrics extractor abstraction |
//! | [`table`] | Result table, concatenation, CSV |
//! | [`cache`] | Memoized extraction results |
//! | [`analyze`] | The analysis pipeline |
//! | [`report`] | `tdesc analyze` output |
//! | [`listing`] | Option and catalog listings |
//! | [`server`] | JSON HTTP API |
//! | [`logging`] | Tracing subscriber setup |

pub mod analyze;
pub mod availability;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod listing;
pub mod logging;
pub mod metrics;
pub mod model_provider;
pub mod models;
pub mod normalize;
pub mod options;
pub mod report;
pub mod server;
pub mod table;

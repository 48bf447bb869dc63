//! JSON HTTP API.
//!
//! Exposes the analyzer to browser front-ends and other services. All
//! handlers share one [`Analyzer`], so the fetched catalog and the result
//! cache are reused across requests.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/options` | Languages, offered model sizes, metric groups |
//! | `GET`  | `/languages/{lang}/model-sizes` | Model sizes available for a language (`all` for no filter) |
//! | `POST` | `/analyze` | Run an analysis, returning `{model, columns, rows}` |
//! | `POST` | `/analyze/csv` | Run an analysis, returning `text_metrics.csv` |
//! | `DELETE` | `/cache` | Drop memoized results |
//!
//! # Request Body
//!
//! ```json
//! {
//!   "text": "Hello, morning dew.\nThe grass whispers low.",
//!   "language": "English",
//!   "model_size": "Small",
//!   "metrics": ["descriptive_stats", "readability"],
//!   "split_by_line": true
//! }
//! ```
//!
//! Send `"files": [{"name": "a.txt", "text": "..."}]` instead of `text` to
//! get a leading `File` column. Omitted settings use `[analysis]` from the
//! configuration.
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "model_unavailable", "message": "Sorry! The chosen model size is not available in this language. Please try another." } }
//! ```
//!
//! Error codes: `bad_request` (400), `missing_input` (400),
//! `model_unavailable` (400), `catalog_unavailable` (502),
//! `extraction_failed` (502).

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::analyze::{AnalysisInput, AnalysisReport, AnalysisRequest, AnalyzeError, Analyzer};
use crate::availability::LanguageFilter;
use crate::config::{AnalysisConfig, Config};
use crate::models::Document;
use crate::options::{self, MetricGroup, ModelSize, LANGUAGES};
use crate::report::DEFAULT_CSV_NAME;

#[derive(Clone)]
struct AppState {
    analyzer: Arc<Analyzer>,
    defaults: Arc<AnalysisConfig>,
}

/// Starts the HTTP server with an analyzer built from `config`.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let analyzer = Analyzer::from_config(config)?;
    run_server_with_analyzer(config, Arc::new(analyzer)).await
}

/// Like [`run_server`], but serves a caller-supplied analyzer, e.g. one with
/// a custom [`crate::model_provider::ModelProvider`] or extractor.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use tdesc::analyze::Analyzer;
/// use tdesc::server::run_server_with_analyzer;
///
/// # async fn example(config: &tdesc::config::Config) -> anyhow::Result<()> {
/// let analyzer = Analyzer::from_config(config)?;
/// run_server_with_analyzer(config, Arc::new(analyzer)).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_analyzer(
    config: &Config,
    analyzer: Arc<Analyzer>,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(analyzer, config.analysis.clone());

    tracing::info!(bind = %bind_addr, "starting server");
    println!("tdesc server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// The API routes, without binding a listener.
pub fn router(analyzer: Arc<Analyzer>, defaults: AnalysisConfig) -> Router {
    let state = AppState {
        analyzer,
        defaults: Arc::new(defaults),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/options", get(handle_options))
        .route("/languages/{lang}/model-sizes", get(handle_model_sizes))
        .route("/analyze", post(handle_analyze))
        .route("/analyze/csv", post(handle_analyze_csv))
        .route("/cache", delete(handle_clear_cache))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn catalog_unavailable(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_GATEWAY,
        code: "catalog_unavailable",
        message: message.into(),
    }
}

impl From<AnalyzeError> for AppError {
    fn from(err: AnalyzeError) -> Self {
        let (status, code) = match &err {
            AnalyzeError::MissingInput(_) => (StatusCode::BAD_REQUEST, "missing_input"),
            AnalyzeError::UnknownModelSize(_) | AnalyzeError::ModelSizeUnavailable { .. } => {
                (StatusCode::BAD_REQUEST, "model_unavailable")
            }
            AnalyzeError::Catalog(_) => (StatusCode::BAD_GATEWAY, "catalog_unavailable"),
            AnalyzeError::Model(_) | AnalyzeError::Extraction(_) | AnalyzeError::Table(_) => {
                (StatusCode::BAD_GATEWAY, "extraction_failed")
            }
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "analysis failed");
        }
        AppError {
            status,
            code,
            message: err.user_message(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ GET /options ============

#[derive(Serialize)]
struct NamedOption {
    name: &'static str,
    code: &'static str,
}

impl From<ModelSize> for NamedOption {
    fn from(size: ModelSize) -> Self {
        NamedOption {
            name: size.pretty(),
            code: size.short(),
        }
    }
}

#[derive(Serialize)]
struct OptionsResponse {
    languages: Vec<NamedOption>,
    default_language: String,
    model_sizes: Vec<NamedOption>,
    metrics: Vec<MetricGroup>,
}

/// Handler for `GET /options`.
///
/// Lists everything a form needs for its selectors. `model_sizes` is the
/// unfiltered whitelist; narrow it per language with
/// `GET /languages/{lang}/model-sizes`.
async fn handle_options(State(state): State<AppState>) -> Json<OptionsResponse> {
    Json(OptionsResponse {
        languages: LANGUAGES
            .iter()
            .map(|&(name, code)| NamedOption { name, code })
            .collect(),
        default_language: state.defaults.language.clone(),
        model_sizes: state
            .analyzer
            .whitelist()
            .iter()
            .copied()
            .map(NamedOption::from)
            .collect(),
        metrics: MetricGroup::ALL.to_vec(),
    })
}

// ============ GET /languages/{lang}/model-sizes ============

#[derive(Serialize)]
struct ModelSizesResponse {
    language: String,
    sizes: Vec<NamedOption>,
}

/// Handler for `GET /languages/{lang}/model-sizes`.
///
/// An unknown language yields an empty list, not an error. A catalog that
/// cannot be fetched is a `502`.
async fn handle_model_sizes(
    State(state): State<AppState>,
    Path(lang): Path<String>,
) -> Result<Json<ModelSizesResponse>, AppError> {
    let filter = LanguageFilter::parse(&lang);
    let sizes = state
        .analyzer
        .available_sizes(&filter)
        .await
        .map_err(|e| catalog_unavailable(format!("{:#}", e)))?;

    let language = match &filter {
        LanguageFilter::All => "all".to_string(),
        LanguageFilter::Code(code) => code.clone(),
    };

    Ok(Json(ModelSizesResponse {
        language,
        sizes: sizes.into_iter().map(NamedOption::from).collect(),
    }))
}

// ============ POST /analyze ============

#[derive(Debug, Deserialize)]
struct AnalyzeBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    files: Option<Vec<Document>>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    model_size: Option<String>,
    #[serde(default)]
    metrics: Option<Vec<MetricGroup>>,
    #[serde(default)]
    split_by_line: Option<bool>,
}

impl AnalyzeBody {
    fn into_request(self, defaults: &AnalysisConfig) -> Result<AnalysisRequest, AppError> {
        let input = match (self.text, self.files) {
            (Some(_), Some(_)) => {
                return Err(bad_request("send either text or files, not both"));
            }
            (_, Some(files)) => AnalysisInput::Files(files),
            (text, None) => AnalysisInput::Text(text.unwrap_or_default()),
        };

        let mut request = AnalysisRequest::with_defaults(input, defaults);
        if let Some(language) = self.language {
            request.language = language;
        }
        if let Some(size) = self.model_size {
            request.model_size = size;
        }
        if let Some(metrics) = self.metrics {
            request.metrics = metrics;
        }
        if let Some(split) = self.split_by_line {
            request.split_by_line = split;
        }
        Ok(request)
    }
}

async fn run_analysis(
    state: &AppState,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<AnalysisReport, AppError> {
    let Json(body) = body.map_err(|e| bad_request(e.body_text()))?;
    let request = body.into_request(&state.defaults)?;
    tracing::debug!(
        language = %options::language_code(&request.language),
        model_size = %request.model_size,
        "analyze request"
    );
    Ok(state.analyzer.analyze(&request).await?)
}

async fn handle_analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Json<AnalysisReport>, AppError> {
    Ok(Json(run_analysis(&state, body).await?))
}

// ============ POST /analyze/csv ============

async fn handle_analyze_csv(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeBody>, JsonRejection>,
) -> Result<Response, AppError> {
    let report = run_analysis(&state, body).await?;
    let csv = report.table.to_csv_string().map_err(|e| AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal",
        message: e.to_string(),
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", DEFAULT_CSV_NAME),
            ),
        ],
        csv,
    )
        .into_response())
}

// ============ DELETE /cache ============

#[derive(Serialize)]
struct ClearCacheResponse {
    cleared: usize,
}

async fn handle_clear_cache(State(state): State<AppState>) -> Json<ClearCacheResponse> {
    let cleared = state.analyzer.clear_cache();
    tracing::info!(cleared, "result cache cleared");
    Json(ClearCacheResponse { cleared })
}

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::{parse_response, ExtractionRequest, MetricsExtractor, WireRequest, WireResponse};
use crate::config::ExtractorConfig;

/// Extractor backed by a remote metrics service.
///
/// POSTs the wire request to the configured URL. The service is expected to
/// download the requested model on first use.
///
/// Retry strategy:
/// - HTTP 429 or 5xx → retry with exponential backoff (1s, 2s, 4s, ...)
/// - HTTP 4xx (not 429) → fail immediately; the service rejected the
///   language, model, or metric combination
/// - Network error → retry
pub struct HttpExtractor {
    url: String,
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| anyhow::anyhow!("extractor.url required for http provider"))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            url,
            client,
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl MetricsExtractor for HttpExtractor {
    fn name(&self) -> &str {
        "http"
    }

    async fn extract(&self, request: ExtractionRequest<'_>) -> Result<crate::table::MetricsTable> {
        let body = WireRequest::new(&request);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tracing::warn!(attempt, ?delay, "retrying metrics request");
                tokio::time::sleep(delay).await;
            }

            let resp = self.client.post(&self.url).json(&body).send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let parsed: WireResponse = response.json().await?;
                        return parse_response(parsed, request.units.len());
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "Metrics service error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Metrics service error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Metrics request failed after retries")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelHandle;
    use crate::options::{MetricGroup, ModelSize};
    use crate::table::{Cell, MetricsTable};
    use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type StubState = (Arc<Vec<(StatusCode, Value)>>, Arc<AtomicUsize>);

    /// Serve `replies` in order on `POST /extract`, repeating the last one.
    async fn spawn_stub(replies: Vec<(StatusCode, Value)>) -> (String, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/extract", post(reply))
            .with_state((Arc::new(replies), hits.clone()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (format!("http://{}/extract", addr), hits)
    }

    async fn reply(
        State((replies, hits)): State<StubState>,
        Json(_body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let n = hits.fetch_add(1, Ordering::SeqCst);
        let (status, body) = replies[n.min(replies.len() - 1)].clone();
        (status, Json(body))
    }

    fn extractor(url: String, max_retries: u32) -> HttpExtractor {
        HttpExtractor::new(&ExtractorConfig {
            provider: "http".into(),
            url: Some(url),
            timeout_secs: 10,
            max_retries,
            ..ExtractorConfig::default()
        })
        .unwrap()
    }

    async fn run(extractor: &HttpExtractor, units: &[&str]) -> Result<MetricsTable> {
        let units: Vec<String> = units.iter().map(|s| s.to_string()).collect();
        let model = ModelHandle {
            name: "da_core_news_sm".into(),
            language: "da".into(),
            size: ModelSize::Small,
        };
        extractor
            .extract(ExtractionRequest {
                units: &units,
                model: &model,
                metrics: &[MetricGroup::Quality],
            })
            .await
    }

    fn quality_rows() -> Value {
        json!({
            "columns": ["text", "passed_quality_check"],
            "rows": [["Hej.", true]]
        })
    }

    #[test]
    fn test_requires_url() {
        let config = ExtractorConfig {
            provider: "http".into(),
            ..ExtractorConfig::default()
        };
        assert!(HttpExtractor::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_retries_server_error_then_succeeds() {
        let (url, hits) = spawn_stub(vec![
            (StatusCode::SERVICE_UNAVAILABLE, json!({"detail": "loading model"})),
            (StatusCode::OK, quality_rows()),
        ])
        .await;

        let table = run(&extractor(url, 1), &["Hej."]).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(table.rows()[0][1], Cell::Bool(true));
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let (url, hits) = spawn_stub(vec![(
            StatusCode::TOO_MANY_REQUESTS,
            json!({"detail": "slow down"}),
        )])
        .await;

        let err = run(&extractor(url, 1), &["Hej."]).await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert!(err.to_string().contains("429"), "{}", err);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let (url, hits) = spawn_stub(vec![(
            StatusCode::BAD_REQUEST,
            json!({"detail": "unsupported language"}),
        )])
        .await;

        let err = run(&extractor(url, 3), &["Hej."]).await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("400"), "{}", err);
        assert!(err.to_string().contains("unsupported language"), "{}", err);
    }

    #[tokio::test]
    async fn test_row_count_mismatch_is_error() {
        let (url, hits) = spawn_stub(vec![(StatusCode::OK, quality_rows())]).await;

        let err = run(&extractor(url, 3), &["Hej.", "Nej."]).await.unwrap_err();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(err.to_string().contains("1 rows for 2 texts"), "{}", err);
    }
}

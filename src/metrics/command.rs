use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::{parse_response, ExtractionRequest, MetricsExtractor, WireRequest, WireResponse};
use crate::config::ExtractorConfig;
use crate::table::MetricsTable;

/// Extractor that runs a local program per call.
///
/// The program receives the wire request as JSON on stdin and must print the
/// wire response as JSON on stdout. A non-zero exit status is an error whose
/// message carries the program's stderr.
pub struct CommandExtractor {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self> {
        let (program, args) = config
            .command
            .split_first()
            .ok_or_else(|| anyhow::anyhow!("extractor.command required for command provider"))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    async fn run(&self, input: Vec<u8>) -> Result<std::process::Output> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to execute metrics command '{}'", self.program))?;

        // Feed stdin from its own task so a program that writes output before
        // draining its input cannot block on a full pipe.
        let writer = child.stdin.take().map(|mut stdin| {
            tokio::spawn(async move {
                stdin.write_all(&input).await
                // Dropping stdin closes the pipe so the program sees EOF.
            })
        });

        let output = child.wait_with_output().await?;

        if let Some(writer) = writer {
            let written = writer
                .await
                .with_context(|| "metrics command stdin task failed")?;
            // A program that exits early reports through its status and stderr.
            if output.status.success() {
                written.with_context(|| "Failed to write request to metrics command")?;
            }
        }

        Ok(output)
    }
}

#[async_trait]
impl MetricsExtractor for CommandExtractor {
    fn name(&self) -> &str {
        "command"
    }

    async fn extract(&self, request: ExtractionRequest<'_>) -> Result<MetricsTable> {
        let input = serde_json::to_vec(&WireRequest::new(&request))?;

        let output = tokio::time::timeout(self.timeout, self.run(input))
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "metrics command timed out after {}s",
                    self.timeout.as_secs()
                )
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("metrics command failed ({}): {}", output.status, stderr.trim());
        }

        let parsed: WireResponse = serde_json::from_slice(&output.stdout)
            .with_context(|| "metrics command printed invalid JSON")?;
        parse_response(parsed, request.units.len())
    }
}

//! Best-effort completion webhook client.
//!
//! Thin reqwest wrapper: POSTs the completed job snapshot as JSON to the
//! submission's `callbackUrl`. Callers log failures and move on; a dead
//! webhook must never change a job's terminal status.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::orchestrator::types::{JobMetrics, JobStatus, TrainingJob};

#[derive(Debug, Clone)]
pub struct CallbackConfig {
    /// Per-request timeout. Default: 5s.
    pub timeout: Duration,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }
}

impl CallbackConfig {
    /// Load overrides from environment variables (if set).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("ORCH_CALLBACK_TIMEOUT_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                cfg.timeout = Duration::from_millis(ms);
            }
        }
        cfg
    }
}

/// Payload delivered to the webhook.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPayload<'a> {
    pub job_id: &'a str,
    pub status: JobStatus,
    pub model_id: Option<&'a str>,
    pub metrics: Option<&'a JobMetrics>,
}

pub struct CallbackClient {
    client: reqwest::Client,
    cfg: CallbackConfig,
}

impl CallbackClient {
    pub fn new(cfg: CallbackConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            cfg,
        }
    }

    /// POST the completion notification. One attempt, no retries; the job
    /// is already terminal by the time this runs.
    pub async fn notify_completion(&self, url: &str, job: &TrainingJob) -> Result<()> {
        let payload = CompletionPayload {
            job_id: &job.job_id,
            status: job.status,
            model_id: job.model_id.as_deref(),
            metrics: job.metrics.as_ref(),
        };

        let resp = self
            .client
            .post(url)
            .timeout(self.cfg.timeout)
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("callback POST to {url} failed"))?;

        if !resp.status().is_success() {
            anyhow::bail!("callback endpoint returned status {}", resp.status());
        }
        Ok(())
    }
}

//! Boundary payloads: the submission request, list filters, and the live
//! `JobSnapshot` broadcast over the watch channel.
//!
//! The API layer that fronts this crate speaks camelCase JSON, so every
//! wire-facing struct carries the rename.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use super::error::FieldError;
use super::types::{
    Architecture, CurriculumLevel, EnvConfig, JobStatus, ModelStatus, ModelType, TrainingJob,
};

// ─────────────────────────────────────────────────────────
// Submission
// ─────────────────────────────────────────────────────────

fn default_interval() -> String {
    "1h".to_string()
}

/// Training submission payload, as posted by the admin UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub model_type: ModelType,
    pub coins: Vec<String>,
    pub lookback_days: u32,
    #[serde(default = "default_interval")]
    pub interval: String,
    pub algorithm: String,
    #[serde(default)]
    pub architecture: Architecture,
    /// Legacy admin UI posts this as `tuneFlag`.
    #[serde(default, alias = "tuneFlag")]
    pub tune: bool,
    #[serde(default)]
    pub callback_url: Option<String>,
    /// Legacy admin UI posts this as `environmentConfig`.
    #[serde(default, alias = "environmentConfig")]
    pub environment: Option<EnvConfig>,
    #[serde(default)]
    pub risk_profile: Option<String>,
    #[serde(default)]
    pub dataset_version: Option<String>,
    #[serde(default)]
    pub curriculum_level: Option<CurriculumLevel>,
}

impl SubmitRequest {
    /// Field-level validation. Collects every offending field so the caller
    /// gets the full picture in one round trip. Runs before any mutation.
    pub fn validate(&self) -> Vec<FieldError> {
        let mut fields = Vec::new();

        if self.coins.is_empty() {
            fields.push(FieldError::new("coins", "at least one asset is required"));
        } else if self.coins.iter().any(|c| c.trim().is_empty()) {
            fields.push(FieldError::new("coins", "asset symbols must be non-empty"));
        }

        if !(1..=365).contains(&self.lookback_days) {
            fields.push(FieldError::new(
                "lookbackDays",
                format!("must be within [1, 365], got {}", self.lookback_days),
            ));
        }

        if self.algorithm.trim().is_empty() {
            fields.push(FieldError::new("algorithm", "algorithm is required"));
        }

        if !self.architecture.compatible_with(self.model_type) {
            fields.push(FieldError::new(
                "architecture",
                format!(
                    "{} architecture does not match model type {}",
                    self.architecture.kind(),
                    self.model_type.as_str()
                ),
            ));
        }

        if let Some(raw) = &self.callback_url {
            match Url::parse(raw) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                _ => fields.push(FieldError::new(
                    "callbackUrl",
                    "must be an absolute http(s) URL",
                )),
            }
        }

        fields
    }
}

// ─────────────────────────────────────────────────────────
// List filters
// ─────────────────────────────────────────────────────────

/// Filter for `list_jobs`. All fields are conjunctive; `active` selects on
/// terminality rather than one concrete status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub model_type: Option<ModelType>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelFilter {
    pub status: Option<ModelStatus>,
    pub model_type: Option<ModelType>,
}

// ─────────────────────────────────────────────────────────
// Live snapshot stream
// ─────────────────────────────────────────────────────────

/// Compact job snapshot pushed over the watch channel after every mutation.
/// The initial channel value is `idle()`; consumers skip empty job ids.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub job_id: String,
    pub status: JobStatus,
    pub current_stage: String,
    pub progress: u8,
    pub model_id: Option<String>,
    pub at: DateTime<Utc>,
}

impl JobSnapshot {
    pub fn of(job: &TrainingJob) -> Self {
        Self {
            job_id: job.job_id.clone(),
            status: job.status,
            current_stage: job.current_stage.clone(),
            progress: job.progress,
            model_id: job.model_id.clone(),
            at: Utc::now(),
        }
    }

    /// Placeholder before the first real broadcast.
    pub fn idle() -> Self {
        Self {
            job_id: String::new(),
            status: JobStatus::Pending,
            current_stage: String::new(),
            progress: 0,
            model_id: None,
            at: Utc::now(),
        }
    }
}

impl Default for JobSnapshot {
    fn default() -> Self {
        Self::idle()
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

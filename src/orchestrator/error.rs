//! Error taxonomy for the orchestrator and registry surfaces.
//!
//! Everything here is returned synchronously to the caller of a mutating
//! operation. Background stage failures never surface as errors; they turn
//! the job `Failed` instead (the progression loop must not crash the
//! process because one job died).

use serde::Serialize;
use thiserror::Error;

/// One offending submission field. Validation reports every bad field at
/// once, not just the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Job,
    Model,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Job => write!(f, "job"),
            EntityKind::Model => write!(f, "model"),
        }
    }
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("validation failed: {}", summarize(.fields))]
    Validation { fields: Vec<FieldError> },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("approval required for {action}")]
    ApprovalRequired { action: &'static str },

    #[error("invalid state: {message}")]
    State { message: String },
}

impl OrchestratorError {
    pub fn job_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Job,
            id: id.into(),
        }
    }

    pub fn model_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: EntityKind::Model,
            id: id.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }
}

fn summarize(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display_lists_every_field() {
        let err = OrchestratorError::Validation {
            fields: vec![
                FieldError::new("coins", "at least one asset is required"),
                FieldError::new("lookbackDays", "must be within [1, 365]"),
            ],
        };
        let text = err.to_string();
        assert!(text.contains("coins"));
        assert!(text.contains("lookbackDays"));
    }

    #[test]
    fn test_not_found_display() {
        let err = OrchestratorError::model_not_found("mdl-123");
        assert_eq!(err.to_string(), "model not found: mdl-123");
    }
}

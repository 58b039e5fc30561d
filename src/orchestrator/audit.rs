//! Append-only audit trail with actor attribution.
//!
//! Every mutating action on jobs and models lands here exactly once, in
//! insertion order. Entries are never updated or deleted; reads hand out
//! clones.

use parking_lot::Mutex;
use tracing::info;

use super::types::{AuditAction, AuditEntry};

#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        action: AuditAction,
        subject_ids: &[&str],
        actor: &str,
        detail: impl Into<String>,
    ) {
        let entry = AuditEntry {
            action,
            subject_ids: subject_ids.iter().map(|s| s.to_string()).collect(),
            actor: actor.to_string(),
            detail: detail.into(),
            at: chrono::Utc::now(),
        };
        info!(
            "📋 audit {} | subjects={} actor={}",
            entry.action.as_str(),
            entry.subject_ids.join(","),
            entry.actor,
        );
        self.entries.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

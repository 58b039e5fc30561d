//! Keyed entity storage for jobs and models.
//!
//! Plain maps with insertion-order listing, no internal locking: the
//! Orchestrator and ModelRegistry each wrap their store in a tokio `Mutex`
//! so invariant checks (single active job, single deployed model) and the
//! mutations they guard happen under one critical section. Nothing outside
//! those owners can reach the maps.

use std::collections::HashMap;

use super::messages::{JobFilter, ModelFilter};
use super::types::{Model, ModelStatus, ModelType, TrainingJob};

// ─────────────────────────────────────────────────────────
// JobStore
// ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct JobStore {
    jobs: HashMap<String, TrainingJob>,
    /// Insertion order, oldest first. Listing walks it in reverse.
    order: Vec<String>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: TrainingJob) {
        self.order.push(job.job_id.clone());
        self.jobs.insert(job.job_id.clone(), job);
    }

    pub fn get(&self, job_id: &str) -> Option<&TrainingJob> {
        self.jobs.get(job_id)
    }

    pub fn get_mut(&mut self, job_id: &str) -> Option<&mut TrainingJob> {
        self.jobs.get_mut(job_id)
    }

    /// The one job allowed to be non-terminal, if any.
    pub fn active_job(&self) -> Option<&TrainingJob> {
        self.jobs.values().find(|j| !j.status.is_terminal())
    }

    /// Newest first.
    pub fn list(&self, filter: &JobFilter) -> Vec<TrainingJob> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.jobs.get(id))
            .filter(|j| filter.status.map_or(true, |s| j.status == s))
            .filter(|j| filter.model_type.map_or(true, |t| j.model_type == t))
            .filter(|j| filter.active.map_or(true, |a| j.status.is_terminal() != a))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

// ─────────────────────────────────────────────────────────
// ModelStore
// ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct ModelStore {
    models: HashMap<String, Model>,
    order: Vec<String>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, model: Model) {
        self.order.push(model.model_id.clone());
        self.models.insert(model.model_id.clone(), model);
    }

    pub fn get(&self, model_id: &str) -> Option<&Model> {
        self.models.get(model_id)
    }

    pub fn get_mut(&mut self, model_id: &str) -> Option<&mut Model> {
        self.models.get_mut(model_id)
    }

    pub fn contains(&self, model_id: &str) -> bool {
        self.models.contains_key(model_id)
    }

    /// Id of the single deployed model, if any. The registry keeps the
    /// deployed-uniqueness invariant, so first match is the only match.
    pub fn deployed_id(&self) -> Option<String> {
        self.models
            .values()
            .find(|m| m.status == ModelStatus::Deployed)
            .map(|m| m.model_id.clone())
    }

    pub fn deployed(&self) -> Option<&Model> {
        self.models.values().find(|m| m.status == ModelStatus::Deployed)
    }

    /// Newest first.
    pub fn list(&self, filter: &ModelFilter) -> Vec<Model> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.models.get(id))
            .filter(|m| filter.status.map_or(true, |s| m.status == s))
            .filter(|m| filter.model_type.map_or(true, |t| m.model_type == t))
            .cloned()
            .collect()
    }

    pub fn count_by_type(&self, model_type: ModelType) -> usize {
        self.models
            .values()
            .filter(|m| m.model_type == model_type)
            .count()
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::messages::SubmitRequest;
    use crate::orchestrator::types::{Architecture, JobStatus, ModelType};

    fn job(model_type: ModelType) -> TrainingJob {
        TrainingJob::from_request(
            SubmitRequest {
                model_type,
                coins: vec!["BTC".into()],
                lookback_days: 30,
                interval: "1h".into(),
                algorithm: "PPO".into(),
                architecture: Architecture::Default,
                tune: false,
                callback_url: None,
                environment: None,
                risk_profile: None,
                dataset_version: None,
                curriculum_level: None,
            },
            "tester",
        )
    }

    #[test]
    fn test_active_job_detection() {
        let mut store = JobStore::new();
        assert!(store.active_job().is_none());

        let mut a = job(ModelType::Forecast);
        let id_a = a.job_id.clone();
        store.insert(a.clone());
        assert_eq!(store.active_job().map(|j| j.job_id.clone()), Some(id_a.clone()));

        a.cancel("tester");
        if let Some(slot) = store.get_mut(&id_a) {
            *slot = a;
        }
        assert!(store.active_job().is_none());
    }

    #[test]
    fn test_list_newest_first_with_filters() {
        let mut store = JobStore::new();
        let first = job(ModelType::Forecast);
        let second = job(ModelType::Sentiment);
        let first_id = first.job_id.clone();
        let second_id = second.job_id.clone();
        store.insert(first);
        store.insert(second);

        let all = store.list(&JobFilter::default());
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].job_id, second_id);
        assert_eq!(all[1].job_id, first_id);
        assert_eq!(store.len(), 2);
        assert!(!store.is_empty());

        let sentiment_only = store.list(&JobFilter {
            model_type: Some(ModelType::Sentiment),
            ..Default::default()
        });
        assert_eq!(sentiment_only.len(), 1);
        assert_eq!(sentiment_only[0].job_id, second_id);

        let pending = store.list(&JobFilter {
            status: Some(JobStatus::Pending),
            ..Default::default()
        });
        assert_eq!(pending.len(), 2);
    }

    #[test]
    fn test_active_filter() {
        let mut store = JobStore::new();
        let mut done = job(ModelType::Forecast);
        done.cancel("tester");
        store.insert(done);
        store.insert(job(ModelType::RlAgent));

        let active = store.list(&JobFilter {
            active: Some(true),
            ..Default::default()
        });
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].model_type, ModelType::RlAgent);

        let finished = store.list(&JobFilter {
            active: Some(false),
            ..Default::default()
        });
        assert_eq!(finished.len(), 1);
    }
}

//! Model registry: governs the trained/deployed/shadow/archived lifecycle.
//!
//! Single owner of the model map. Every mutation runs inside one `Mutex`
//! critical section so no concurrent deploy/rollback can observe an
//! intermediate state with zero or two deployed models, and every mutation
//! appends exactly one audit entry.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use super::audit::AuditLog;
use super::error::OrchestratorError;
use super::messages::ModelFilter;
use super::store::ModelStore;
use super::types::{
    new_model_id, AlgorithmInfo, AuditAction, Explainability, JobMetrics, Model, ModelStatus,
    TrainingJob,
};

// ─────────────────────────────────────────────────────────
// Report types
// ─────────────────────────────────────────────────────────

/// Both sides of a completed rollback.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackOutcome {
    pub from: Model,
    pub to: Model,
}

/// Report row for a model currently in shadow: its recorded performance
/// against the currently deployed baseline, if one exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadowTest {
    pub model_id: String,
    pub model_name: String,
    pub shadow_start: DateTime<Utc>,
    pub hours_elapsed: f64,
    pub candidate: JobMetrics,
    pub baseline: Option<JobMetrics>,
}

// ─────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────

pub struct ModelRegistry {
    models: Mutex<ModelStore>,
    audit: Arc<AuditLog>,
}

impl ModelRegistry {
    pub fn new(audit: Arc<AuditLog>) -> Self {
        Self {
            models: Mutex::new(ModelStore::new()),
            audit,
        }
    }

    // ─────────────────────────────────────────────────
    // Creation (orchestrator only)
    // ─────────────────────────────────────────────────

    /// Register the model produced by a completed job. Called exactly once
    /// per completed job; the model enters at `Trained`.
    pub async fn create_from_job(
        &self,
        job: &TrainingJob,
        metrics: &JobMetrics,
        actor: &str,
    ) -> Model {
        let model = {
            let mut store = self.models.lock().await;
            let version = format!("v{}", store.count_by_type(job.model_type) + 1);
            let model = Model {
                model_id: new_model_id(),
                name: format!(
                    "{}-{}",
                    job.model_type.as_str(),
                    job.coins.join("-").to_lowercase()
                ),
                version,
                model_type: job.model_type,
                status: ModelStatus::Trained,
                performance: metrics.clone(),
                algorithm_info: AlgorithmInfo {
                    algorithm: job.algorithm.clone(),
                    architecture: job.architecture.clone(),
                    tuned: job.tune,
                },
                experiment: job.experiment.clone(),
                risk_profile: job.risk_profile.clone(),
                explainability: Explainability {
                    method: "shap".to_string(),
                    top_features: top_features(&job.coins),
                },
                source_job_id: job.job_id.clone(),
                created_at: Utc::now(),
                deployed_at: None,
                shadow_start: None,
                shadow_end: None,
            };
            store.insert(model.clone());
            model
        };
        info!(
            "🏷️ model {} registered ({} {}) from job {}",
            model.model_id,
            model.name,
            model.version,
            job.job_id,
        );
        self.audit.record(
            AuditAction::ModelCreated,
            &[&model.model_id, &job.job_id],
            actor,
            format!("{} {}", model.name, model.version),
        );
        model
    }

    // ─────────────────────────────────────────────────
    // Deploy / promote
    // ─────────────────────────────────────────────────

    /// Deploy a model to production, archiving whichever model held the
    /// slot. Deploying a model in shadow ends its shadow window first.
    /// Archived models can only return through `rollback`.
    pub async fn deploy(
        &self,
        model_id: &str,
        approval: bool,
        actor: &str,
    ) -> Result<Model, OrchestratorError> {
        if !approval {
            return Err(OrchestratorError::ApprovalRequired { action: "deploy" });
        }

        let (deployed, archived_prev) = {
            let mut store = self.models.lock().await;
            let target = store
                .get(model_id)
                .ok_or_else(|| OrchestratorError::model_not_found(model_id))?;
            match target.status {
                ModelStatus::Deployed => {
                    return Err(OrchestratorError::conflict(format!(
                        "model {model_id} is already deployed"
                    )))
                }
                ModelStatus::Archived => {
                    return Err(OrchestratorError::state(format!(
                        "model {model_id} is archived; use rollback to restore it"
                    )))
                }
                ModelStatus::Trained | ModelStatus::Shadow => {}
            }

            // Check-then-act stays inside this lock: archive the incumbent
            // and seat the target as one atomic step.
            let mut archived_prev = None;
            if let Some(prev_id) = store.deployed_id() {
                if let Some(prev) = store.get_mut(&prev_id) {
                    prev.status = ModelStatus::Archived;
                    archived_prev = Some(prev_id);
                }
            }

            let now = Utc::now();
            let Some(target) = store.get_mut(model_id) else {
                return Err(OrchestratorError::model_not_found(model_id));
            };
            if target.status == ModelStatus::Shadow {
                target.shadow_end = Some(now);
            }
            target.status = ModelStatus::Deployed;
            target.deployed_at = Some(now);
            (target.clone(), archived_prev)
        };

        match &archived_prev {
            Some(prev) => info!("🚀 model {} deployed by {} (archived {})", model_id, actor, prev),
            None => info!("🚀 model {} deployed by {}", model_id, actor),
        }
        self.audit.record(
            AuditAction::ModelDeployed,
            &[model_id],
            actor,
            archived_prev
                .map(|p| format!("archived {p}"))
                .unwrap_or_default(),
        );
        Ok(deployed)
    }

    /// Alias kept for the legacy `promote` endpoint. Identical contract.
    pub async fn promote(
        &self,
        model_id: &str,
        approval: bool,
        actor: &str,
    ) -> Result<Model, OrchestratorError> {
        self.deploy(model_id, approval, actor).await
    }

    // ─────────────────────────────────────────────────
    // Rollback
    // ─────────────────────────────────────────────────

    /// Archive `from` and seat `to` as deployed. The only operation allowed
    /// to move a model out of `Archived`.
    pub async fn rollback(
        &self,
        from_id: &str,
        to_id: &str,
        approval: bool,
        actor: &str,
    ) -> Result<RollbackOutcome, OrchestratorError> {
        if !approval {
            return Err(OrchestratorError::ApprovalRequired { action: "rollback" });
        }
        if from_id == to_id {
            return Err(OrchestratorError::Validation {
                fields: vec![super::error::FieldError::new(
                    "toModelId",
                    "must differ from fromModelId",
                )],
            });
        }

        let outcome = {
            let mut store = self.models.lock().await;
            if !store.contains(from_id) {
                return Err(OrchestratorError::model_not_found(from_id));
            }
            if !store.contains(to_id) {
                return Err(OrchestratorError::model_not_found(to_id));
            }

            // Deployed-uniqueness: if some third model holds the slot,
            // archive it too before seating the rollback target.
            if let Some(dep_id) = store.deployed_id() {
                if dep_id != to_id && dep_id != from_id {
                    if let Some(dep) = store.get_mut(&dep_id) {
                        dep.status = ModelStatus::Archived;
                    }
                }
            }

            let Some(from) = store.get_mut(from_id) else {
                return Err(OrchestratorError::model_not_found(from_id));
            };
            from.status = ModelStatus::Archived;
            let from = from.clone();

            let Some(to) = store.get_mut(to_id) else {
                return Err(OrchestratorError::model_not_found(to_id));
            };
            to.status = ModelStatus::Deployed;
            to.deployed_at = Some(Utc::now());
            RollbackOutcome {
                from,
                to: to.clone(),
            }
        };

        info!("⏪ rollback {} -> {} by {}", from_id, to_id, actor);
        self.audit.record(
            AuditAction::ModelRolledBack,
            &[from_id, to_id],
            actor,
            format!("restored {to_id}"),
        );
        Ok(outcome)
    }

    // ─────────────────────────────────────────────────
    // Shadow testing
    // ─────────────────────────────────────────────────

    /// Start running a trained model against production traffic without
    /// influencing live decisions.
    pub async fn start_shadow(
        &self,
        model_id: &str,
        actor: &str,
    ) -> Result<Model, OrchestratorError> {
        let model = {
            let mut store = self.models.lock().await;
            let target = store
                .get(model_id)
                .ok_or_else(|| OrchestratorError::model_not_found(model_id))?;
            match target.status {
                ModelStatus::Shadow => {
                    return Err(OrchestratorError::conflict(format!(
                        "model {model_id} is already in shadow"
                    )))
                }
                ModelStatus::Deployed => {
                    return Err(OrchestratorError::state(format!(
                        "model {model_id} is deployed; shadow applies to trained models"
                    )))
                }
                ModelStatus::Archived => {
                    return Err(OrchestratorError::state(format!(
                        "model {model_id} is archived; use rollback to restore it"
                    )))
                }
                ModelStatus::Trained => {}
            }
            let Some(target) = store.get_mut(model_id) else {
                return Err(OrchestratorError::model_not_found(model_id));
            };
            target.status = ModelStatus::Shadow;
            target.shadow_start = Some(Utc::now());
            target.shadow_end = None;
            target.clone()
        };

        info!("👥 model {} entered shadow (by {})", model_id, actor);
        self.audit
            .record(AuditAction::ShadowStarted, &[model_id], actor, "");
        Ok(model)
    }

    pub async fn stop_shadow(
        &self,
        model_id: &str,
        actor: &str,
    ) -> Result<Model, OrchestratorError> {
        let model = {
            let mut store = self.models.lock().await;
            let target = store
                .get_mut(model_id)
                .ok_or_else(|| OrchestratorError::model_not_found(model_id))?;
            if target.status != ModelStatus::Shadow {
                return Err(OrchestratorError::state(format!(
                    "model {} is {}, not in shadow",
                    model_id,
                    target.status.as_str()
                )));
            }
            target.status = ModelStatus::Trained;
            target.shadow_end = Some(Utc::now());
            target.clone()
        };

        info!("👥 model {} left shadow (by {})", model_id, actor);
        self.audit
            .record(AuditAction::ShadowStopped, &[model_id], actor, "");
        Ok(model)
    }

    /// Comparison rows for every model currently in shadow.
    pub async fn shadow_tests(&self) -> Vec<ShadowTest> {
        let store = self.models.lock().await;
        let baseline = store.deployed().map(|m| m.performance.clone());
        let now = Utc::now();
        store
            .list(&ModelFilter {
                status: Some(ModelStatus::Shadow),
                model_type: None,
            })
            .into_iter()
            .filter_map(|m| {
                let start = m.shadow_start?;
                Some(ShadowTest {
                    model_id: m.model_id,
                    model_name: m.name,
                    shadow_start: start,
                    hours_elapsed: (now - start).num_seconds() as f64 / 3600.0,
                    candidate: m.performance,
                    baseline: baseline.clone(),
                })
            })
            .collect()
    }

    // ─────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────

    pub async fn get(&self, model_id: &str) -> Result<Model, OrchestratorError> {
        let store = self.models.lock().await;
        store
            .get(model_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::model_not_found(model_id))
    }

    pub async fn list_models(&self, filter: &ModelFilter) -> Vec<Model> {
        self.models.lock().await.list(filter)
    }

    pub async fn deployed(&self) -> Option<Model> {
        self.models.lock().await.deployed().cloned()
    }

    pub async fn count_deployed(&self) -> usize {
        self.models
            .lock()
            .await
            .list(&ModelFilter {
                status: Some(ModelStatus::Deployed),
                model_type: None,
            })
            .len()
    }
}

fn top_features(coins: &[String]) -> Vec<String> {
    let mut features: Vec<String> = coins
        .iter()
        .take(3)
        .map(|c| format!("{}_returns_1h", c.to_lowercase()))
        .collect();
    features.push("volatility_24h".to_string());
    features.push("funding_rate".to_string());
    features.push("orderbook_imbalance".to_string());
    features
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::messages::SubmitRequest;
    use crate::orchestrator::types::{Architecture, ModelType};

    fn make_registry() -> (Arc<AuditLog>, ModelRegistry) {
        let audit = Arc::new(AuditLog::new());
        let registry = ModelRegistry::new(audit.clone());
        (audit, registry)
    }

    fn job() -> TrainingJob {
        TrainingJob::from_request(
            SubmitRequest {
                model_type: ModelType::Forecast,
                coins: vec!["BTC".into()],
                lookback_days: 30,
                interval: "1h".into(),
                algorithm: "LightGBM".into(),
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

    fn metrics() -> JobMetrics {
        JobMetrics {
            win_ratio: 0.56,
            trades: 90,
            max_drawdown: 0.11,
            sharpe_ratio: 1.2,
            total_return_pct: 7.5,
        }
    }

    async fn trained_model(registry: &ModelRegistry) -> Model {
        registry.create_from_job(&job(), &metrics(), "orchestrator").await
    }

    #[tokio::test]
    async fn test_create_versions_increment_per_type() {
        let (_, registry) = make_registry();
        let m1 = trained_model(&registry).await;
        let m2 = trained_model(&registry).await;
        assert_eq!(m1.version, "v1");
        assert_eq!(m2.version, "v2");
        assert_eq!(m1.status, ModelStatus::Trained);
        assert!(m1.model_id.starts_with("mdl-"));
    }

    #[tokio::test]
    async fn test_deploy_requires_approval() {
        let (_, registry) = make_registry();
        let m = trained_model(&registry).await;
        let err = registry.deploy(&m.model_id, false, "alice").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::ApprovalRequired { .. }));
        // Registry unchanged
        let fetched = registry.get(&m.model_id).await.expect("model still there");
        assert_eq!(fetched.status, ModelStatus::Trained);
    }

    #[tokio::test]
    async fn test_deploy_unknown_model() {
        let (_, registry) = make_registry();
        let err = registry.deploy("mdl-missing", true, "alice").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_second_deploy_archives_first() {
        let (_, registry) = make_registry();
        let m1 = trained_model(&registry).await;
        let m2 = trained_model(&registry).await;

        registry.deploy(&m1.model_id, true, "alice").await.expect("deploy m1");
        registry.deploy(&m2.model_id, true, "alice").await.expect("deploy m2");

        let m1 = registry.get(&m1.model_id).await.expect("m1");
        let m2 = registry.get(&m2.model_id).await.expect("m2");
        assert_eq!(m1.status, ModelStatus::Archived);
        assert_eq!(m2.status, ModelStatus::Deployed);
        assert!(m2.deployed_at.is_some());
        assert_eq!(registry.count_deployed().await, 1);
    }

    #[tokio::test]
    async fn test_double_deploy_same_model_conflicts() {
        let (_, registry) = make_registry();
        let m = trained_model(&registry).await;
        registry.deploy(&m.model_id, true, "alice").await.expect("first deploy");
        let err = registry.deploy(&m.model_id, true, "alice").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Conflict { .. }));
        assert_eq!(registry.count_deployed().await, 1);
    }

    #[tokio::test]
    async fn test_archived_model_cannot_deploy_directly() {
        let (_, registry) = make_registry();
        let m1 = trained_model(&registry).await;
        let m2 = trained_model(&registry).await;
        registry.deploy(&m1.model_id, true, "alice").await.expect("deploy m1");
        registry.deploy(&m2.model_id, true, "alice").await.expect("deploy m2");

        // m1 is archived now; the only way back is rollback
        let err = registry.deploy(&m1.model_id, true, "alice").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::State { .. }));
    }

    #[tokio::test]
    async fn test_rollback_restores_archived_model() {
        let (_, registry) = make_registry();
        let m1 = trained_model(&registry).await;
        let m2 = trained_model(&registry).await;
        registry.deploy(&m1.model_id, true, "alice").await.expect("deploy m1");
        registry.deploy(&m2.model_id, true, "alice").await.expect("deploy m2");

        let out = registry
            .rollback(&m2.model_id, &m1.model_id, true, "carol")
            .await
            .expect("rollback");
        assert_eq!(out.from.status, ModelStatus::Archived);
        assert_eq!(out.to.status, ModelStatus::Deployed);
        assert_eq!(registry.count_deployed().await, 1);
    }

    #[tokio::test]
    async fn test_rollback_requires_approval_and_distinct_ids() {
        let (_, registry) = make_registry();
        let m = trained_model(&registry).await;

        let err = registry
            .rollback(&m.model_id, "mdl-other", false, "carol")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::ApprovalRequired { .. }));

        let err = registry
            .rollback(&m.model_id, &m.model_id, true, "carol")
            .await
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_shadow_lifecycle() {
        let (_, registry) = make_registry();
        let m = trained_model(&registry).await;

        let shadowed = registry.start_shadow(&m.model_id, "alice").await.expect("start");
        assert_eq!(shadowed.status, ModelStatus::Shadow);
        assert!(shadowed.shadow_start.is_some());

        let err = registry.start_shadow(&m.model_id, "alice").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::Conflict { .. }));

        let stopped = registry.stop_shadow(&m.model_id, "alice").await.expect("stop");
        assert_eq!(stopped.status, ModelStatus::Trained);
        assert!(stopped.shadow_end.is_some());

        let err = registry.stop_shadow(&m.model_id, "alice").await.unwrap_err();
        assert!(matches!(err, OrchestratorError::State { .. }));
    }

    #[tokio::test]
    async fn test_shadow_tests_compare_against_deployed() {
        let (_, registry) = make_registry();
        let live = trained_model(&registry).await;
        let candidate = trained_model(&registry).await;
        registry.deploy(&live.model_id, true, "alice").await.expect("deploy");
        registry.start_shadow(&candidate.model_id, "alice").await.expect("shadow");

        let tests = registry.shadow_tests().await;
        assert_eq!(tests.len(), 1);
        assert_eq!(tests[0].model_id, candidate.model_id);
        assert!(tests[0].baseline.is_some());
    }

    #[tokio::test]
    async fn test_every_mutation_appends_one_audit_entry() {
        let (audit, registry) = make_registry();
        let m1 = trained_model(&registry).await; // 1
        let m2 = trained_model(&registry).await; // 2
        registry.deploy(&m1.model_id, true, "alice").await.expect("deploy"); // 3
        registry.start_shadow(&m2.model_id, "bob").await.expect("shadow"); // 4
        registry.stop_shadow(&m2.model_id, "bob").await.expect("stop"); // 5
        registry
            .rollback(&m1.model_id, &m2.model_id, true, "carol")
            .await
            .expect("rollback"); // 6
        assert_eq!(audit.len(), 6);

        // Failed mutations leave no trace
        let _ = registry.deploy("mdl-missing", true, "alice").await;
        assert_eq!(audit.len(), 6);

        let entries = audit.entries();
        assert_eq!(entries[2].actor, "alice");
        assert_eq!(entries[5].action, AuditAction::ModelRolledBack);
    }

    #[tokio::test]
    async fn test_list_models_filters() {
        let (_, registry) = make_registry();
        let m1 = trained_model(&registry).await;
        let _m2 = trained_model(&registry).await;
        registry.deploy(&m1.model_id, true, "alice").await.expect("deploy");

        let deployed = registry
            .list_models(&ModelFilter {
                status: Some(ModelStatus::Deployed),
                model_type: None,
            })
            .await;
        assert_eq!(deployed.len(), 1);
        assert_eq!(deployed[0].model_id, m1.model_id);

        let all = registry.list_models(&ModelFilter::default()).await;
        assert_eq!(all.len(), 2);
    }
}

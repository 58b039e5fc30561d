//! Orchestrator: the single entry point for training-job mutations.
//!
//! Submission validates, takes the job lock, checks the single-active-job
//! invariant and inserts in one critical section, then spawns a background
//! progression task. The task walks the stage pipeline one tick at a time,
//! re-checking cancellation before every transition, and broadcasts a
//! `JobSnapshot` over a watch channel after each mutation. The progression
//! task never panics outward: a failing stage turns the job `Failed` and
//! frees the active slot.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};

use crate::callback::CallbackClient;

use super::audit::AuditLog;
use super::curriculum;
use super::error::OrchestratorError;
use super::messages::{JobFilter, JobSnapshot, SubmitRequest};
use super::registry::ModelRegistry;
use super::runner::StageRunner;
use super::store::JobStore;
use super::types::{AuditAction, Stage, TrainingJob};

// ─────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Actor recorded for orchestrator-internal mutations (completion,
    /// failure, model creation). Default: "orchestrator".
    pub system_actor: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            system_actor: "orchestrator".to_string(),
        }
    }
}

impl OrchestratorConfig {
    /// Load overrides from environment variables (if set).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("ORCH_SYSTEM_ACTOR") {
            if !v.is_empty() {
                cfg.system_actor = v;
            }
        }
        cfg
    }
}

// ─────────────────────────────────────────────────────────
// Orchestrator
// ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Orchestrator {
    cfg: OrchestratorConfig,
    jobs: Arc<Mutex<JobStore>>,
    registry: Arc<ModelRegistry>,
    audit: Arc<AuditLog>,
    runner: Arc<dyn StageRunner>,
    callback: Arc<CallbackClient>,
    snapshot_tx: Arc<watch::Sender<JobSnapshot>>,
}

impl Orchestrator {
    pub fn new(
        cfg: OrchestratorConfig,
        runner: Arc<dyn StageRunner>,
        registry: Arc<ModelRegistry>,
        audit: Arc<AuditLog>,
        callback: CallbackClient,
    ) -> Self {
        let (snapshot_tx, _) = watch::channel(JobSnapshot::idle());
        Self {
            cfg,
            jobs: Arc::new(Mutex::new(JobStore::new())),
            registry,
            audit,
            runner,
            callback: Arc::new(callback),
            snapshot_tx: Arc::new(snapshot_tx),
        }
    }

    /// Live snapshot stream. A fresh receiver immediately sees the latest
    /// broadcast; consumers skip the idle placeholder (empty job id).
    pub fn subscribe(&self) -> watch::Receiver<JobSnapshot> {
        self.snapshot_tx.subscribe()
    }

    // ─────────────────────────────────────────────────
    // Submission surface
    // ─────────────────────────────────────────────────

    /// Validate and accept a training job. Returns the pending job
    /// immediately; stage progression runs on a spawned task.
    pub async fn submit(
        &self,
        req: SubmitRequest,
        actor: &str,
    ) -> Result<TrainingJob, OrchestratorError> {
        let fields = req.validate();
        if !fields.is_empty() {
            return Err(OrchestratorError::Validation { fields });
        }

        // Active-job check and insert share one critical section: two
        // concurrent submits must never both observe "no active job".
        let job = {
            let mut store = self.jobs.lock().await;
            if let Some(active) = store.active_job() {
                return Err(OrchestratorError::conflict(format!(
                    "job {} is still active ({})",
                    active.job_id,
                    active.status.as_str()
                )));
            }
            let job = TrainingJob::from_request(req, actor);
            store.insert(job.clone());
            job
        };

        info!(
            "🧪 job {} submitted | type={} coins={} lookback={}d level={} by={}",
            job.job_id,
            job.model_type.as_str(),
            job.coins.join(","),
            job.lookback_days,
            job.curriculum_level.as_str(),
            actor,
        );
        self.audit.record(
            AuditAction::JobSubmitted,
            &[&job.job_id],
            actor,
            format!("{} on {}", job.model_type.as_str(), job.coins.join(",")),
        );
        self.broadcast(&job);
        self.spawn_progression(job.job_id.clone());
        Ok(job)
    }

    /// Cooperative cancellation. Takes effect before the next stage
    /// transition; a stage execution unit already in flight finishes and its
    /// result is discarded.
    pub async fn cancel(
        &self,
        job_id: &str,
        actor: &str,
    ) -> Result<TrainingJob, OrchestratorError> {
        let cancelled = {
            let mut store = self.jobs.lock().await;
            let job = store
                .get_mut(job_id)
                .ok_or_else(|| OrchestratorError::job_not_found(job_id))?;
            if job.status.is_terminal() {
                return Err(OrchestratorError::state(format!(
                    "job {} is already {}",
                    job_id,
                    job.status.as_str()
                )));
            }
            job.cancel(actor);
            job.clone()
        };

        info!("🛑 job {} cancelled by {}", job_id, actor);
        self.audit
            .record(AuditAction::JobCancelled, &[job_id], actor, "");
        self.broadcast(&cancelled);
        Ok(cancelled)
    }

    pub async fn get_status(&self, job_id: &str) -> Result<TrainingJob, OrchestratorError> {
        let store = self.jobs.lock().await;
        store
            .get(job_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::job_not_found(job_id))
    }

    pub async fn list_jobs(&self, filter: &JobFilter) -> Vec<TrainingJob> {
        self.jobs.lock().await.list(filter)
    }

    // ─────────────────────────────────────────────────
    // Background progression
    // ─────────────────────────────────────────────────

    fn spawn_progression(&self, job_id: String) {
        let this = self.clone();
        tokio::spawn(async move {
            this.run_pipeline(job_id).await;
        });
    }

    async fn run_pipeline(&self, job_id: String) {
        let pipeline = {
            let store = self.jobs.lock().await;
            match store.get(&job_id) {
                Some(job) => Stage::pipeline(job.model_type),
                None => return,
            }
        };

        for stage in pipeline {
            // Re-check status before every transition; a cancel observed
            // here ends the loop without touching the terminal job.
            let running = {
                let mut store = self.jobs.lock().await;
                let Some(job) = store.get_mut(&job_id) else { return };
                if job.status.is_terminal() {
                    return;
                }
                job.begin_stage(stage);
                job.clone()
            };
            self.broadcast(&running);

            let started = Instant::now();
            let result = self.runner.run_stage(&running, stage).await;
            let elapsed_secs = started.elapsed().as_secs_f64();

            match result {
                Ok(outcome) => {
                    let updated = {
                        let mut store = self.jobs.lock().await;
                        let Some(job) = store.get_mut(&job_id) else { return };
                        if job.status.is_terminal() {
                            // Cancelled while the stage was in flight:
                            // discard the outcome.
                            return;
                        }
                        job.complete_stage(stage, elapsed_secs, &outcome);
                        if stage == Stage::RlTraining {
                            if let Some(measured) = &outcome.metrics {
                                let decision =
                                    curriculum::evaluate(job.curriculum_level, measured);
                                job.apply_gate(measured, &decision);
                                if decision.target_met {
                                    info!(
                                        "🎓 job {} met the {} curriculum target (next: {})",
                                        job_id,
                                        job.curriculum_level.as_str(),
                                        decision
                                            .next_level
                                            .map(|l| l.as_str())
                                            .unwrap_or("final tier"),
                                    );
                                }
                            }
                        }
                        job.clone()
                    };
                    self.broadcast(&updated);
                }
                Err(err) => {
                    self.fail_job(&job_id, stage, &err).await;
                    return;
                }
            }
        }

        self.finalize(&job_id).await;
    }

    async fn fail_job(&self, job_id: &str, stage: Stage, err: &anyhow::Error) {
        let failed = {
            let mut store = self.jobs.lock().await;
            let Some(job) = store.get_mut(job_id) else { return };
            if job.status.is_terminal() {
                return;
            }
            job.fail(stage, &format!("{err:#}"));
            job.clone()
        };

        error!("💥 job {} failed during {} | {err:#}", job_id, stage.as_str());
        self.audit.record(
            AuditAction::JobFailed,
            &[job_id],
            &self.cfg.system_actor,
            format!("stage {}: {err:#}", stage.as_str()),
        );
        self.broadcast(&failed);
    }

    /// Terminal success: register the model and mark the job completed. The
    /// job lock is held across both writes so a concurrent cancel cannot
    /// land between the terminality check and the completion write; a
    /// cancelled job can therefore never gain a model.
    async fn finalize(&self, job_id: &str) {
        let (done, model) = {
            let mut store = self.jobs.lock().await;
            let Some(job) = store.get_mut(job_id) else { return };
            if job.status.is_terminal() {
                return;
            }
            let metrics = job.metrics.clone().unwrap_or_default();
            let model = self
                .registry
                .create_from_job(job, &metrics, &self.cfg.system_actor)
                .await;
            job.complete(&model.model_id);
            (job.clone(), model)
        };

        info!(
            "✅ job {} completed -> model {} ({} {})",
            job_id, model.model_id, model.name, model.version,
        );
        self.audit.record(
            AuditAction::JobCompleted,
            &[job_id, &model.model_id],
            &self.cfg.system_actor,
            format!("registered {} {}", model.name, model.version),
        );
        self.broadcast(&done);

        if let Some(url) = done.callback_url.clone() {
            if let Err(err) = self.callback.notify_completion(&url, &done).await {
                warn!(
                    "📡 completion callback to {} failed (job stays completed): {err:#}",
                    url,
                );
            }
        }
    }

    fn broadcast(&self, job: &TrainingJob) {
        let _ = self.snapshot_tx.send(JobSnapshot::of(job));
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

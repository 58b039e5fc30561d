//! Domain types for the training-job / model-lifecycle state machines.
//!
//! `TrainingJob` moves through a linear stage pipeline and becomes immutable
//! once terminal. `Model` is created exactly once per completed job and then
//! only mutated through the registry. Both carry full serde derives because
//! the admin product's API is camelCase JSON.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::curriculum::GateDecision;
use super::runner::StageOutcome;

// ─────────────────────────────────────────────────────────
// Model type & job status
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Forecast,
    RlAgent,
    Sentiment,
    Ensemble,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Forecast => "forecast",
            ModelType::RlAgent => "rl_agent",
            ModelType::Sentiment => "sentiment",
            ModelType::Ensemble => "ensemble",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    DataPrep,
    Forecasting,
    RlTraining,
    Backtesting,
    Validation,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::DataPrep => "data_prep",
            JobStatus::Forecasting => "forecasting",
            JobStatus::RlTraining => "rl_training",
            JobStatus::Backtesting => "backtesting",
            JobStatus::Validation => "validation",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal jobs free the single-active-job slot and are never mutated again.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

// ─────────────────────────────────────────────────────────
// Pipeline stages
// ─────────────────────────────────────────────────────────

/// One ordered phase of the training pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DataPrep,
    Forecasting,
    RlTraining,
    Backtesting,
    Validation,
}

/// Pipeline order. Forecasting is dropped for sentiment jobs in `pipeline()`.
pub const STAGE_ORDER: [Stage; 5] = [
    Stage::DataPrep,
    Stage::Forecasting,
    Stage::RlTraining,
    Stage::Backtesting,
    Stage::Validation,
];

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::DataPrep => "data_prep",
            Stage::Forecasting => "forecasting",
            Stage::RlTraining => "rl_training",
            Stage::Backtesting => "backtesting",
            Stage::Validation => "validation",
        }
    }

    /// Human label shown in the admin UI's `currentStage` column.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::DataPrep => "Data Preparation",
            Stage::Forecasting => "Forecasting",
            Stage::RlTraining => "RL Training",
            Stage::Backtesting => "Backtesting",
            Stage::Validation => "Validation",
        }
    }

    /// Job status while this stage is running.
    pub fn status(&self) -> JobStatus {
        match self {
            Stage::DataPrep => JobStatus::DataPrep,
            Stage::Forecasting => JobStatus::Forecasting,
            Stage::RlTraining => JobStatus::RlTraining,
            Stage::Backtesting => JobStatus::Backtesting,
            Stage::Validation => JobStatus::Validation,
        }
    }

    /// Fixed contribution of this stage to overall job progress.
    /// data_prep 15, forecasting 20, rl_training 30, backtesting 20,
    /// validation 15. Progress is normalized over the stages actually in the
    /// pipeline, so sentiment jobs (no forecasting) still end at 100.
    pub fn weight(&self) -> u32 {
        match self {
            Stage::DataPrep => 15,
            Stage::Forecasting => 20,
            Stage::RlTraining => 30,
            Stage::Backtesting => 20,
            Stage::Validation => 15,
        }
    }

    /// Ordered pipeline for a model type. Sentiment models have no price
    /// forecaster to fit, so that stage is skipped entirely.
    pub fn pipeline(model_type: ModelType) -> Vec<Stage> {
        STAGE_ORDER
            .iter()
            .copied()
            .filter(|s| !(*s == Stage::Forecasting && model_type == ModelType::Sentiment))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Completed,
    Skipped,
}

/// Per-stage slot on a job: what the admin UI renders as the pipeline strip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageState {
    pub stage: Stage,
    pub status: StageStatus,
    pub progress: u8,
    pub duration_secs: Option<f64>,
}

// ─────────────────────────────────────────────────────────
// Curriculum
// ─────────────────────────────────────────────────────────

/// Difficulty tier an RL job is expected to progress through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurriculumLevel {
    Simple,
    Volatile,
    MultiAsset,
}

impl CurriculumLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CurriculumLevel::Simple => "simple",
            CurriculumLevel::Volatile => "volatile",
            CurriculumLevel::MultiAsset => "multi_asset",
        }
    }

    /// Catalog successor. MultiAsset is the final tier.
    pub fn next(&self) -> Option<CurriculumLevel> {
        match self {
            CurriculumLevel::Simple => Some(CurriculumLevel::Volatile),
            CurriculumLevel::Volatile => Some(CurriculumLevel::MultiAsset),
            CurriculumLevel::MultiAsset => None,
        }
    }
}

/// Advancement thresholds for one curriculum level. Read-only catalog data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumCriteria {
    pub win_ratio: f64,
    pub min_trades: u32,
    pub max_drawdown: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sharpe_ratio: Option<f64>,
}

/// Measured-vs-target snapshot written onto the job during rl_training.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriteriaStatus {
    pub target: CurriculumCriteria,
    pub measured_win_ratio: f64,
    pub measured_trades: u32,
    pub measured_drawdown: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerHint {
    pub next_level: Option<CurriculumLevel>,
}

/// Curriculum sub-state on a job. Advisory: the gate sets `criteria.passed`
/// and `scheduler.next_level`, and the level is only ever advanced by the
/// caller of the next submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurriculumState {
    pub level: CurriculumLevel,
    pub criteria: CriteriaStatus,
    pub scheduler: SchedulerHint,
}

// ─────────────────────────────────────────────────────────
// Architecture (tagged union keyed by model type)
// ─────────────────────────────────────────────────────────

/// Typed architecture config, validated once at the submission boundary.
/// `Default` is accepted for every model type: the admin UI omits the block
/// and stage runners fall back to built-in defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Architecture {
    Forecast { encoder: String, horizon_steps: u32 },
    RlAgent { policy: String, gamma: f64, buffer_size: u32 },
    Sentiment { base_model: String, max_seq_len: u32 },
    Default,
}

impl Default for Architecture {
    fn default() -> Self {
        Architecture::Default
    }
}

impl Architecture {
    pub fn kind(&self) -> &'static str {
        match self {
            Architecture::Forecast { .. } => "forecast",
            Architecture::RlAgent { .. } => "rl_agent",
            Architecture::Sentiment { .. } => "sentiment",
            Architecture::Default => "default",
        }
    }

    /// Which model types a non-default variant may be submitted with.
    /// Ensemble jobs combine a forecaster and an RL policy, so both of those
    /// variants are accepted for them.
    pub fn compatible_with(&self, model_type: ModelType) -> bool {
        match self {
            Architecture::Default => true,
            Architecture::Forecast { .. } => {
                matches!(model_type, ModelType::Forecast | ModelType::Ensemble)
            }
            Architecture::RlAgent { .. } => {
                matches!(model_type, ModelType::RlAgent | ModelType::Ensemble)
            }
            Architecture::Sentiment { .. } => matches!(model_type, ModelType::Sentiment),
        }
    }
}

/// Execution environment knobs forwarded to stage runners.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvConfig {
    pub gpu: bool,
    pub workers: u32,
    pub seed: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Metrics, logs, experiment tracking
// ─────────────────────────────────────────────────────────

/// Performance snapshot. Produced by stage runners, carried on jobs and
/// frozen onto the model at creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMetrics {
    pub win_ratio: f64,
    pub trades: u32,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub total_return_pct: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

/// One append-only job log line. Never reordered or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobLogLine {
    pub at: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentInfo {
    pub experiment_id: String,
    pub run_id: String,
}

impl ExperimentInfo {
    fn generate() -> Self {
        Self {
            experiment_id: format!("exp-{}", short_id()),
            run_id: format!("run-{}", short_id()),
        }
    }
}

// ─────────────────────────────────────────────────────────
// TrainingJob
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingJob {
    pub job_id: String,
    pub model_type: ModelType,
    pub coins: Vec<String>,
    pub lookback_days: u32,
    pub interval: String,
    pub algorithm: String,
    pub architecture: Architecture,
    pub tune: bool,
    pub risk_profile: Option<String>,
    pub dataset_version: Option<String>,
    pub curriculum_level: CurriculumLevel,
    pub status: JobStatus,
    pub current_stage: String,
    pub progress: u8,
    pub stages: Vec<StageState>,
    pub logs: Vec<JobLogLine>,
    pub metrics: Option<JobMetrics>,
    pub experiment: ExperimentInfo,
    pub curriculum: Option<CurriculumState>,
    pub model_id: Option<String>,
    pub callback_url: Option<String>,
    pub environment: Option<EnvConfig>,
    pub submitted_by: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl TrainingJob {
    /// Build a pending job from a validated submission. Stage slots for all
    /// five stages are initialized up front; the forecasting slot is marked
    /// Skipped for sentiment jobs so the pipeline strip renders honestly.
    pub fn from_request(req: super::messages::SubmitRequest, actor: &str) -> Self {
        let in_pipeline = Stage::pipeline(req.model_type);
        let stages = STAGE_ORDER
            .iter()
            .map(|s| StageState {
                stage: *s,
                status: if in_pipeline.contains(s) {
                    StageStatus::Pending
                } else {
                    StageStatus::Skipped
                },
                progress: 0,
                duration_secs: None,
            })
            .collect();

        let mut job = Self {
            job_id: format!("job-{}", Uuid::new_v4()),
            model_type: req.model_type,
            coins: req.coins,
            lookback_days: req.lookback_days,
            interval: req.interval,
            algorithm: req.algorithm,
            architecture: req.architecture,
            tune: req.tune,
            risk_profile: req.risk_profile,
            dataset_version: req.dataset_version,
            curriculum_level: req.curriculum_level.unwrap_or(CurriculumLevel::Simple),
            status: JobStatus::Pending,
            current_stage: "Queued".to_string(),
            progress: 0,
            stages,
            logs: Vec::new(),
            metrics: None,
            experiment: ExperimentInfo::generate(),
            curriculum: None,
            model_id: None,
            callback_url: req.callback_url,
            environment: req.environment,
            submitted_by: actor.to_string(),
            created_at: Utc::now(),
            started_at: None,
            ended_at: None,
        };
        job.log(
            LogLevel::Info,
            format!("job accepted ({} on {})", job.model_type.as_str(), job.coins.join(",")),
        );
        job
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        self.logs.push(JobLogLine {
            at: Utc::now(),
            level,
            message: message.into(),
        });
    }

    fn slot_mut(&mut self, stage: Stage) -> Option<&mut StageState> {
        self.stages.iter_mut().find(|s| s.stage == stage)
    }

    /// Transition into a stage: status, currentStage label, slot to Running.
    pub fn begin_stage(&mut self, stage: Stage) {
        self.status = stage.status();
        self.current_stage = stage.label().to_string();
        if self.started_at.is_none() {
            self.started_at = Some(Utc::now());
        }
        if let Some(slot) = self.slot_mut(stage) {
            slot.status = StageStatus::Running;
        }
        self.log(LogLevel::Info, format!("{} started", stage.label()));
    }

    /// Mark a stage done, absorb its outcome, recompute overall progress.
    pub fn complete_stage(&mut self, stage: Stage, elapsed_secs: f64, outcome: &StageOutcome) {
        if let Some(slot) = self.slot_mut(stage) {
            slot.status = StageStatus::Completed;
            slot.progress = 100;
            slot.duration_secs = Some(elapsed_secs);
        }
        if let Some(metrics) = &outcome.metrics {
            self.metrics = Some(metrics.clone());
        }
        self.recompute_progress();
        self.log(
            LogLevel::Info,
            format!("{} completed in {:.1}s: {}", stage.label(), elapsed_secs, outcome.summary),
        );
    }

    /// Weighted percent over completed stages, normalized to the stages in
    /// this job's pipeline. Integer and only recomputed on completion, so it
    /// never decreases while the job is non-terminal.
    fn recompute_progress(&mut self) {
        let total: u32 = self
            .stages
            .iter()
            .filter(|s| s.status != StageStatus::Skipped)
            .map(|s| s.stage.weight())
            .sum();
        let done: u32 = self
            .stages
            .iter()
            .filter(|s| s.status == StageStatus::Completed)
            .map(|s| s.stage.weight())
            .sum();
        if total > 0 {
            self.progress = ((done * 100) / total) as u8;
        }
    }

    /// Record the curriculum gate's verdict. Advisory: nothing here changes
    /// `curriculum_level` or blocks progression.
    pub fn apply_gate(&mut self, measured: &JobMetrics, decision: &GateDecision) {
        self.curriculum = Some(CurriculumState {
            level: self.curriculum_level,
            criteria: CriteriaStatus {
                target: decision.target,
                measured_win_ratio: measured.win_ratio,
                measured_trades: measured.trades,
                measured_drawdown: measured.max_drawdown,
                passed: decision.target_met,
            },
            scheduler: SchedulerHint {
                next_level: decision.next_level,
            },
        });
        if decision.target_met {
            self.log(
                LogLevel::Info,
                format!(
                    "curriculum target for level {} met",
                    self.curriculum_level.as_str()
                ),
            );
        }
    }

    pub fn complete(&mut self, model_id: &str) {
        self.status = JobStatus::Completed;
        self.current_stage = "Completed".to_string();
        self.progress = 100;
        self.model_id = Some(model_id.to_string());
        self.ended_at = Some(Utc::now());
        self.log(LogLevel::Info, format!("training complete, registered model {model_id}"));
    }

    pub fn fail(&mut self, stage: Stage, error: &str) {
        self.status = JobStatus::Failed;
        self.current_stage = "Failed".to_string();
        self.ended_at = Some(Utc::now());
        self.log(LogLevel::Error, format!("{} failed: {error}", stage.as_str()));
    }

    pub fn cancel(&mut self, actor: &str) {
        self.status = JobStatus::Cancelled;
        self.current_stage = "Cancelled".to_string();
        self.ended_at = Some(Utc::now());
        self.log(LogLevel::Warn, format!("cancelled by {actor}"));
    }
}

// ─────────────────────────────────────────────────────────
// Model
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    Trained,
    Deployed,
    Shadow,
    Archived,
}

impl ModelStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelStatus::Trained => "trained",
            ModelStatus::Deployed => "deployed",
            ModelStatus::Shadow => "shadow",
            ModelStatus::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlgorithmInfo {
    pub algorithm: String,
    pub architecture: Architecture,
    pub tuned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explainability {
    pub method: String,
    pub top_features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    pub model_id: String,
    pub name: String,
    pub version: String,
    pub model_type: ModelType,
    pub status: ModelStatus,
    pub performance: JobMetrics,
    pub algorithm_info: AlgorithmInfo,
    pub experiment: ExperimentInfo,
    pub risk_profile: Option<String>,
    pub explainability: Explainability,
    pub source_job_id: String,
    pub created_at: DateTime<Utc>,
    pub deployed_at: Option<DateTime<Utc>>,
    pub shadow_start: Option<DateTime<Utc>>,
    pub shadow_end: Option<DateTime<Utc>>,
}

pub fn new_model_id() -> String {
    format!("mdl-{}", Uuid::new_v4())
}

fn short_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

// ─────────────────────────────────────────────────────────
// Audit trail
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    JobSubmitted,
    JobCancelled,
    JobCompleted,
    JobFailed,
    ModelCreated,
    ModelDeployed,
    ModelRolledBack,
    ShadowStarted,
    ShadowStopped,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::JobSubmitted => "job.submitted",
            AuditAction::JobCancelled => "job.cancelled",
            AuditAction::JobCompleted => "job.completed",
            AuditAction::JobFailed => "job.failed",
            AuditAction::ModelCreated => "model.created",
            AuditAction::ModelDeployed => "model.deployed",
            AuditAction::ModelRolledBack => "model.rolled_back",
            AuditAction::ShadowStarted => "shadow.started",
            AuditAction::ShadowStopped => "shadow.stopped",
        }
    }
}

/// Append-only audit record. Causally ordered by insertion, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub action: AuditAction,
    pub subject_ids: Vec<String>,
    pub actor: String,
    pub detail: String,
    pub at: DateTime<Utc>,
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::messages::SubmitRequest;

    fn req(model_type: ModelType) -> SubmitRequest {
        SubmitRequest {
            model_type,
            coins: vec!["BTC".into(), "ETH".into()],
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
        }
    }

    #[test]
    fn test_pipeline_skips_forecasting_for_sentiment() {
        let p = Stage::pipeline(ModelType::Sentiment);
        assert_eq!(
            p,
            vec![Stage::DataPrep, Stage::RlTraining, Stage::Backtesting, Stage::Validation]
        );
        assert!(Stage::pipeline(ModelType::Forecast).contains(&Stage::Forecasting));
    }

    #[test]
    fn test_stage_weights_sum_to_100() {
        let total: u32 = STAGE_ORDER.iter().map(|s| s.weight()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_new_job_initial_state() {
        let job = TrainingJob::from_request(req(ModelType::Sentiment), "alice");
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.progress, 0);
        assert_eq!(job.stages.len(), 5);
        let forecasting = job.stages.iter().find(|s| s.stage == Stage::Forecasting);
        assert_eq!(forecasting.map(|s| s.status), Some(StageStatus::Skipped));
        assert_eq!(job.curriculum_level, CurriculumLevel::Simple);
        assert_eq!(job.submitted_by, "alice");
        assert!(job.job_id.starts_with("job-"));
        assert_eq!(job.logs.len(), 1);
    }

    #[test]
    fn test_progress_monotone_over_pipeline() {
        let mut job = TrainingJob::from_request(req(ModelType::RlAgent), "alice");
        let outcome = StageOutcome {
            metrics: None,
            summary: "ok".into(),
        };
        let mut last = 0u8;
        for stage in Stage::pipeline(job.model_type) {
            job.begin_stage(stage);
            assert!(job.progress >= last);
            job.complete_stage(stage, 0.5, &outcome);
            assert!(job.progress >= last);
            last = job.progress;
        }
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_sentiment_progress_normalized() {
        let mut job = TrainingJob::from_request(req(ModelType::Sentiment), "alice");
        let outcome = StageOutcome {
            metrics: None,
            summary: "ok".into(),
        };
        job.begin_stage(Stage::DataPrep);
        job.complete_stage(Stage::DataPrep, 0.1, &outcome);
        // 15 of 80 remaining weight
        assert_eq!(job.progress, 18);
        for stage in [Stage::RlTraining, Stage::Backtesting, Stage::Validation] {
            job.begin_stage(stage);
            job.complete_stage(stage, 0.1, &outcome);
        }
        assert_eq!(job.progress, 100);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::RlTraining.is_terminal());
    }

    #[test]
    fn test_architecture_compatibility() {
        let fc = Architecture::Forecast { encoder: "tcn".into(), horizon_steps: 24 };
        assert!(fc.compatible_with(ModelType::Forecast));
        assert!(fc.compatible_with(ModelType::Ensemble));
        assert!(!fc.compatible_with(ModelType::Sentiment));
        assert!(Architecture::Default.compatible_with(ModelType::Sentiment));
        let rl = Architecture::RlAgent { policy: "ppo".into(), gamma: 0.99, buffer_size: 4096 };
        assert!(!rl.compatible_with(ModelType::Forecast));
    }

    #[test]
    fn test_cancel_marks_terminal_and_logs() {
        let mut job = TrainingJob::from_request(req(ModelType::Forecast), "alice");
        let before = job.logs.len();
        job.cancel("bob");
        assert_eq!(job.status, JobStatus::Cancelled);
        assert!(job.ended_at.is_some());
        assert_eq!(job.logs.len(), before + 1);
    }
}

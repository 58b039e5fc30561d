//! Stage execution seam.
//!
//! `StageRunner` is the trait real training backends plug into; the
//! orchestrator only ever talks to the trait. `SimulatedRunner` is the
//! bundled stand-in: per-stage timers plus randomized metrics, tunable via
//! env so demos and tests can run fast.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

use super::types::{JobMetrics, ModelType, Stage, TrainingJob};

// ─────────────────────────────────────────────────────────
// Trait
// ─────────────────────────────────────────────────────────

/// Result of one stage execution unit.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    /// Updated performance snapshot, when the stage produces one.
    /// data_prep and forecasting report progress through `summary` only.
    pub metrics: Option<JobMetrics>,
    /// One human line for the job log.
    pub summary: String,
}

/// Pluggable per-stage executor. An error return fails the whole job; the
/// progression loop never panics on it.
#[async_trait]
pub trait StageRunner: Send + Sync {
    async fn run_stage(&self, job: &TrainingJob, stage: Stage) -> anyhow::Result<StageOutcome>;
}

// ─────────────────────────────────────────────────────────
// Simulated runner
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SimulatedRunnerConfig {
    /// Base wall time per stage. Default: 400ms.
    pub stage_delay: Duration,
    /// Extra uniform jitter added per stage, in ms. Default: 250.
    pub jitter_ms: u64,
}

impl Default for SimulatedRunnerConfig {
    fn default() -> Self {
        Self {
            stage_delay: Duration::from_millis(400),
            jitter_ms: 250,
        }
    }
}

impl SimulatedRunnerConfig {
    /// Load overrides from environment variables (if set).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(v) = std::env::var("ORCH_STAGE_DELAY_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                cfg.stage_delay = Duration::from_millis(ms);
            }
        }
        if let Ok(v) = std::env::var("ORCH_STAGE_JITTER_MS") {
            if let Ok(ms) = v.parse::<u64>() {
                cfg.jitter_ms = ms;
            }
        }
        cfg
    }

    /// Fast profile for tests: ~1ms stages, no jitter.
    pub fn fast() -> Self {
        Self {
            stage_delay: Duration::from_millis(1),
            jitter_ms: 0,
        }
    }
}

/// Timer-driven stand-in for real training backends.
pub struct SimulatedRunner {
    cfg: SimulatedRunnerConfig,
}

impl SimulatedRunner {
    pub fn new(cfg: SimulatedRunnerConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl StageRunner for SimulatedRunner {
    async fn run_stage(&self, job: &TrainingJob, stage: Stage) -> anyhow::Result<StageOutcome> {
        let delay = {
            let mut rng = rand::thread_rng();
            let jitter = if self.cfg.jitter_ms > 0 {
                rng.gen_range(0..self.cfg.jitter_ms)
            } else {
                0
            };
            self.cfg.stage_delay + Duration::from_millis(jitter)
        };
        debug!(
            "⏳ simulating {} for job {} ({}ms)",
            stage.as_str(),
            job.job_id,
            delay.as_millis(),
        );
        tokio::time::sleep(delay).await;

        let mut rng = rand::thread_rng();
        let outcome = match stage {
            Stage::DataPrep => StageOutcome {
                metrics: None,
                summary: format!(
                    "prepared {} candles across {} assets (lookback {}d, {})",
                    rng.gen_range(20_000..90_000),
                    job.coins.len(),
                    job.lookback_days,
                    job.interval,
                ),
            },
            Stage::Forecasting => StageOutcome {
                metrics: None,
                summary: format!(
                    "fitted {} forecaster, validation MAPE {:.2}%",
                    job.algorithm,
                    rng.gen_range(1.5..6.0),
                ),
            },
            Stage::RlTraining => {
                let metrics = JobMetrics {
                    win_ratio: rng.gen_range(0.48..0.62),
                    trades: rng.gen_range(30..140),
                    max_drawdown: rng.gen_range(0.05..0.22),
                    sharpe_ratio: rng.gen_range(0.6..1.8),
                    total_return_pct: rng.gen_range(-2.0..14.0),
                };
                let episodes = rng.gen_range(200..900);
                StageOutcome {
                    summary: format!(
                        "ran {} episodes at level {}, win ratio {:.3}",
                        episodes,
                        job.curriculum_level.as_str(),
                        metrics.win_ratio,
                    ),
                    metrics: Some(metrics),
                }
            }
            Stage::Backtesting => {
                let base = job.metrics.clone().unwrap_or_default();
                // Backtest re-measures on held-out data: nudge, don't invent.
                let metrics = JobMetrics {
                    win_ratio: (base.win_ratio + rng.gen_range(-0.02..0.03)).clamp(0.0, 1.0),
                    trades: base.trades + rng.gen_range(10..60),
                    max_drawdown: (base.max_drawdown + rng.gen_range(-0.02..0.02)).max(0.01),
                    sharpe_ratio: (base.sharpe_ratio + rng.gen_range(-0.2..0.2)).max(0.0),
                    total_return_pct: base.total_return_pct + rng.gen_range(-1.5..3.0),
                };
                StageOutcome {
                    summary: format!(
                        "backtested {} days, {} trades, return {:.1}%",
                        job.lookback_days, metrics.trades, metrics.total_return_pct,
                    ),
                    metrics: Some(metrics),
                }
            }
            Stage::Validation => {
                let metrics = job.metrics.clone().unwrap_or_default();
                let checks = match job.model_type {
                    ModelType::Ensemble => 14,
                    _ => 9,
                };
                StageOutcome {
                    summary: format!("validation suite passed ({checks} checks)"),
                    metrics: Some(metrics),
                }
            }
        };
        Ok(outcome)
    }
}

// ─────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────

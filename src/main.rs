//! orchd: training-job orchestration daemon.
//!
//! Wires the orchestrator with the simulated stage runner, logs live job
//! snapshots, and optionally submits a demo job (ORCH_DEMO=1). HTTP wiring
//! lives in the admin product's API layer, not here.

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use modelops::orchestrator::audit::AuditLog;
use modelops::orchestrator::messages::SubmitRequest;
use modelops::orchestrator::types::{Architecture, CurriculumLevel, ModelType};
use modelops::{
    CallbackClient, CallbackConfig, ModelRegistry, Orchestrator, OrchestratorConfig,
    SimulatedRunner, SimulatedRunnerConfig,
};

/// Console logging by default; daily-rolled file logging when ORCH_LOG_DIR
/// is set. The guard must stay alive for the file writer to flush.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match std::env::var("ORCH_LOG_DIR") {
        Ok(dir) => {
            let file = tracing_appender::rolling::daily(dir, "orchd.log");
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

fn demo_request() -> SubmitRequest {
    SubmitRequest {
        model_type: ModelType::RlAgent,
        coins: vec!["BTC".into(), "ETH".into()],
        lookback_days: 90,
        interval: "1h".into(),
        algorithm: "PPO".into(),
        architecture: Architecture::RlAgent {
            policy: "mlp".into(),
            gamma: 0.99,
            buffer_size: 65_536,
        },
        tune: true,
        callback_url: None,
        environment: None,
        risk_profile: Some("moderate".into()),
        dataset_version: Some("2026-08".into()),
        curriculum_level: Some(CurriculumLevel::Simple),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = init_tracing();

    info!("🚀 orchd starting");

    let audit = Arc::new(AuditLog::new());
    let registry = Arc::new(ModelRegistry::new(audit.clone()));
    let runner = Arc::new(SimulatedRunner::new(SimulatedRunnerConfig::from_env()));
    let callback = CallbackClient::new(CallbackConfig::from_env());
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::from_env(),
        runner,
        registry.clone(),
        audit.clone(),
        callback,
    );

    // Live status feed: one log line per job mutation.
    let mut snapshots = orchestrator.subscribe();
    tokio::spawn(async move {
        while snapshots.changed().await.is_ok() {
            let snap = snapshots.borrow().clone();
            if !snap.job_id.is_empty() {
                info!(
                    "📈 {} {} {}% ({})",
                    snap.job_id,
                    snap.status.as_str(),
                    snap.progress,
                    snap.current_stage,
                );
            }
        }
    });

    if std::env::var("ORCH_DEMO").map(|v| v == "1").unwrap_or(false) {
        match orchestrator.submit(demo_request(), "demo").await {
            Ok(job) => info!("🧪 demo job {} accepted", job.job_id),
            Err(err) => warn!("demo submission rejected: {err}"),
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("👋 orchd shutting down | audit entries={}", audit.len());
    Ok(())
}

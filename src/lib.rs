pub mod callback;
pub mod orchestrator;

pub use callback::{CallbackClient, CallbackConfig};
pub use orchestrator::engine::{Orchestrator, OrchestratorConfig};
pub use orchestrator::error::OrchestratorError;
pub use orchestrator::registry::ModelRegistry;
pub use orchestrator::runner::{SimulatedRunner, SimulatedRunnerConfig, StageRunner};

pub mod bounded;
pub mod orchestrator;
pub mod outcome;
pub mod run_state;

pub use bounded::{BoundedExecutor, TaskFailure};
pub use orchestrator::{RunOrchestrator, UpstreamFailurePolicy};
pub use outcome::{ExecutionOutcome, FailureKind, NodeFailure, NodeInputs, UpstreamOutput};
pub use run_state::{NodeRecord, PhaseFailure, RunPhase, RunReport, RunStatus};

/// Runs the pipeline
mod pipeline_runner;
pub use pipeline_runner::{PipelineRunner, RunOutcome};

/// Per-module state machine
mod phase;
pub use phase::Phase;

/// Run a subprocess
mod run_cmd;
pub use run_cmd::run_cmd;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Can't attach to child {0}")]
    ChildPipe(&'static str),
    #[error("Illegal module state transition from {from} to {to}")]
    IllegalTransition { from: Phase, to: Phase },
}

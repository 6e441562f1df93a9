/// Runs the jobs of a workflow
mod workflow_runner;
pub use workflow_runner::WorkflowRunner;

/// Run a subprocess
mod run_cmd;
pub use run_cmd::{run_cmd, shell_cmd};

/// Error handlers and validators used by the supervisor
mod handlers;
pub use handlers::{handler_group, MarkerValidator};

/// Error-correcting job supervisor
mod supervisor;
pub use supervisor::Supervisor;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot attach to child {0}")]
    NoChildPipe(&'static str),
    #[error("Thread forwarding child {0} panicked")]
    OutputThreadPanicked(&'static str),
    #[error("Subprocess failed with exit code {0:?}")]
    NonZeroExit(Option<i32>),
    #[error("Maximum number of errors ({0}) reached")]
    MaxErrorsReached(usize),
    #[error("Validator {0} rejected the run")]
    ValidationFailed(String),
    #[error("Unknown handler group \"{0}\"")]
    UnknownHandlerGroup(String),
}

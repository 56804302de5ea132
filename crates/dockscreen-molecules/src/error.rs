//! Error types for the screening core.

use dockscreen_common::{CompoundId, ScreenError};
use dockscreen_db::{DbError, FailureKind};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised while submitting or executing a docking job.
#[derive(Debug, Error)]
pub enum DockingError {
    #[error("Compound not found: {0}")]
    UnknownCompound(CompoundId),

    #[error("Missing docking input: {0}")]
    MissingInput(String),

    #[error("Failed to launch Vina: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Vina exited with code {}", .exit_code.map(|c| c.to_string()).unwrap_or_else(|| "none (terminated by signal)".to_string()))]
    ToolFailed { exit_code: Option<i32>, log: String },

    #[error("Vina succeeded but its output has no usable affinity table")]
    UnparsableOutput { log: String },

    #[error("Vina exceeded the {limit_secs}s limit and was killed")]
    Timeout { limit_secs: u64, log: String },

    #[error("Docking worker aborted: {0}")]
    Worker(String),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl DockingError {
    /// Reason recorded on the FAILED job.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            DockingError::MissingInput(_) | DockingError::UnknownCompound(_) => FailureKind::MissingInput,
            DockingError::ToolFailed { .. } => FailureKind::ToolFailed,
            DockingError::UnparsableOutput { .. } => FailureKind::UnparsableOutput,
            DockingError::Timeout { .. } => FailureKind::Timeout,
            DockingError::Spawn(_) | DockingError::Worker(_) | DockingError::Db(_) => FailureKind::Internal,
        }
    }

    /// Diagnostic text stored as the FAILED job's log: the message, followed
    /// by whatever Vina printed when there is any.
    pub fn diagnostic(&self) -> String {
        match self {
            DockingError::ToolFailed { log, .. }
            | DockingError::UnparsableOutput { log }
            | DockingError::Timeout { log, .. } => {
                if log.is_empty() {
                    self.to_string()
                } else {
                    format!("{}\n{}", self, log)
                }
            }
            _ => self.to_string(),
        }
    }
}

/// Failures talking to the remote ADMET service. Never surfaced past the
/// predictor: they are logged and replaced by default metrics.
#[derive(Debug, Error)]
pub enum AdmetServiceError {
    #[error("ADMET request failed: {0}")]
    Transport(#[from] ScreenError),

    #[error("ADMET service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("ADMET response body is not valid JSON: {0}")]
    Body(String),
}

impl From<reqwest::Error> for AdmetServiceError {
    fn from(err: reqwest::Error) -> Self {
        AdmetServiceError::Transport(ScreenError::Http(err))
    }
}

/// Errors raised by the scoring service. A veto is not an error.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Compound not found: {0}")]
    UnknownCompound(CompoundId),

    #[error("Prerequisite result not found: {0}")]
    MissingDependency(&'static str),

    #[error("Compound {compound_id} is missing required descriptor: {descriptor}")]
    MissingDescriptor {
        compound_id: CompoundId,
        descriptor: &'static str,
    },

    #[error(transparent)]
    Db(#[from] DbError),
}

/// Errors from the end-to-end screening pipeline.
#[derive(Debug, Error)]
pub enum ScreeningError {
    #[error(transparent)]
    Docking(#[from] DockingError),

    #[error("Docking job {job_id} failed: {reason}")]
    DockingFailed { job_id: Uuid, reason: String },

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Db(#[from] DbError),
}

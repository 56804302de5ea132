//! Database error types.

use thiserror::Error;
use uuid::Uuid;

use crate::schema::DockingStatus;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Docking job {job_id} cannot move from {from} to {to}")]
    InvalidTransition {
        job_id: Uuid,
        from: DockingStatus,
        to: DockingStatus,
    },

    #[error("Snapshot is corrupt: {0}")]
    CorruptSnapshot(String),
}

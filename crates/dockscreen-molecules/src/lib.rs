//! Dockscreen Molecules - docking orchestration, ADMET prediction and scoring.
//!
//! This crate is the screening core:
//! 1. Parsing AutoDock Vina affinity tables
//! 2. Running Vina against the fixed active site
//! 3. Tracking docking jobs through their lifecycle
//! 4. ADMET prediction through a remote service
//! 5. Scoring compounds with the safety veto
//! 6. Chaining the above for a single compound

pub mod error;
pub mod affinity;
pub mod docking;
pub mod jobs;
pub mod admet;
pub mod scoring;
pub mod pipeline;

pub use error::{AdmetServiceError, DockingError, ScoringError, ScreeningError};

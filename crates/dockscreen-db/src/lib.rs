//! Dockscreen Database Layer
//!
//! This crate provides an embedded record store for compounds, docking jobs,
//! ADMET predictions and analysis reports.
//!
//! # Features
//!
//! - In-memory tables guarded by an async `RwLock`
//! - Optional JSON snapshot on disk, rewritten atomically after every write
//! - Append-only docking and report history; terminal job states are write-once
//!
//! # Example
//!
//! ```rust,no_run
//! use dockscreen_db::{Database, DockingJobRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::open("./data/dockscreen.json").await?;
//!     let jobs = DockingJobRepository::new(std::sync::Arc::new(db));
//!     let latest = jobs.find_latest_by_compound(1).await?;
//!     println!("{:?}", latest.map(|j| j.status));
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod schema;
pub mod compounds;
pub mod docking_jobs;
pub mod admet_results;
pub mod analysis_reports;

pub use database::{Database, DatabaseStats};
pub use error::{DbError, Result};
pub use schema::{
    AdmetProfile, AdmetRecord, AnalysisReport, DockingJob, DockingStatus, FailureKind,
};
pub use compounds::CompoundRepository;
pub use docking_jobs::DockingJobRepository;
pub use admet_results::AdmetResultRepository;
pub use analysis_reports::AnalysisReportRepository;

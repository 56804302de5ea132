//! Record definitions for the embedded tables.
//!
//! Docking jobs and analysis reports are append-only history. ADMET results
//! hold at most one record per compound.

use chrono::{DateTime, Utc};
use dockscreen_common::CompoundId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Docking Job Schema
// =============================================================================

/// Lifecycle of a docking job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DockingStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl DockingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DockingStatus::Pending => "PENDING",
            DockingStatus::Running => "RUNNING",
            DockingStatus::Completed => "COMPLETED",
            DockingStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DockingStatus::Completed | DockingStatus::Failed)
    }

    /// PENDING -> RUNNING -> {COMPLETED, FAILED}; PENDING may fail directly
    /// when input validation rejects the job. Terminal states never move.
    pub fn can_transition_to(&self, next: DockingStatus) -> bool {
        use DockingStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
        )
    }
}

impl fmt::Display for DockingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a docking job ended in FAILED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Receptor, ligand or executable missing before launch
    MissingInput,
    /// Vina exited with a non-zero status
    ToolFailed,
    /// Vina succeeded but no affinity could be read from its output
    UnparsableOutput,
    /// Wall-clock limit exceeded; the process was killed
    Timeout,
    /// Spawn or worker error unrelated to Vina's own output
    Internal,
}

/// Docking job record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockingJob {
    pub id: Uuid,
    pub compound_id: CompoundId,
    pub status: DockingStatus,
    /// Best-mode binding affinity in kcal/mol; only set on COMPLETED
    pub affinity: Option<f64>,
    /// Captured Vina output, or the diagnostic message on failure
    pub log: Option<String>,
    pub failure: Option<FailureKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DockingJob {
    pub fn new(compound_id: CompoundId) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            compound_id,
            status: DockingStatus::Pending,
            affinity: None,
            log: None,
            failure: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// ADMET Schema
// =============================================================================

/// Which metric set a prediction carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmetProfile {
    /// hERG, Ames, liver toxicity, absorption, metabolic stability; keyed by SMILES
    #[default]
    Standard,
    /// Absorption, distribution, metabolism, excretion, toxicity; keyed by compound name
    Legacy,
}

/// ADMET prediction record. All metrics are normalised to [0, 1];
/// flags are stored as 0.0 / 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdmetRecord {
    pub id: Uuid,
    pub compound_id: CompoundId,
    pub profile: AdmetProfile,
    pub herg_toxicity: Option<f64>,
    pub ames_toxicity: Option<f64>,
    pub liver_toxicity: Option<f64>,
    pub absorption: Option<f64>,
    pub metabolism: Option<f64>,
    pub distribution: Option<f64>,
    pub excretion: Option<f64>,
    pub toxicity: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdmetRecord {
    pub fn new(compound_id: CompoundId, profile: AdmetProfile) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            compound_id,
            profile,
            herg_toxicity: None,
            ames_toxicity: None,
            liver_toxicity: None,
            absorption: None,
            metabolism: None,
            distribution: None,
            excretion: None,
            toxicity: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// Analysis Report Schema
// =============================================================================

/// Immutable scoring outcome. A new report is appended on every scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub id: Uuid,
    pub compound_id: CompoundId,
    pub total_score: f64,
    pub potency_score: f64,
    pub safety_score: f64,
    pub druglikeness_score: f64,
    pub vetoed: bool,
    pub advice_tags: Vec<String>,
    pub rationale: String,
    /// Docking job whose affinity was scored
    pub docking_job_id: Option<Uuid>,
    /// ADMET record whose metrics were scored
    pub admet_result_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

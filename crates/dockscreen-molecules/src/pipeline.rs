//! End-to-end screening of a single compound.
//!
//! Chains: dock (and wait) -> ADMET prediction -> scoring.

use crate::admet::AdmetPredictor;
use crate::error::{DockingError, ScreeningError};
use crate::jobs::DockingOrchestrator;
use crate::scoring::ScoringService;
use dockscreen_common::CompoundId;
use dockscreen_db::{AdmetRecord, AnalysisReport, CompoundRepository, Database, DockingJob, DockingStatus};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Everything produced by one screening run.
#[derive(Debug, Clone, Serialize)]
pub struct ScreeningOutcome {
    pub docking: DockingJob,
    pub admet: AdmetRecord,
    pub report: AnalysisReport,
}

pub struct ScreeningPipeline {
    compounds: CompoundRepository,
    docking: DockingOrchestrator,
    admet: AdmetPredictor,
    scoring: ScoringService,
}

impl ScreeningPipeline {
    pub fn new(db: Arc<Database>, docking: DockingOrchestrator, admet: AdmetPredictor) -> Self {
        Self {
            compounds: CompoundRepository::new(db.clone()),
            docking,
            admet,
            scoring: ScoringService::new(db),
        }
    }

    /// Dock, predict and score one compound.
    ///
    /// A failed docking run ends the screening with that job's error; an
    /// earlier completed run is not silently reused.
    #[instrument(skip(self))]
    pub async fn screen(&self, compound_id: CompoundId) -> Result<ScreeningOutcome, ScreeningError> {
        let compound = self
            .compounds
            .find_by_id(compound_id)
            .await?
            .ok_or(DockingError::UnknownCompound(compound_id))?;

        info!("Step 1: docking {}", compound.name);
        let docking = self.docking.submit(compound_id).await?.wait().await?;
        if docking.status != DockingStatus::Completed {
            warn!(job_id = %docking.id, "Docking did not complete, screening stops");
            return Err(ScreeningError::DockingFailed {
                job_id: docking.id,
                reason: docking
                    .log
                    .as_deref()
                    .and_then(|log| log.lines().next())
                    .unwrap_or("no diagnostic")
                    .to_string(),
            });
        }

        info!("Step 2: ADMET prediction");
        let admet = self.admet.predict(&compound).await?;

        info!("Step 3: scoring");
        let report = self.scoring.analyze(compound_id).await?;

        info!(
            total = report.total_score,
            vetoed = report.vetoed,
            "Screening complete"
        );
        Ok(ScreeningOutcome {
            docking,
            admet,
            report,
        })
    }
}

//! Docking job orchestration.
//!
//! `submit` records a PENDING job and returns immediately; a background task
//! moves it to RUNNING and then to exactly one terminal state. Runs that share
//! a ligand file (and so a pose file) are serialised, even across compound
//! ids. Other runs proceed in parallel up to `max_parallel`.

use crate::docking::VinaRunner;
use crate::error::DockingError;
use dockscreen_common::CompoundId;
use dockscreen_db::{CompoundRepository, Database, DockingJob, DockingJobRepository, FailureKind};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, Semaphore};
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// One async lock per ligand stem, which names both files a run touches.
#[derive(Default)]
pub struct LigandLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl LigandLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive use of the files of `ligand_stem`.
    pub async fn acquire(&self, ligand_stem: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            // Drop entries nobody holds or waits on
            locks.retain(|stem, l| stem == ligand_stem || Arc::strong_count(l) > 1);
            locks.entry(ligand_stem.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }
}

/// Handle returned by [`DockingOrchestrator::submit`].
pub struct DockingTicket {
    /// The job as recorded at submission (PENDING)
    pub job: DockingJob,
    /// Resolves with the job in its terminal state
    pub completion: JoinHandle<Result<DockingJob, DockingError>>,
}

impl DockingTicket {
    pub fn job_id(&self) -> Uuid {
        self.job.id
    }

    /// Wait for the background run to finish.
    pub async fn wait(self) -> Result<DockingJob, DockingError> {
        self.completion
            .await
            .map_err(|e| DockingError::Worker(e.to_string()))?
    }
}

/// A compound's best completed affinity, for the ranking view.
#[derive(Debug, Clone, Serialize)]
pub struct RankedCompound {
    pub rank: usize,
    pub compound_id: CompoundId,
    pub name: String,
    pub category: Option<String>,
    pub affinity: f64,
    pub job_id: Uuid,
}

/// Accepts docking requests and drives them to completion.
#[derive(Clone)]
pub struct DockingOrchestrator {
    runner: Arc<VinaRunner>,
    compounds: CompoundRepository,
    jobs: DockingJobRepository,
    locks: Arc<LigandLocks>,
    slots: Arc<Semaphore>,
}

impl DockingOrchestrator {
    pub fn new(db: Arc<Database>, runner: VinaRunner) -> Self {
        let slots = runner.settings().max_parallel.max(1);
        Self {
            runner: Arc::new(runner),
            compounds: CompoundRepository::new(db.clone()),
            jobs: DockingJobRepository::new(db),
            locks: Arc::new(LigandLocks::new()),
            slots: Arc::new(Semaphore::new(slots)),
        }
    }

    pub fn runner(&self) -> &VinaRunner {
        &self.runner
    }

    /// Record a PENDING job and start docking in the background.
    ///
    /// Unknown compounds are rejected without creating a job. Missing input
    /// files create the job and fail it straight away.
    #[instrument(skip(self))]
    pub async fn submit(&self, compound_id: CompoundId) -> Result<DockingTicket, DockingError> {
        let compound = self
            .compounds
            .find_by_id(compound_id)
            .await?
            .ok_or(DockingError::UnknownCompound(compound_id))?;

        let job = DockingJob::new(compound_id);
        self.jobs.insert(&job).await?;

        if let Err(e) = self.runner.validate(&compound.ligand_stem) {
            warn!(job_id = %job.id, "Docking inputs missing: {}", e);
            self.jobs.fail(job.id, e.failure_kind(), e.diagnostic()).await?;
            return Err(e);
        }

        let worker = self.clone();
        let job_id = job.id;
        let ligand_stem = compound.ligand_stem.clone();
        let completion =
            tokio::spawn(async move { worker.execute(job_id, compound_id, ligand_stem).await });

        info!(job_id = %job.id, compound = %compound.name, "Docking job accepted");
        Ok(DockingTicket { job, completion })
    }

    #[instrument(skip(self, ligand_stem))]
    async fn execute(
        &self,
        job_id: Uuid,
        compound_id: CompoundId,
        ligand_stem: String,
    ) -> Result<DockingJob, DockingError> {
        let _ligand = self.locks.acquire(&ligand_stem).await;
        let _slot = self
            .slots
            .acquire()
            .await
            .map_err(|e| DockingError::Worker(e.to_string()))?;

        self.jobs.mark_running(job_id).await?;

        match self.runner.run(&ligand_stem).await {
            Ok(run) => {
                info!(
                    affinity = run.affinity,
                    modes = run.modes.len(),
                    elapsed_secs = run.elapsed.as_secs_f64(),
                    "Docking completed"
                );
                Ok(self.jobs.complete(job_id, run.affinity, run.log).await?)
            }
            Err(e) => {
                error!(kind = ?e.failure_kind(), "Docking failed: {}", e);
                Ok(self.jobs.fail(job_id, e.failure_kind(), e.diagnostic()).await?)
            }
        }
    }

    /// Fail jobs left PENDING or RUNNING by a process that exited before its
    /// workers finished. Call before accepting new submissions.
    pub async fn recover_interrupted(&self) -> Result<Vec<DockingJob>, DockingError> {
        let mut recovered = Vec::new();
        for job in self.jobs.list_unfinished().await? {
            warn!(job_id = %job.id, status = %job.status, "Failing interrupted docking job");
            let failed = self
                .jobs
                .fail(
                    job.id,
                    FailureKind::Internal,
                    format!("interrupted while {}; the owning process exited", job.status),
                )
                .await?;
            recovered.push(failed);
        }
        Ok(recovered)
    }

    pub async fn job(&self, job_id: Uuid) -> Result<Option<DockingJob>, DockingError> {
        Ok(self.jobs.find_by_id(job_id).await?)
    }

    /// Most recently submitted job for a compound, whatever its state.
    pub async fn latest_for_compound(&self, compound_id: CompoundId) -> Result<Option<DockingJob>, DockingError> {
        Ok(self.jobs.find_latest_by_compound(compound_id).await?)
    }

    /// Completed job with the lowest affinity for a compound.
    pub async fn best_for_compound(&self, compound_id: CompoundId) -> Result<Option<DockingJob>, DockingError> {
        Ok(self.jobs.find_best_by_compound(compound_id).await?)
    }

    pub async fn history(&self, compound_id: CompoundId) -> Result<Vec<DockingJob>, DockingError> {
        Ok(self.jobs.list_by_compound(compound_id).await?)
    }

    /// Top compounds by best completed affinity, strongest first.
    pub async fn ranked(&self, limit: usize) -> Result<Vec<RankedCompound>, DockingError> {
        let best = self.jobs.ranked_best(limit).await?;
        let mut ranked = Vec::with_capacity(best.len());
        for job in best {
            let Some(affinity) = job.affinity else { continue };
            let compound = self.compounds.find_by_id(job.compound_id).await?;
            let (name, category) = compound
                .map(|c| (c.name, c.category))
                .unwrap_or_else(|| (format!("compound-{}", job.compound_id), None));
            ranked.push(RankedCompound {
                rank: ranked.len() + 1,
                compound_id: job.compound_id,
                name,
                category,
                affinity,
                job_id: job.id,
            });
        }
        Ok(ranked)
    }
}

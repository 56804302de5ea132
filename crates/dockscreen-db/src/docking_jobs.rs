//! Docking job repository.
//!
//! Jobs are append-only: a compound may accumulate many rows. Status moves
//! forward only, and the terminal write (COMPLETED or FAILED) happens once.

use crate::database::{Database, Tables};
use crate::error::{DbError, Result};
use crate::schema::{DockingJob, DockingStatus, FailureKind};
use chrono::Utc;
use dockscreen_common::CompoundId;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for docking job operations.
#[derive(Clone)]
pub struct DockingJobRepository {
    db: Arc<Database>,
}

impl DockingJobRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert a new job record.
    pub async fn insert(&self, job: &DockingJob) -> Result<()> {
        let job = job.clone();
        self.db
            .write(move |t| {
                if t.docking_jobs.iter().any(|j| j.id == job.id) {
                    return Err(DbError::Duplicate(format!("docking job {}", job.id)));
                }
                t.docking_jobs.push(job);
                Ok(())
            })
            .await
    }

    /// Find a job by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<DockingJob>> {
        Ok(self
            .db
            .read(|t| t.docking_jobs.iter().find(|j| j.id == id).cloned())
            .await)
    }

    /// Most recently created job for a compound, whatever its status.
    pub async fn find_latest_by_compound(&self, compound_id: CompoundId) -> Result<Option<DockingJob>> {
        Ok(self
            .db
            .read(|t| {
                t.docking_jobs
                    .iter()
                    .filter(|j| j.compound_id == compound_id)
                    // max_by_key keeps the last of equal keys, i.e. the latest insert
                    .max_by_key(|j| j.created_at)
                    .cloned()
            })
            .await)
    }

    /// Completed job with the lowest (strongest) affinity for a compound.
    pub async fn find_best_by_compound(&self, compound_id: CompoundId) -> Result<Option<DockingJob>> {
        Ok(self
            .db
            .read(|t| best_completed(t, compound_id).cloned())
            .await)
    }

    /// Full history for a compound, newest first.
    pub async fn list_by_compound(&self, compound_id: CompoundId) -> Result<Vec<DockingJob>> {
        Ok(self
            .db
            .read(|t| {
                let mut jobs: Vec<DockingJob> = t
                    .docking_jobs
                    .iter()
                    .filter(|j| j.compound_id == compound_id)
                    .cloned()
                    .collect();
                jobs.reverse();
                jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                jobs
            })
            .await)
    }

    /// Best completed job per compound, ranked by affinity ascending.
    pub async fn ranked_best(&self, limit: usize) -> Result<Vec<DockingJob>> {
        Ok(self
            .db
            .read(|t| {
                let mut best: HashMap<CompoundId, &DockingJob> = HashMap::new();
                for job in completed(t) {
                    let replace = match best.get(&job.compound_id) {
                        Some(current) => cmp_affinity(job, current) == Ordering::Less,
                        None => true,
                    };
                    if replace {
                        best.insert(job.compound_id, job);
                    }
                }
                let mut ranked: Vec<DockingJob> = best.into_values().cloned().collect();
                ranked.sort_by(|a, b| cmp_affinity(a, b).then(a.compound_id.cmp(&b.compound_id)));
                ranked.truncate(limit);
                ranked
            })
            .await)
    }

    /// Jobs still PENDING or RUNNING, oldest first.
    pub async fn list_unfinished(&self) -> Result<Vec<DockingJob>> {
        Ok(self
            .db
            .read(|t| {
                let mut jobs: Vec<DockingJob> = t
                    .docking_jobs
                    .iter()
                    .filter(|j| !j.status.is_terminal())
                    .cloned()
                    .collect();
                jobs.sort_by_key(|j| j.created_at);
                jobs
            })
            .await)
    }

    /// PENDING -> RUNNING.
    pub async fn mark_running(&self, id: Uuid) -> Result<DockingJob> {
        self.transition(id, DockingStatus::Running, |_| {}).await
    }

    /// RUNNING -> COMPLETED with the parsed affinity and the raw tool log.
    pub async fn complete(&self, id: Uuid, affinity: f64, log: String) -> Result<DockingJob> {
        self.transition(id, DockingStatus::Completed, move |job| {
            job.affinity = Some(affinity);
            job.log = Some(log);
        })
        .await
    }

    /// PENDING or RUNNING -> FAILED with a reason and diagnostic text.
    pub async fn fail(&self, id: Uuid, kind: FailureKind, log: String) -> Result<DockingJob> {
        self.transition(id, DockingStatus::Failed, move |job| {
            job.failure = Some(kind);
            job.log = Some(log);
        })
        .await
    }

    async fn transition(
        &self,
        id: Uuid,
        next: DockingStatus,
        apply: impl FnOnce(&mut DockingJob) + Send,
    ) -> Result<DockingJob> {
        self.db
            .write(move |t| {
                let job = t
                    .docking_jobs
                    .iter_mut()
                    .find(|j| j.id == id)
                    .ok_or_else(|| DbError::NotFound(format!("docking job {}", id)))?;
                if !job.status.can_transition_to(next) {
                    return Err(DbError::InvalidTransition {
                        job_id: id,
                        from: job.status,
                        to: next,
                    });
                }
                job.status = next;
                job.updated_at = Utc::now();
                apply(job);
                Ok(job.clone())
            })
            .await
    }
}

fn completed(t: &Tables) -> impl Iterator<Item = &DockingJob> {
    t.docking_jobs
        .iter()
        .filter(|j| j.status == DockingStatus::Completed && j.affinity.is_some())
}

fn best_completed(t: &Tables, compound_id: CompoundId) -> Option<&DockingJob> {
    completed(t)
        .filter(|j| j.compound_id == compound_id)
        .min_by(|a, b| cmp_affinity(a, b))
}

fn cmp_affinity(a: &DockingJob, b: &DockingJob) -> Ordering {
    let a = a.affinity.unwrap_or(f64::INFINITY);
    let b = b.affinity.unwrap_or(f64::INFINITY);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn repo() -> DockingJobRepository {
        DockingJobRepository::new(Arc::new(Database::in_memory()))
    }

    async fn completed_job(repo: &DockingJobRepository, compound_id: CompoundId, affinity: f64) -> DockingJob {
        let job = DockingJob::new(compound_id);
        repo.insert(&job).await.unwrap();
        repo.mark_running(job.id).await.unwrap();
        repo.complete(job.id, affinity, "log".to_string()).await.unwrap()
    }

    #[tokio::test]
    async fn test_lifecycle_and_write_once_terminal() {
        let repo = repo();
        let job = DockingJob::new(1);
        repo.insert(&job).await.unwrap();

        let running = repo.mark_running(job.id).await.unwrap();
        assert_eq!(running.status, DockingStatus::Running);

        let done = repo.complete(job.id, -8.3, "vina output".to_string()).await.unwrap();
        assert_eq!(done.status, DockingStatus::Completed);
        assert_eq!(done.affinity, Some(-8.3));

        let err = repo
            .fail(job.id, FailureKind::Internal, "late failure".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidTransition { from: DockingStatus::Completed, to: DockingStatus::Failed, .. }
        ));

        let err = repo.mark_running(job.id).await.unwrap_err();
        assert!(matches!(err, DbError::InvalidTransition { .. }));

        // The stored record is untouched by the rejected writes
        let stored = repo.find_by_id(job.id).await.unwrap().unwrap();
        assert_eq!(stored.affinity, Some(-8.3));
        assert_eq!(stored.log.as_deref(), Some("vina output"));
        assert!(stored.failure.is_none());
    }

    #[tokio::test]
    async fn test_pending_can_fail_directly() {
        let repo = repo();
        let job = DockingJob::new(1);
        repo.insert(&job).await.unwrap();
        let failed = repo
            .fail(job.id, FailureKind::MissingInput, "ligand missing".to_string())
            .await
            .unwrap();
        assert_eq!(failed.status, DockingStatus::Failed);
        assert_eq!(failed.failure, Some(FailureKind::MissingInput));
    }

    #[tokio::test]
    async fn test_pending_cannot_complete_without_running() {
        let repo = repo();
        let job = DockingJob::new(1);
        repo.insert(&job).await.unwrap();
        assert!(repo.complete(job.id, -7.0, String::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_best_and_latest_differ() {
        let repo = repo();
        let strong = completed_job(&repo, 5, -9.1).await;
        let _weak = completed_job(&repo, 5, -7.4).await;

        // A newer job that failed
        let mut failed = DockingJob::new(5);
        failed.created_at = Utc::now() + Duration::seconds(5);
        repo.insert(&failed).await.unwrap();
        repo.fail(failed.id, FailureKind::ToolFailed, "exit 1".to_string()).await.unwrap();

        let best = repo.find_best_by_compound(5).await.unwrap().unwrap();
        assert_eq!(best.id, strong.id);

        let latest = repo.find_latest_by_compound(5).await.unwrap().unwrap();
        assert_eq!(latest.id, failed.id);

        let history = repo.list_by_compound(5).await.unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].id, failed.id);
    }

    #[tokio::test]
    async fn test_absent_results_are_none() {
        let repo = repo();
        assert!(repo.find_best_by_compound(1).await.unwrap().is_none());
        assert!(repo.find_latest_by_compound(1).await.unwrap().is_none());
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ranked_best_one_per_compound() {
        let repo = repo();
        completed_job(&repo, 1, -7.0).await;
        completed_job(&repo, 1, -8.5).await;
        completed_job(&repo, 2, -9.9).await;
        completed_job(&repo, 3, -6.1).await;

        let ranked = repo.ranked_best(10).await.unwrap();
        let order: Vec<_> = ranked.iter().map(|j| (j.compound_id, j.affinity.unwrap())).collect();
        assert_eq!(order, vec![(2, -9.9), (1, -8.5), (3, -6.1)]);

        assert_eq!(repo.ranked_best(2).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_unfinished() {
        let repo = repo();
        completed_job(&repo, 1, -7.0).await;
        let pending = DockingJob::new(2);
        repo.insert(&pending).await.unwrap();
        let running = DockingJob::new(3);
        repo.insert(&running).await.unwrap();
        repo.mark_running(running.id).await.unwrap();

        let unfinished = repo.list_unfinished().await.unwrap();
        let ids: Vec<Uuid> = unfinished.iter().map(|j| j.id).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&pending.id) && ids.contains(&running.id));
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let repo = repo();
        let job = DockingJob::new(1);
        repo.insert(&job).await.unwrap();
        assert!(matches!(repo.insert(&job).await, Err(DbError::Duplicate(_))));
    }
}

//! Database handle and table management.
//!
//! Tables live in memory behind a single async `RwLock`. When opened with a
//! path, the whole store is snapshotted to JSON after every successful write
//! (written to a temp file, then renamed over the previous snapshot).

use crate::error::{DbError, Result};
use crate::schema::{AdmetRecord, AnalysisReport, DockingJob, DockingStatus};
use dockscreen_common::{Compound, CompoundId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// All tables of the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Tables {
    #[serde(default)]
    pub compounds: BTreeMap<CompoundId, Compound>,
    #[serde(default)]
    pub docking_jobs: Vec<DockingJob>,
    #[serde(default)]
    pub admet_results: Vec<AdmetRecord>,
    #[serde(default)]
    pub analysis_reports: Vec<AnalysisReport>,
}

/// Row counts per table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseStats {
    pub compounds: usize,
    pub docking_jobs: usize,
    pub docking_jobs_pending: usize,
    pub docking_jobs_running: usize,
    pub docking_jobs_completed: usize,
    pub docking_jobs_failed: usize,
    pub admet_results: usize,
    pub analysis_reports: usize,
}

/// Main database handle.
#[derive(Debug)]
pub struct Database {
    tables: RwLock<Tables>,
    snapshot_path: Option<PathBuf>,
}

impl Database {
    /// Create a store that lives only for the lifetime of the process.
    pub fn in_memory() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            snapshot_path: None,
        }
    }

    /// Open or create a store snapshotted at the specified path.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tables = if path.exists() {
            let content = tokio::fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                Tables::default()
            } else {
                serde_json::from_str(&content)
                    .map_err(|e| DbError::CorruptSnapshot(format!("{}: {}", path.display(), e)))?
            }
        } else {
            Tables::default()
        };

        info!(
            path = %path.display(),
            compounds = tables.compounds.len(),
            docking_jobs = tables.docking_jobs.len(),
            "Opened dockscreen store"
        );

        Ok(Self {
            tables: RwLock::new(tables),
            snapshot_path: Some(path),
        })
    }

    /// Get the snapshot path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Run a read-only closure against the tables.
    pub(crate) async fn read<R>(&self, f: impl FnOnce(&Tables) -> R) -> R {
        let guard = self.tables.read().await;
        f(&guard)
    }

    /// Run a mutating closure and snapshot on success.
    ///
    /// The closure works on a staged copy of the tables. The copy replaces
    /// the live tables only after the snapshot is on disk, so an `Err` from
    /// either the closure or the write leaves the store unchanged.
    pub(crate) async fn write<R>(&self, f: impl FnOnce(&mut Tables) -> Result<R>) -> Result<R> {
        let mut guard = self.tables.write().await;
        let Some(path) = &self.snapshot_path else {
            return f(&mut guard);
        };

        let mut staged = guard.clone();
        let out = f(&mut staged)?;
        Self::persist(path, &staged).await?;
        *guard = staged;
        Ok(out)
    }

    async fn persist(path: &Path, tables: &Tables) -> Result<()> {
        let json = serde_json::to_vec_pretty(tables)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!(path = %path.display(), bytes = json.len(), "Snapshot written");
        Ok(())
    }

    /// Row counts for every table.
    pub async fn stats(&self) -> DatabaseStats {
        self.read(|t| {
            let by_status = |s: DockingStatus| t.docking_jobs.iter().filter(|j| j.status == s).count();
            DatabaseStats {
                compounds: t.compounds.len(),
                docking_jobs: t.docking_jobs.len(),
                docking_jobs_pending: by_status(DockingStatus::Pending),
                docking_jobs_running: by_status(DockingStatus::Running),
                docking_jobs_completed: by_status(DockingStatus::Completed),
                docking_jobs_failed: by_status(DockingStatus::Failed),
                admet_results: t.admet_results.len(),
                analysis_reports: t.analysis_reports.len(),
            }
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compounds::CompoundRepository;
    use crate::docking_jobs::DockingJobRepository;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_snapshot_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store").join("dockscreen.json");

        let db = Arc::new(Database::open(&path).await.unwrap());
        let compounds = CompoundRepository::new(db.clone());
        compounds
            .upsert(&Compound::new(1, "Curcumin", "curcumin", "COc1cc(C=CC(=O)CC(=O)C=Cc2ccc(O)c(OC)c2)ccc1O"))
            .await
            .unwrap();
        assert!(path.exists());

        let reopened = Arc::new(Database::open(&path).await.unwrap());
        let stats = reopened.stats().await;
        assert_eq!(stats.compounds, 1);
        let c = CompoundRepository::new(reopened).find_by_id(1).await.unwrap();
        assert_eq!(c.map(|c| c.name), Some("Curcumin".to_string()));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dockscreen.json");
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let err = Database::open(&path).await.unwrap_err();
        assert!(matches!(err, DbError::CorruptSnapshot(_)));
    }

    #[tokio::test]
    async fn test_failed_snapshot_leaves_tables_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dockscreen.json");
        let db = Arc::new(Database::open(&path).await.unwrap());
        let jobs = DockingJobRepository::new(db.clone());

        let kept = DockingJob::new(1);
        jobs.insert(&kept).await.unwrap();

        // A directory in place of the temp file makes every snapshot write fail
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();

        let lost = DockingJob::new(2);
        let err = jobs.insert(&lost).await.unwrap_err();
        assert!(matches!(err, DbError::Io(_)));
        assert!(jobs.find_by_id(lost.id).await.unwrap().is_none());

        assert!(matches!(jobs.mark_running(kept.id).await, Err(DbError::Io(_))));
        let stored = jobs.find_by_id(kept.id).await.unwrap().unwrap();
        assert_eq!(stored.status, DockingStatus::Pending);
        assert_eq!(db.stats().await.docking_jobs, 1);
    }

    #[tokio::test]
    async fn test_in_memory_has_no_path() {
        let db = Database::in_memory();
        assert!(db.path().is_none());
        assert_eq!(db.stats().await, DatabaseStats::default());
    }
}

//! Analysis report repository.
//!
//! Append-only: reports are inserted and read, never updated or deleted.

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::AnalysisReport;
use dockscreen_common::CompoundId;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for analysis report operations.
#[derive(Clone)]
pub struct AnalysisReportRepository {
    db: Arc<Database>,
}

impl AnalysisReportRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Append a report.
    pub async fn insert(&self, report: &AnalysisReport) -> Result<()> {
        let report = report.clone();
        self.db
            .write(move |t| {
                if t.analysis_reports.iter().any(|r| r.id == report.id) {
                    return Err(DbError::Duplicate(format!("analysis report {}", report.id)));
                }
                t.analysis_reports.push(report);
                Ok(())
            })
            .await
    }

    /// Find a report by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AnalysisReport>> {
        Ok(self
            .db
            .read(|t| t.analysis_reports.iter().find(|r| r.id == id).cloned())
            .await)
    }

    /// Most recent report for a compound.
    pub async fn find_latest_by_compound(&self, compound_id: CompoundId) -> Result<Option<AnalysisReport>> {
        Ok(self
            .db
            .read(|t| {
                t.analysis_reports
                    .iter()
                    .filter(|r| r.compound_id == compound_id)
                    .max_by_key(|r| r.created_at)
                    .cloned()
            })
            .await)
    }

    /// Every report for a compound, newest first.
    pub async fn list_by_compound(&self, compound_id: CompoundId) -> Result<Vec<AnalysisReport>> {
        Ok(self
            .db
            .read(|t| {
                let mut reports: Vec<AnalysisReport> = t
                    .analysis_reports
                    .iter()
                    .filter(|r| r.compound_id == compound_id)
                    .cloned()
                    .collect();
                reports.reverse();
                reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                reports
            })
            .await)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.db.read(|t| t.analysis_reports.len()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn report(compound_id: CompoundId, total: f64) -> AnalysisReport {
        AnalysisReport {
            id: Uuid::new_v4(),
            compound_id,
            total_score: total,
            potency_score: 0.0,
            safety_score: 0.0,
            druglikeness_score: 0.0,
            vetoed: total == 0.0,
            advice_tags: vec![],
            rationale: String::new(),
            docking_job_id: None,
            admet_result_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_history_is_kept() {
        let repo = AnalysisReportRepository::new(Arc::new(Database::in_memory()));
        let first = report(9, 71.5);
        let second = report(9, 0.0);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();
        repo.insert(&report(10, 50.0)).await.unwrap();

        let all = repo.list_by_compound(9).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let latest = repo.find_latest_by_compound(9).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);

        // The older report is still reachable by id
        let old = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(old.total_score, 71.5);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_reports_cannot_be_overwritten() {
        let repo = AnalysisReportRepository::new(Arc::new(Database::in_memory()));
        let r = report(1, 80.0);
        repo.insert(&r).await.unwrap();
        let mut tampered = r.clone();
        tampered.total_score = 99.0;
        assert!(matches!(repo.insert(&tampered).await, Err(DbError::Duplicate(_))));
        assert_eq!(repo.find_by_id(r.id).await.unwrap().unwrap().total_score, 80.0);
    }
}

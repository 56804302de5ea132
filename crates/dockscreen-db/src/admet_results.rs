//! ADMET result repository.
//!
//! Holds at most one record per compound. Saving a record for a compound
//! that already has one replaces it in place (same id, original created_at).

use crate::database::Database;
use crate::error::{DbError, Result};
use crate::schema::AdmetRecord;
use chrono::Utc;
use dockscreen_common::CompoundId;
use std::sync::Arc;
use uuid::Uuid;

/// Repository for ADMET result operations.
#[derive(Clone)]
pub struct AdmetResultRepository {
    db: Arc<Database>,
}

impl AdmetResultRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace the record for `record.compound_id`.
    /// Returns the stored record.
    pub async fn save(&self, record: &AdmetRecord) -> Result<AdmetRecord> {
        let mut record = record.clone();
        self.db
            .write(move |t| {
                let slot = t
                    .admet_results
                    .iter()
                    .position(|r| r.compound_id == record.compound_id);
                if let Some(idx) = slot {
                    let existing = &mut t.admet_results[idx];
                    if existing.id != record.id {
                        tracing::debug!(
                            compound_id = record.compound_id,
                            kept_id = %existing.id,
                            "Replacing ADMET record for compound, keeping original id"
                        );
                    }
                    record.id = existing.id;
                    record.created_at = existing.created_at;
                    record.updated_at = Utc::now();
                    *existing = record.clone();
                } else {
                    if t.admet_results.iter().any(|r| r.id == record.id) {
                        return Err(DbError::Duplicate(format!("admet result {}", record.id)));
                    }
                    t.admet_results.push(record.clone());
                }
                Ok(record)
            })
            .await
    }

    /// The record for a compound, if one exists.
    pub async fn find_by_compound(&self, compound_id: CompoundId) -> Result<Option<AdmetRecord>> {
        Ok(self
            .db
            .read(|t| t.admet_results.iter().find(|r| r.compound_id == compound_id).cloned())
            .await)
    }

    /// Find a record by its own ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<AdmetRecord>> {
        Ok(self
            .db
            .read(|t| t.admet_results.iter().find(|r| r.id == id).cloned())
            .await)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.db.read(|t| t.admet_results.len()).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AdmetProfile;

    #[tokio::test]
    async fn test_one_record_per_compound() {
        let repo = AdmetResultRepository::new(Arc::new(Database::in_memory()));

        let mut first = AdmetRecord::new(4, AdmetProfile::Standard);
        first.herg_toxicity = Some(0.12);
        let stored = repo.save(&first).await.unwrap();
        assert_eq!(stored.id, first.id);

        let mut second = AdmetRecord::new(4, AdmetProfile::Standard);
        second.herg_toxicity = Some(0.12);
        second.absorption = Some(0.7);
        let replaced = repo.save(&second).await.unwrap();

        assert_eq!(replaced.id, first.id, "id of the original record is kept");
        assert_eq!(repo.count().await.unwrap(), 1);
        let found = repo.find_by_compound(4).await.unwrap().unwrap();
        assert_eq!(found.absorption, Some(0.7));
        assert_eq!(found.created_at, first.created_at);
        assert!(repo.find_by_id(first.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_missing_compound_is_none() {
        let repo = AdmetResultRepository::new(Arc::new(Database::in_memory()));
        assert!(repo.find_by_compound(1).await.unwrap().is_none());
    }
}

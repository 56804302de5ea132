//! Compound repository.
//!
//! Read access for the screening core plus the upsert used by the import command.

use crate::database::Database;
use crate::error::Result;
use dockscreen_common::{Compound, CompoundId};
use std::sync::Arc;

/// Repository for compound operations.
#[derive(Clone)]
pub struct CompoundRepository {
    db: Arc<Database>,
}

impl CompoundRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Insert or replace a compound keyed by its id.
    pub async fn upsert(&self, compound: &Compound) -> Result<()> {
        let compound = compound.clone();
        self.db
            .write(move |t| {
                t.compounds.insert(compound.id, compound);
                Ok(())
            })
            .await
    }

    /// Insert or replace many compounds in one write.
    pub async fn upsert_batch(&self, compounds: &[Compound]) -> Result<usize> {
        if compounds.is_empty() {
            return Ok(0);
        }
        let compounds = compounds.to_vec();
        self.db
            .write(move |t| {
                let n = compounds.len();
                for c in compounds {
                    t.compounds.insert(c.id, c);
                }
                Ok(n)
            })
            .await
    }

    /// Find a compound by ID.
    pub async fn find_by_id(&self, id: CompoundId) -> Result<Option<Compound>> {
        Ok(self.db.read(|t| t.compounds.get(&id).cloned()).await)
    }

    /// All compounds ordered by id.
    pub async fn list(&self) -> Result<Vec<Compound>> {
        Ok(self.db.read(|t| t.compounds.values().cloned().collect()).await)
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.db.read(|t| t.compounds.len()).await)
    }
}

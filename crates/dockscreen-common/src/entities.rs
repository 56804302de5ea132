/// Core entity types shared by the docking, ADMET and scoring services.
/// Compounds are owned by the compound catalogue; the screening core only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric identifier assigned by the compound catalogue.
pub type CompoundId = i64;

// ---------------------------------------------------------------------------
// Compound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compound {
    pub id: CompoundId,
    pub name: String,
    /// File stem of the prepared ligand, e.g. `palbociclib` for `palbociclib.pdbqt`.
    pub ligand_stem: String,
    pub smiles: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub molecular_weight: Option<f64>,
    #[serde(default)]
    pub logp: Option<f64>,
    #[serde(default)]
    pub heavy_atom_count: Option<u32>,
    #[serde(default)]
    pub hbd: Option<u32>,
    #[serde(default)]
    pub hba: Option<u32>,
    /// Tanimoto similarity to the reference inhibitor (0.0 - 1.0)
    #[serde(default)]
    pub reference_similarity: Option<f64>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Compound {
    pub fn new(id: CompoundId, name: &str, ligand_stem: &str, smiles: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            ligand_stem: ligand_stem.to_string(),
            smiles: smiles.to_string(),
            category: None,
            molecular_weight: None,
            logp: None,
            heavy_atom_count: None,
            hbd: None,
            hba: None,
            reference_similarity: None,
            created_at: Utc::now(),
        }
    }

    /// Builder-style setter for the physicochemical descriptors.
    pub fn with_descriptors(mut self, molecular_weight: f64, logp: f64) -> Self {
        self.molecular_weight = Some(molecular_weight);
        self.logp = Some(logp);
        self
    }

    pub fn with_counts(mut self, heavy_atoms: u32, hbd: u32, hba: u32) -> Self {
        self.heavy_atom_count = Some(heavy_atoms);
        self.hbd = Some(hbd);
        self.hba = Some(hba);
        self
    }

    pub fn with_similarity(mut self, similarity: f64) -> Self {
        self.reference_similarity = Some(similarity);
        self
    }
}

//! Multi-criteria compound scoring with a hard safety veto.
//!
//! Three modules contribute to a 100-point total:
//!   Safety (35) + Potency (45) + Drug-likeness (20)
//! A toxicity risk above 0.7 vetoes the compound outright: every score is
//! zero and no other module runs.

use crate::admet::Metric;
use crate::error::ScoringError;
use chrono::Utc;
use dockscreen_common::{Compound, CompoundId};
use dockscreen_db::{
    AdmetProfile, AdmetRecord, AdmetResultRepository, AnalysisReport, AnalysisReportRepository,
    CompoundRepository, Database, DockingJob, DockingJobRepository,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

pub const VETO_THRESHOLD: f64 = 0.7;
pub const SAFETY_MAX: f64 = 35.0;
pub const POTENCY_MAX: f64 = 45.0;
pub const DRUGLIKENESS_MAX: f64 = 20.0;

/// Similarity assumed when the catalogue has none on record.
pub const DEFAULT_SIMILARITY: f64 = 0.65;

// ---------------------------------------------------------------------------
// Inputs and outputs
// ---------------------------------------------------------------------------

/// Toxicity view of an ADMET record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToxicityProfile {
    pub risk: f64,         // hERG risk, or overall toxicity for the legacy profile
    pub mutagenic: bool,   // Ames positive
    pub hepatotoxic: bool, // DILI positive
}

impl ToxicityProfile {
    pub fn from_record(record: &AdmetRecord) -> Self {
        match record.profile {
            AdmetProfile::Standard => Self {
                risk: Metric::HergToxicity.value_or_default(record),
                mutagenic: Metric::AmesToxicity.value_or_default(record) >= 0.5,
                hepatotoxic: Metric::LiverToxicity.value_or_default(record) >= 0.5,
            },
            AdmetProfile::Legacy => Self {
                risk: Metric::Toxicity.value_or_default(record),
                mutagenic: false,
                hepatotoxic: false,
            },
        }
    }
}

/// Everything the rubric reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringInput {
    pub affinity: f64,                 // kcal/mol
    pub similarity: Option<f64>,       // Tanimoto to the reference inhibitor
    pub heavy_atoms: Option<u32>,
    pub molecular_weight: f64,
    pub logp: f64,
    pub hbd: Option<u32>,
    pub hba: Option<u32>,
    pub toxicity: ToxicityProfile,
}

impl ScoringInput {
    /// Assemble from stored records. Molecular weight and logP are required.
    pub fn from_records(
        compound: &Compound,
        docking: &DockingJob,
        admet: &AdmetRecord,
    ) -> Result<Self, ScoringError> {
        let affinity = docking
            .affinity
            .ok_or(ScoringError::MissingDependency("docking result"))?;
        let molecular_weight = compound.molecular_weight.ok_or(ScoringError::MissingDescriptor {
            compound_id: compound.id,
            descriptor: "molecular_weight",
        })?;
        let logp = compound.logp.ok_or(ScoringError::MissingDescriptor {
            compound_id: compound.id,
            descriptor: "logp",
        })?;

        Ok(Self {
            affinity,
            similarity: compound.reference_similarity,
            heavy_atoms: compound.heavy_atom_count.filter(|n| *n > 0),
            molecular_weight,
            logp,
            hbd: compound.hbd,
            hba: compound.hba,
            toxicity: ToxicityProfile::from_record(admet),
        })
    }
}

/// Points awarded per criterion, before rounding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub herg: f64,
    pub ames: f64,
    pub liver: f64,
    pub affinity: f64,
    pub similarity: f64,
    pub ligand_efficiency: f64,
    pub logp: f64,
    pub molecular_weight: f64,
    pub hydrogen_bonding: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringResult {
    pub total_score: f64,
    pub potency_score: f64,
    pub safety_score: f64,
    pub druglikeness_score: f64,
    pub vetoed: bool,
    pub advice_tags: Vec<String>,
    pub rationale: Vec<String>,
    pub breakdown: ScoreBreakdown,
}

impl ScoringResult {
    /// Package as a new report row.
    pub fn into_report(
        self,
        compound_id: CompoundId,
        docking_job_id: Option<Uuid>,
        admet_result_id: Option<Uuid>,
    ) -> AnalysisReport {
        AnalysisReport {
            id: Uuid::new_v4(),
            compound_id,
            total_score: self.total_score,
            potency_score: self.potency_score,
            safety_score: self.safety_score,
            druglikeness_score: self.druglikeness_score,
            vetoed: self.vetoed,
            advice_tags: self.advice_tags,
            rationale: self.rationale.join("\n"),
            docking_job_id,
            admet_result_id,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rubric
// ---------------------------------------------------------------------------

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Binding points (max 30): full at -10 kcal/mol or stronger, none weaker
/// than -6, linear in between.
pub fn affinity_points(affinity: f64) -> f64 {
    if affinity <= -10.0 {
        30.0
    } else if affinity > -6.0 {
        0.0
    } else {
        30.0 * (affinity + 6.0) / -4.0
    }
}

#[derive(Default)]
struct Notes {
    tags: Vec<String>,
    rationale: Vec<String>,
}

impl Notes {
    fn tag(&mut self, tag: &str) {
        self.tags.push(tag.to_string());
    }

    fn say(&mut self, line: String) {
        self.rationale.push(line);
    }
}

/// Score one compound. Pure; persisting is left to [`ScoringService`].
pub fn score(input: &ScoringInput) -> ScoringResult {
    let mut notes = Notes::default();
    let tox = input.toxicity;

    if tox.risk > VETO_THRESHOLD {
        notes.tag("hERG veto");
        notes.say(format!(
            "VETO: predicted cardiotoxicity risk {:.2} exceeds {:.1}. \
             Risk of fatal arrhythmia; compound rejected regardless of potency.",
            tox.risk, VETO_THRESHOLD
        ));
        return ScoringResult {
            total_score: 0.0,
            potency_score: 0.0,
            safety_score: 0.0,
            druglikeness_score: 0.0,
            vetoed: true,
            advice_tags: notes.tags,
            rationale: notes.rationale,
            breakdown: ScoreBreakdown::default(),
        };
    }

    let mut b = ScoreBreakdown::default();

    // ---- Safety (35) ----
    if tox.risk < 0.3 {
        b.herg = 15.0;
        notes.tag("Cardiac safety good");
    } else {
        b.herg = 5.0;
        notes.tag("Moderate hERG risk");
        notes.say(format!(
            "Safety: moderate hERG risk ({:.2}); cardiac liability needs follow-up.",
            tox.risk
        ));
    }
    if tox.mutagenic {
        notes.tag("Mutagenicity risk");
        notes.say("Safety: Ames test predicted positive; possible mutagenic or carcinogenic liability.".to_string());
    } else {
        b.ames = 10.0;
    }
    if tox.hepatotoxic {
        notes.tag("Hepatotoxicity risk");
        notes.say("Safety: drug-induced liver injury predicted.".to_string());
    } else {
        b.liver = 10.0;
    }
    let safety = round1(b.herg + b.ames + b.liver);
    notes.say(format!("Safety score {:.1}/{:.0}", safety, SAFETY_MAX));

    // ---- Potency (45) ----
    b.affinity = affinity_points(input.affinity);
    if b.affinity >= 30.0 {
        notes.tag("Exceptional binding");
    } else if b.affinity == 0.0 {
        notes.tag("Weak binding");
        notes.say(format!(
            "Potency: affinity {:.1} kcal/mol is weaker than -6.0; no binding points.",
            input.affinity
        ));
    } else {
        notes.tag("Moderate binding");
        notes.say(format!(
            "Potency: affinity {:.1} kcal/mol earns {:.1}/30 binding points.",
            input.affinity, b.affinity
        ));
    }

    let similarity = match input.similarity {
        Some(s) => s,
        None => {
            notes.say(format!(
                "Potency: no reference similarity on record; assumed {:.2}.",
                DEFAULT_SIMILARITY
            ));
            DEFAULT_SIMILARITY
        }
    };
    if similarity >= 0.7 {
        b.similarity = 10.0;
        notes.tag("Established scaffold");
    } else if similarity >= 0.5 {
        b.similarity = 5.0;
        notes.tag("Partial scaffold match");
        notes.say(format!(
            "Potency: similarity {:.2} to known inhibitors is moderate.",
            similarity
        ));
    } else {
        b.similarity = 2.0;
        notes.tag("Novel scaffold");
        notes.say(format!(
            "Potency: low similarity ({:.2}) to known inhibitors; novel scaffold, riskier but more innovative.",
            similarity
        ));
    }

    let heavy_atoms = match input.heavy_atoms {
        Some(n) => f64::from(n),
        None => {
            let estimate = (input.molecular_weight / 12.0).round().max(1.0);
            notes.say(format!(
                "Potency: heavy atom count unknown; estimated {:.0} from molecular weight.",
                estimate
            ));
            estimate
        }
    };
    let ligand_efficiency = -input.affinity / heavy_atoms;
    if ligand_efficiency >= 0.3 {
        b.ligand_efficiency = 5.0;
        notes.tag("High ligand efficiency");
    } else {
        notes.tag("Low ligand efficiency");
        notes.say(format!(
            "Potency: ligand efficiency {:.2} is below 0.30 kcal/mol per heavy atom.",
            ligand_efficiency
        ));
    }
    let potency = round1(b.affinity + b.similarity + b.ligand_efficiency);
    notes.say(format!(
        "Potency {:.1}/{:.0} (Affinity {:.1} kcal/mol)",
        potency, POTENCY_MAX, input.affinity
    ));

    // ---- Drug-likeness (20) ----
    let logp = input.logp;
    if (0.0..=3.0).contains(&logp) {
        b.logp = 10.0;
    } else if (logp > 3.0 && logp <= 4.0) || (-1.0..0.0).contains(&logp) {
        b.logp = 6.0;
        notes.tag("Borderline LogP");
        notes.say(format!("Drug-likeness: logP {:.2} is outside the 0-3 optimum.", logp));
    } else {
        notes.tag("Poor LogP");
        notes.say(format!("Drug-likeness: logP {:.2} is far outside the 0-3 optimum.", logp));
    }

    let mw = input.molecular_weight;
    if (300.0..=500.0).contains(&mw) {
        b.molecular_weight = 5.0;
    } else if (250.0..300.0).contains(&mw) || (mw > 500.0 && mw <= 550.0) {
        b.molecular_weight = 3.0;
        notes.tag("Borderline molecular weight");
        notes.say(format!("Drug-likeness: molecular weight {:.1} is outside 300-500 Da.", mw));
    } else {
        notes.tag("Poor molecular weight");
        notes.say(format!("Drug-likeness: molecular weight {:.1} is far outside 300-500 Da.", mw));
    }

    match (input.hbd, input.hba) {
        (Some(hbd), Some(hba)) if hbd <= 5 && hba <= 10 => b.hydrogen_bonding = 5.0,
        (Some(hbd), Some(hba)) => {
            b.hydrogen_bonding = 2.0;
            notes.tag("Excess H-bonding");
            notes.say(format!(
                "Drug-likeness: {} donors / {} acceptors exceed the 5/10 limits.",
                hbd, hba
            ));
        }
        _ => {
            b.hydrogen_bonding = 2.0;
            notes.tag("H-bond counts unknown");
            notes.say("Drug-likeness: donor/acceptor counts not on record.".to_string());
        }
    }
    let druglikeness = round1(b.logp + b.molecular_weight + b.hydrogen_bonding);
    notes.say(format!("Drug-likeness {:.1}/{:.0}", druglikeness, DRUGLIKENESS_MAX));

    ScoringResult {
        total_score: round1(safety + potency + druglikeness),
        potency_score: potency,
        safety_score: safety,
        druglikeness_score: druglikeness,
        vetoed: false,
        advice_tags: notes.tags,
        rationale: notes.rationale,
        breakdown: b,
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Scores stored compounds and keeps the report history.
#[derive(Clone)]
pub struct ScoringService {
    compounds: CompoundRepository,
    jobs: DockingJobRepository,
    admet: AdmetResultRepository,
    reports: AnalysisReportRepository,
}

impl ScoringService {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            compounds: CompoundRepository::new(db.clone()),
            jobs: DockingJobRepository::new(db.clone()),
            admet: AdmetResultRepository::new(db.clone()),
            reports: AnalysisReportRepository::new(db),
        }
    }

    /// Score a compound from its best docking result and its ADMET record,
    /// and append the report.
    #[instrument(skip(self))]
    pub async fn analyze(&self, compound_id: CompoundId) -> Result<AnalysisReport, ScoringError> {
        let compound = self
            .compounds
            .find_by_id(compound_id)
            .await?
            .ok_or(ScoringError::UnknownCompound(compound_id))?;
        let docking = self
            .jobs
            .find_best_by_compound(compound_id)
            .await?
            .ok_or(ScoringError::MissingDependency("docking result"))?;
        let admet = self
            .admet
            .find_by_compound(compound_id)
            .await?
            .ok_or(ScoringError::MissingDependency("ADMET result"))?;

        let input = ScoringInput::from_records(&compound, &docking, &admet)?;
        let result = score(&input);
        if result.vetoed {
            warn!(risk = input.toxicity.risk, "Compound vetoed on cardiotoxicity");
        }

        let report = result.into_report(compound_id, Some(docking.id), Some(admet.id));
        self.reports.insert(&report).await?;
        info!(
            report_id = %report.id,
            total = report.total_score,
            vetoed = report.vetoed,
            "Analysis report stored"
        );
        Ok(report)
    }

    pub async fn latest_report(&self, compound_id: CompoundId) -> Result<Option<AnalysisReport>, ScoringError> {
        Ok(self.reports.find_latest_by_compound(compound_id).await?)
    }

    pub async fn report(&self, id: Uuid) -> Result<Option<AnalysisReport>, ScoringError> {
        Ok(self.reports.find_by_id(id).await?)
    }

    /// Full scoring history, newest first.
    pub async fn reports_for_compound(&self, compound_id: CompoundId) -> Result<Vec<AnalysisReport>, ScoringError> {
        Ok(self.reports.list_by_compound(compound_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strong_candidate() -> ScoringInput {
        ScoringInput {
            affinity: -9.2,
            similarity: Some(0.75),
            heavy_atoms: Some(23),
            molecular_weight: 410.0,
            logp: 2.1,
            hbd: Some(3),
            hba: Some(5),
            toxicity: ToxicityProfile {
                risk: 0.2,
                mutagenic: false,
                hepatotoxic: false,
            },
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let result = score(&strong_candidate());
        assert!(!result.vetoed);
        assert_eq!(result.safety_score, 35.0);
        assert_eq!(result.potency_score, 39.0);
        assert_eq!(result.druglikeness_score, 20.0);
        assert_eq!(result.total_score, 94.0);
        assert!(result.advice_tags.contains(&"High ligand efficiency".to_string()));
    }

    #[test]
    fn test_veto_dominates() {
        let mut input = strong_candidate();
        input.affinity = -12.5;
        input.toxicity.risk = 0.85;
        let result = score(&input);

        assert!(result.vetoed);
        assert_eq!(result.total_score, 0.0);
        assert_eq!(result.potency_score, 0.0);
        assert_eq!(result.safety_score, 0.0);
        assert_eq!(result.druglikeness_score, 0.0);
        assert_eq!(result.advice_tags, vec!["hERG veto".to_string()]);
        assert_eq!(result.rationale.len(), 1);
    }

    #[test]
    fn test_risk_at_threshold_is_not_vetoed() {
        let mut input = strong_candidate();
        input.toxicity.risk = 0.7;
        let result = score(&input);
        assert!(!result.vetoed);
        assert_eq!(result.breakdown.herg, 5.0);
        assert!(result.total_score > 0.0);
    }

    #[test]
    fn test_affinity_interpolation() {
        assert_eq!(affinity_points(-6.0), 0.0);
        assert_eq!(affinity_points(-10.0), 30.0);
        assert_eq!(affinity_points(-8.0), 15.0);
        assert_eq!(affinity_points(-5.9), 0.0);
        assert_eq!(affinity_points(-13.0), 30.0);
    }

    #[test]
    fn test_bounds_hold_across_inputs() {
        let affinities = [-14.0, -10.0, -8.7, -6.0, -3.0];
        let risks = [0.0, 0.29, 0.5, 0.7];
        let logps = [-2.0, -0.5, 1.0, 3.5, 6.0];
        let weights = [180.0, 275.0, 420.0, 530.0, 800.0];

        for &affinity in &affinities {
            for &risk in &risks {
                for &logp in &logps {
                    for &mw in &weights {
                        let input = ScoringInput {
                            affinity,
                            logp,
                            molecular_weight: mw,
                            similarity: Some(0.4),
                            heavy_atoms: None,
                            hbd: Some(7),
                            hba: None,
                            toxicity: ToxicityProfile {
                                risk,
                                mutagenic: risk > 0.4,
                                hepatotoxic: false,
                            },
                        };
                        let r = score(&input);
                        assert!(!r.vetoed);
                        assert!(r.total_score > 0.0 && r.total_score <= 100.0);
                        assert!(r.safety_score <= SAFETY_MAX);
                        assert!(r.potency_score <= POTENCY_MAX);
                        assert!(r.druglikeness_score <= DRUGLIKENESS_MAX);
                        let sum = r.safety_score + r.potency_score + r.druglikeness_score;
                        assert!((r.total_score - sum).abs() < 0.05);
                    }
                }
            }
        }
    }

    #[test]
    fn test_weaknesses_accumulate_in_order() {
        let input = ScoringInput {
            affinity: -5.0,
            similarity: Some(0.3),
            heavy_atoms: Some(40),
            molecular_weight: 600.0,
            logp: 5.2,
            hbd: Some(6),
            hba: Some(12),
            toxicity: ToxicityProfile {
                risk: 0.5,
                mutagenic: true,
                hepatotoxic: true,
            },
        };
        let result = score(&input);
        assert_eq!(
            result.advice_tags,
            vec![
                "Moderate hERG risk",
                "Mutagenicity risk",
                "Hepatotoxicity risk",
                "Weak binding",
                "Novel scaffold",
                "Low ligand efficiency",
                "Poor LogP",
                "Poor molecular weight",
                "Excess H-bonding",
            ]
        );
        assert_eq!(result.safety_score, 5.0);
        assert_eq!(result.potency_score, 2.0);
        assert_eq!(result.druglikeness_score, 2.0);
        assert_eq!(result.total_score, 9.0);
    }

    #[test]
    fn test_missing_descriptors_are_estimated() {
        let mut input = strong_candidate();
        input.similarity = None;
        input.heavy_atoms = None;
        let result = score(&input);
        // 0.65 falls in the partial band; 410/12 rounds to 34 atoms, LE 0.27
        assert_eq!(result.breakdown.similarity, 5.0);
        assert_eq!(result.breakdown.ligand_efficiency, 0.0);
        assert!(result.rationale.iter().any(|l| l.contains("assumed 0.65")));
        assert!(result.rationale.iter().any(|l| l.contains("estimated 34")));
    }

    #[test]
    fn test_legacy_profile_uses_overall_toxicity() {
        let mut record = AdmetRecord::new(1, AdmetProfile::Legacy);
        record.toxicity = Some(0.9);
        record.ames_toxicity = Some(1.0);
        let tox = ToxicityProfile::from_record(&record);
        assert_eq!(tox.risk, 0.9);
        assert!(!tox.mutagenic);
    }

    #[tokio::test]
    async fn test_analyze_requires_prerequisites() {
        let db = Arc::new(Database::in_memory());
        let compound = Compound::new(3, "Roscovitine", "roscovitine", "CCC(CO)NC1=NC2=C(N=CN2C(C)C)C(=N1)NCC1=CC=CC=C1")
            .with_descriptors(354.5, 3.2)
            .with_counts(26, 3, 6);
        CompoundRepository::new(db.clone()).upsert(&compound).await.unwrap();
        let service = ScoringService::new(db.clone());

        assert!(matches!(service.analyze(99).await, Err(ScoringError::UnknownCompound(99))));
        assert!(matches!(
            service.analyze(3).await,
            Err(ScoringError::MissingDependency("docking result"))
        ));

        let jobs = DockingJobRepository::new(db.clone());
        let job = DockingJob::new(3);
        jobs.insert(&job).await.unwrap();
        jobs.mark_running(job.id).await.unwrap();
        jobs.complete(job.id, -8.0, String::new()).await.unwrap();
        assert!(matches!(
            service.analyze(3).await,
            Err(ScoringError::MissingDependency("ADMET result"))
        ));

        let mut admet = AdmetRecord::new(3, AdmetProfile::Standard);
        admet.herg_toxicity = Some(0.1);
        AdmetResultRepository::new(db.clone()).save(&admet).await.unwrap();

        let first = service.analyze(3).await.unwrap();
        let second = service.analyze(3).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.total_score, second.total_score);
        assert_eq!(first.docking_job_id, Some(job.id));
        assert_eq!(service.reports_for_compound(3).await.unwrap().len(), 2);
        assert_eq!(service.latest_report(3).await.unwrap().unwrap().id, second.id);
        assert!(service.report(first.id).await.unwrap().is_some());
    }
}

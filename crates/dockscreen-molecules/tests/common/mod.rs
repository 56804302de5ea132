//! Shared fixtures: a docking work directory with a scripted stand-in for Vina.

#![allow(dead_code)]

use dockscreen_common::Compound;
use dockscreen_db::{CompoundRepository, Database};
use dockscreen_molecules::docking::{DockingSettings, VinaRunner};
use dockscreen_molecules::jobs::DockingOrchestrator;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Prints a Vina-style result table. Ligands whose name contains `potent`
/// bind at -10.4, everything else at -9.2.
pub const VINA_OK: &str = r#"
echo "AutoDock Vina v1.2.5"
echo "Ligand: $4"
case "$4" in
  *potent*) AFF=-10.4 ;;
  *) AFF=-9.2 ;;
esac
echo ""
echo "mode |   affinity | dist from best mode"
echo "     | (kcal/mol) | rmsd l.b.| rmsd u.b."
echo "-----+------------+----------+----------"
echo "   1         $AFF          0          0"
echo "   2         -6.8      1.874      2.410"
echo "Writing output ... done." >&2
"#;

pub struct Bench {
    pub dir: TempDir,
    pub db: Arc<Database>,
}

impl Bench {
    /// Work directory with the receptor and one `.pdbqt` per ligand stem.
    pub fn new(ligands: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("1e9h.pdbqt"), "REMARK receptor\n").unwrap();
        for stem in ligands {
            std::fs::write(dir.path().join(format!("{}.pdbqt", stem)), "REMARK ligand\n").unwrap();
        }
        Self {
            dir,
            db: Arc::new(Database::in_memory()),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Install an executable shell script as the Vina binary.
    pub fn fake_vina(&self, body: &str) -> PathBuf {
        let bin = self.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let exe = bin.join("vina");
        std::fs::write(&exe, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&exe, std::fs::Permissions::from_mode(0o755)).unwrap();
        exe
    }

    pub fn settings(&self, vina: PathBuf, timeout_secs: u64) -> DockingSettings {
        DockingSettings {
            vina_path: vina,
            work_dir: self.path().to_path_buf(),
            receptor: "1e9h".to_string(),
            timeout_secs,
            max_parallel: 4,
        }
    }

    pub fn orchestrator(&self, body: &str, timeout_secs: u64) -> DockingOrchestrator {
        let vina = self.fake_vina(body);
        DockingOrchestrator::new(self.db.clone(), VinaRunner::new(self.settings(vina, timeout_secs)))
    }

    pub async fn add_compound(&self, compound: Compound) -> Compound {
        CompoundRepository::new(self.db.clone()).upsert(&compound).await.unwrap();
        compound
    }
}

pub fn flavopiridol() -> Compound {
    Compound::new(
        1,
        "Flavopiridol",
        "flavopiridol",
        "CN1CCC(C(C1)O)C1=C(O)C=C(O)C2=C1OC(=CC2=O)C1=CC=CC=C1Cl",
    )
    .with_descriptors(410.0, 2.1)
    .with_counts(23, 3, 5)
    .with_similarity(0.75)
}

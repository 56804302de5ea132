//! Molecular docking using AutoDock Vina.

use crate::affinity::{parse_best_affinity, parse_modes, BindingMode};
use crate::error::DockingError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::{debug, info, warn};

/// Search box around the receptor's active site, in Angstrom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockingBox {
    pub center: [f64; 3],
    pub size: [f64; 3],
}

/// Active site of the 1E9H receptor.
pub const ACTIVE_SITE: DockingBox = DockingBox {
    center: [11.114, 27.215, 90.265],
    size: [49.0, 77.0, 23.0],
};

pub const EXHAUSTIVENESS: u32 = 16;

pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;

/// Where Vina and its inputs live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DockingSettings {
    /// Vina executable; a bare name is resolved on PATH
    #[serde(default = "default_vina_path")]
    pub vina_path: PathBuf,

    /// Directory holding the receptor, the ligands and the output poses
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Receptor file stem, `<receptor>.pdbqt` inside `work_dir`
    #[serde(default = "default_receptor")]
    pub receptor: String,

    /// Wall-clock limit per run
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Docking runs allowed at once across all compounds
    #[serde(default = "default_max_parallel")]
    pub max_parallel: usize,
}

fn default_vina_path() -> PathBuf {
    PathBuf::from("vina")
}
fn default_work_dir() -> PathBuf {
    PathBuf::from("./docking")
}
fn default_receptor() -> String {
    "1e9h".to_string()
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_max_parallel() -> usize {
    2
}

impl Default for DockingSettings {
    fn default() -> Self {
        Self {
            vina_path: default_vina_path(),
            work_dir: default_work_dir(),
            receptor: default_receptor(),
            timeout_secs: default_timeout_secs(),
            max_parallel: default_max_parallel(),
        }
    }
}

/// Outcome of a successful Vina run.
#[derive(Debug, Clone)]
pub struct DockingRun {
    pub affinity: f64,
    pub log: String,
    pub pose_path: PathBuf,
    pub elapsed: Duration,
    /// Every mode of the result table, best first
    pub modes: Vec<BindingMode>,
}

/// Wrapper for AutoDock Vina execution.
pub struct VinaRunner {
    settings: DockingSettings,
}

impl VinaRunner {
    pub fn new(settings: DockingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &DockingSettings {
        &self.settings
    }

    pub fn receptor_path(&self) -> PathBuf {
        self.settings.work_dir.join(format!("{}.pdbqt", self.settings.receptor))
    }

    pub fn ligand_path(&self, ligand_stem: &str) -> PathBuf {
        self.settings.work_dir.join(format!("{}.pdbqt", ligand_stem))
    }

    pub fn pose_path(&self, ligand_stem: &str) -> PathBuf {
        self.settings.work_dir.join(format!("{}_out.pdbqt", ligand_stem))
    }

    /// Check receptor, ligand and executable before anything is launched.
    pub fn validate(&self, ligand_stem: &str) -> Result<(), DockingError> {
        let receptor = self.receptor_path();
        if !receptor.is_file() {
            return Err(DockingError::MissingInput(format!(
                "receptor file not found: {}",
                receptor.display()
            )));
        }

        let ligand = self.ligand_path(ligand_stem);
        if !ligand.is_file() {
            return Err(DockingError::MissingInput(format!(
                "ligand file not found: {}",
                ligand.display()
            )));
        }

        // Bare names are looked up on PATH at spawn time
        let exe = &self.settings.vina_path;
        if exe.components().count() > 1 && !exe.is_file() {
            return Err(DockingError::MissingInput(format!(
                "Vina executable not found: {}",
                exe.display()
            )));
        }

        Ok(())
    }

    /// Command-line arguments for one ligand.
    pub fn command_args(&self, ligand_stem: &str) -> Vec<String> {
        let [cx, cy, cz] = ACTIVE_SITE.center;
        let [sx, sy, sz] = ACTIVE_SITE.size;
        vec![
            "--receptor".into(),
            self.receptor_path().display().to_string(),
            "--ligand".into(),
            self.ligand_path(ligand_stem).display().to_string(),
            "--center_x".into(),
            cx.to_string(),
            "--center_y".into(),
            cy.to_string(),
            "--center_z".into(),
            cz.to_string(),
            "--size_x".into(),
            sx.to_string(),
            "--size_y".into(),
            sy.to_string(),
            "--size_z".into(),
            sz.to_string(),
            "--exhaustiveness".into(),
            EXHAUSTIVENESS.to_string(),
            "--out".into(),
            self.pose_path(ligand_stem).display().to_string(),
        ]
    }

    /// Run AutoDock Vina for one ligand and read the best affinity.
    ///
    /// stdout and stderr are merged into one log. The process is killed if
    /// it outlives the configured timeout.
    pub async fn run(&self, ligand_stem: &str) -> Result<DockingRun, DockingError> {
        self.validate(ligand_stem)?;

        info!("Running AutoDock Vina on {}", ligand_stem);
        let started = Instant::now();

        let mut child = Command::new(&self.settings.vina_path)
            .args(self.command_args(ligand_stem))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(DockingError::Spawn)?;

        let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
            return Err(DockingError::Spawn(std::io::Error::other(
                "Vina output pipes were not captured",
            )));
        };

        let limit = Duration::from_secs(self.settings.timeout_secs);
        let mut log = String::new();
        let waited =
            tokio::time::timeout(limit, drain_and_wait(&mut child, stdout, stderr, &mut log)).await;

        let status = match waited {
            Ok(status) => status.map_err(DockingError::Spawn)?,
            Err(_) => {
                warn!(
                    ligand = ligand_stem,
                    limit_secs = self.settings.timeout_secs,
                    "Vina exceeded its time limit, killing"
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill Vina process: {}", e);
                }
                return Err(DockingError::Timeout {
                    limit_secs: self.settings.timeout_secs,
                    log,
                });
            }
        };

        if !status.success() {
            return Err(DockingError::ToolFailed {
                exit_code: status.code(),
                log,
            });
        }

        let Some(affinity) = parse_best_affinity(&log) else {
            return Err(DockingError::UnparsableOutput { log });
        };

        let elapsed = started.elapsed();
        let modes = parse_modes(&log);
        debug!(
            modes = modes.len(),
            "AutoDock Vina completed in {:.1}s. Output in {:?}",
            elapsed.as_secs_f64(),
            self.pose_path(ligand_stem)
        );

        Ok(DockingRun {
            affinity,
            log,
            pose_path: self.pose_path(ligand_stem),
            elapsed,
            modes,
        })
    }
}

/// Read both pipes line by line into `log` until they close, then reap.
/// `log` keeps whatever was read if the future is dropped early. Bytes that
/// are not UTF-8 (Vina echoes input paths) are replaced, never fatal.
async fn drain_and_wait(
    child: &mut Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    log: &mut String,
) -> std::io::Result<ExitStatus> {
    let mut out = BufReader::new(stdout);
    let mut err = BufReader::new(stderr);
    let (mut out_buf, mut err_buf) = (Vec::new(), Vec::new());
    let (mut out_open, mut err_open) = (true, true);

    while out_open || err_open {
        tokio::select! {
            read = out.read_until(b'\n', &mut out_buf), if out_open => {
                if read? == 0 {
                    out_open = false;
                } else {
                    push_line(log, &mut out_buf);
                }
            }
            read = err.read_until(b'\n', &mut err_buf), if err_open => {
                if read? == 0 {
                    err_open = false;
                } else {
                    push_line(log, &mut err_buf);
                }
            }
        }
    }

    child.wait().await
}

/// Move one raw line from `buf` into `log`, newline-terminated.
fn push_line(log: &mut String, buf: &mut Vec<u8>) {
    let line = String::from_utf8_lossy(buf);
    log.push_str(line.trim_end_matches(['\n', '\r']));
    log.push('\n');
    buf.clear();
}

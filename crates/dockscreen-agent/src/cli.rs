use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Dockscreen - dock, profile and score candidate CDK2 inhibitors.",
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file; defaults to ./dockscreen.toml
    #[arg(short, long, global = true, env = "DOCKSCREEN_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Load compounds from a JSON array into the catalogue.
    Import(ImportArgs),
    /// Submit a docking job for a compound.
    Dock(DockArgs),
    /// Show a docking job by id.
    Job { id: Uuid },
    /// Predict (or reuse) ADMET properties for a compound.
    Admet { compound_id: i64 },
    /// Score a compound from its docking and ADMET results.
    Score { compound_id: i64 },
    /// Dock, predict and score a compound in one go.
    Screen { compound_id: i64 },
    /// Show the scoring history of a compound, newest first.
    Reports(ReportsArgs),
    /// Rank compounds by best docking affinity.
    Top(TopArgs),
    /// Record counts per table and docking job state.
    Stats,
}

#[derive(Args, Debug)]
pub struct ImportArgs {
    /// JSON file holding an array of compounds
    #[arg(value_name = "PATH")]
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct DockArgs {
    pub compound_id: i64,

    /// Print the finished job instead of the accepted one
    #[arg(short, long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct ReportsArgs {
    pub compound_id: i64,

    /// Only the most recent report
    #[arg(long)]
    pub latest: bool,

    /// A single report by id
    #[arg(long, value_name = "UUID", conflicts_with = "latest")]
    pub id: Option<Uuid>,
}

#[derive(Args, Debug)]
pub struct TopArgs {
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,
}

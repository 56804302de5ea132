//! Command handlers for the dockscreen CLI.
//! Every handler prints pretty JSON on stdout; logs go to stderr.

mod catalog;
mod docking;
mod screening;

use crate::cli::Commands;
use crate::config::Config;
use dockscreen_db::{CompoundRepository, Database};
use dockscreen_molecules::admet::{AdmetPredictor, HttpAdmetClient};
use dockscreen_molecules::docking::VinaRunner;
use dockscreen_molecules::jobs::DockingOrchestrator;
use dockscreen_molecules::pipeline::ScreeningPipeline;
use dockscreen_molecules::scoring::ScoringService;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Services wired from configuration over one store.
pub struct App {
    pub db: Arc<Database>,
    pub compounds: CompoundRepository,
    pub docking: DockingOrchestrator,
    pub admet: AdmetPredictor,
    pub scoring: ScoringService,
    pub pipeline: ScreeningPipeline,
}

impl App {
    pub async fn build(config: &Config) -> anyhow::Result<Self> {
        let db = Arc::new(Database::open(&config.database.path).await?);
        info!("Record store opened at {}", config.database.path.display());
        Self::with_database(config, db)
    }

    pub fn with_database(config: &Config, db: Arc<Database>) -> anyhow::Result<Self> {
        let docking = DockingOrchestrator::new(db.clone(), VinaRunner::new(config.docking.clone()));
        let service = Arc::new(HttpAdmetClient::new(&config.admet)?);
        let admet = AdmetPredictor::new(service, db.clone(), config.admet.profile);
        let scoring = ScoringService::new(db.clone());
        let pipeline = ScreeningPipeline::new(db.clone(), docking.clone(), admet.clone());

        Ok(Self {
            compounds: CompoundRepository::new(db.clone()),
            db,
            docking,
            admet,
            scoring,
            pipeline,
        })
    }

    pub async fn run(&self, command: Commands) -> anyhow::Result<()> {
        match command {
            Commands::Import(args) => catalog::import(self, &args.file).await,
            Commands::Stats => catalog::stats(self).await,
            Commands::Dock(args) => docking::dock(self, args.compound_id, args.wait).await,
            Commands::Job { id } => docking::job(self, id).await,
            Commands::Top(args) => docking::top(self, args.limit).await,
            Commands::Admet { compound_id } => screening::admet(self, compound_id).await,
            Commands::Score { compound_id } => screening::score(self, compound_id).await,
            Commands::Screen { compound_id } => screening::screen(self, compound_id).await,
            Commands::Reports(args) => screening::reports(self, args).await,
        }
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use super::{print_json, App};
use anyhow::Context;
use dockscreen_common::CompoundId;
use dockscreen_db::DockingJob;
use dockscreen_molecules::affinity::{parse_modes, BindingMode};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

/// Submit a docking job. The worker lives in this process, so the command
/// always stays up until the job is terminal; `wait` only picks which view
/// of the job is printed.
pub async fn dock(app: &App, compound_id: CompoundId, wait: bool) -> anyhow::Result<()> {
    let ticket = app.docking.submit(compound_id).await?;
    if !wait {
        print_json(&ticket.job)?;
    }

    info!(job_id = %ticket.job_id(), "Waiting for docking to finish");
    let done = ticket.wait().await?;
    if wait {
        print_json(&done)?;
    }
    Ok(())
}

/// A job together with the binding modes Vina reported for it.
#[derive(Debug, Serialize)]
pub struct JobView {
    #[serde(flatten)]
    pub job: DockingJob,
    pub modes: Vec<BindingMode>,
}

impl From<DockingJob> for JobView {
    fn from(job: DockingJob) -> Self {
        let modes = job.log.as_deref().map(parse_modes).unwrap_or_default();
        Self { job, modes }
    }
}

pub async fn job(app: &App, id: Uuid) -> anyhow::Result<()> {
    let job = app
        .docking
        .job(id)
        .await?
        .with_context(|| format!("no docking job with id {}", id))?;
    print_json(&JobView::from(job))
}


pub async fn top(app: &App, limit: usize) -> anyhow::Result<()> {
    print_json(&app.docking.ranked(limit).await?)
}

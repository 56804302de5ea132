use super::{print_json, App};
use crate::cli::ReportsArgs;
use anyhow::Context;
use dockscreen_common::CompoundId;

pub async fn admet(app: &App, compound_id: CompoundId) -> anyhow::Result<()> {
    let compound = app
        .compounds
        .find_by_id(compound_id)
        .await?
        .with_context(|| format!("compound {} is not in the catalogue", compound_id))?;
    print_json(&app.admet.predict(&compound).await?)
}

pub async fn score(app: &App, compound_id: CompoundId) -> anyhow::Result<()> {
    print_json(&app.scoring.analyze(compound_id).await?)
}

pub async fn screen(app: &App, compound_id: CompoundId) -> anyhow::Result<()> {
    print_json(&app.pipeline.screen(compound_id).await?)
}

pub async fn reports(app: &App, args: ReportsArgs) -> anyhow::Result<()> {
    if let Some(id) = args.id {
        let report = app
            .scoring
            .report(id)
            .await?
            .filter(|r| r.compound_id == args.compound_id)
            .with_context(|| format!("no report {} for compound {}", id, args.compound_id))?;
        return print_json(&report);
    }

    if args.latest {
        let report = app
            .scoring
            .latest_report(args.compound_id)
            .await?
            .with_context(|| format!("compound {} has not been scored", args.compound_id))?;
        return print_json(&report);
    }

    print_json(&app.scoring.reports_for_compound(args.compound_id).await?)
}

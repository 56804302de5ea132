use super::{print_json, App};
use anyhow::Context;
use dockscreen_common::Compound;
use serde_json::json;
use std::path::Path;
use tracing::info;

pub async fn import(app: &App, file: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let compounds: Vec<Compound> = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON array of compounds", file.display()))?;

    let imported = app.compounds.upsert_batch(&compounds).await?;
    info!("Imported {} compounds from {}", imported, file.display());
    print_json(&json!({ "imported": imported, "total": app.compounds.count().await? }))
}

pub async fn stats(app: &App) -> anyhow::Result<()> {
    print_json(&app.db.stats().await)
}

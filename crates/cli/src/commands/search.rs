//! Search and recent commands - query stored inspections

use anyhow::{Context, Result};
use fleet_inspect_domain::{InspectionStore, InspectionSummary};
use std::path::PathBuf;

use crate::args::{RecentArgs, SearchArgs};
use crate::config::AppConfig;

pub async fn execute(args: SearchArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let limit = args.limit.unwrap_or(config.search.default_limit);

    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("Search query is empty");
    }

    let store = super::open_store(&config).await?;
    let result = store.search(query, limit).await;
    store.close().await;
    let results = result.context("Search failed")?;

    tracing::debug!(query = %query, limit, results = results.len(), "Search complete");
    output(&results, args.json)
}

pub async fn recent(args: RecentArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;
    let limit = args.limit.unwrap_or(config.search.default_limit);

    let store = super::open_store(&config).await?;
    let result = store.recent(limit).await;
    store.close().await;

    output(&result.context("Failed to list inspections")?, args.json)
}

fn output(results: &[InspectionSummary], json: bool) -> Result<()> {
    if json {
        let json = serde_json::to_string_pretty(results).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        super::print_summaries(results);
    }
    Ok(())
}

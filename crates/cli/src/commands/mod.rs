//! Subcommand implementations

pub mod categorize;
pub mod config;
pub mod doctor;
pub mod fatigue;
pub mod fingerprint;
pub mod ingest;
pub mod search;
pub mod stats;

use anyhow::{Context, Result};
use fleet_inspect_adapters::store::SqliteInspectionStore;
use fleet_inspect_domain::{ComplianceState, InspectionSummary};

use crate::config::AppConfig;

/// Open the configured inspection database, creating it if needed
pub(crate) async fn open_store(config: &AppConfig) -> Result<SqliteInspectionStore> {
    let path = &config.general.database_path;
    SqliteInspectionStore::new(path)
        .await
        .with_context(|| format!("Failed to open database: {}", path.display()))
}

pub(crate) fn state_symbol(state: ComplianceState) -> &'static str {
    match state {
        ComplianceState::Normal => "✓",
        ComplianceState::Warning => "⚠",
        ComplianceState::Critical => "✗",
    }
}

/// One line per inspection, for search and listing output
pub(crate) fn print_summaries(summaries: &[InspectionSummary]) {
    if summaries.is_empty() {
        println!("No inspections found.");
        return;
    }

    for summary in summaries {
        let fatigue = summary
            .fatigue_state
            .map(|s| format!("{} {}", state_symbol(s), s))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {:<12} {:<24} fatigue: {}",
            summary.fingerprint,
            summary.timestamp.date(),
            summary.plate,
            summary.driver_name,
            fatigue
        );
        if let Some(observations) = summary.observations.as_deref().filter(|o| !o.is_empty()) {
            println!("    {}", observations);
        }
    }
}

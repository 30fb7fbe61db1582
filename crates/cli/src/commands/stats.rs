//! Stats command - fleet metrics and upload statistics

use anyhow::{Context, Result};
use fleet_inspect_domain::{FleetMetrics, InspectionStore, StateCounts, UploadStats};
use serde::Serialize;
use std::path::PathBuf;
use time::format_description::well_known::Rfc3339;

use crate::args::StatsArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatsReport {
    metrics: FleetMetrics,
    uploads: UploadStats,
}

pub async fn execute(args: StatsArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let store = super::open_store(&config).await?;
    let metrics = store.fleet_metrics().await;
    let uploads = store.upload_stats().await;
    store.close().await;

    let report = StatsReport {
        metrics: metrics.context("Failed to compute fleet metrics")?,
        uploads: uploads.context("Failed to read upload statistics")?,
    };

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    Ok(())
}

fn print_report(report: &StatsReport) {
    let metrics = &report.metrics;
    let uploads = &report.uploads;

    println!("Fleet Statistics");
    println!("================");
    println!();
    println!("Inspections:     {}", metrics.totals.inspections);
    println!("Drivers:         {}", metrics.totals.drivers);
    println!("Vehicles:        {}", metrics.totals.vehicles);
    println!("Drivers at risk: {}", metrics.drivers_at_risk);
    println!();
    print_counts("Fatigue", &metrics.fatigue);
    print_counts("Driver activity", &metrics.drivers);
    print_counts("Vehicle activity", &metrics.vehicles);

    if !metrics.months.is_empty() {
        let labels: Vec<&str> = metrics.months.iter().map(|m| m.label.as_str()).collect();
        println!();
        println!("Months with data: {}", labels.join(", "));
    }

    println!();
    println!(
        "Uploads: {} total, {} successful, {} failed",
        uploads.total_uploads, uploads.successful_uploads, uploads.failed_uploads
    );
    if let Some(last) = uploads.last_upload {
        let rendered = last.format(&Rfc3339).unwrap_or_else(|_| last.to_string());
        println!("Last upload: {}", rendered);
    }
}

fn print_counts(name: &str, counts: &StateCounts) {
    println!(
        "{:<17} {} normal, {} warning, {} critical",
        format!("{}:", name),
        counts.normal,
        counts.warning,
        counts.critical
    );
}

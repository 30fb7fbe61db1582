//! Doctor command - validate configuration and show status

use anyhow::Result;
use fleet_inspect_adapters::store::SqliteInspectionStore;
use fleet_inspect_domain::{FingerprintAlgorithm, InspectionStore};
use serde::Serialize;
use std::path::PathBuf;

use crate::args::DoctorArgs;
use crate::config::AppConfig;

#[derive(Debug, Serialize)]
struct DoctorReport {
    config: CheckResult,
    database: CheckResult,
    fingerprint: CheckResult,
    upload: CheckResult,
    overall: String,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    status: String,
    message: String,
    details: Option<serde_json::Value>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn warn(message: impl Into<String>) -> Self {
        Self {
            status: "warn".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }

    fn is_error(&self) -> bool {
        self.status == "error"
    }
}

pub async fn execute(args: DoctorArgs, config_path: Option<PathBuf>) -> Result<()> {
    let mut report = DoctorReport {
        config: CheckResult::error("Not checked"),
        database: CheckResult::error("Not checked"),
        fingerprint: CheckResult::error("Not checked"),
        upload: CheckResult::error("Not checked"),
        overall: "error".to_string(),
    };

    // Check config
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(c) => {
            report.config = CheckResult::ok("Configuration loaded successfully");
            Some(c)
        }
        Err(e) => {
            report.config = CheckResult::error(format!("Failed to load config: {:#}", e));
            None
        }
    };

    if let Some(ref config) = config {
        report.database = check_database(config).await;
        report.fingerprint = check_fingerprint(config);
        report.upload = check_upload(config);
    }

    // Determine overall status
    let checks = [
        &report.config,
        &report.database,
        &report.fingerprint,
        &report.upload,
    ];

    let has_error = checks.iter().any(|c| c.is_error());
    let all_ok = checks.iter().all(|c| c.is_ok());

    report.overall = if has_error {
        "error".to_string()
    } else if all_ok {
        "ok".to_string()
    } else {
        "warn".to_string()
    };

    // Output report
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    if report.overall == "error" {
        std::process::exit(1);
    }

    Ok(())
}

async fn check_database(config: &AppConfig) -> CheckResult {
    let path = &config.general.database_path;

    // Opening creates the file, so report a missing database instead
    if !path.exists() {
        return CheckResult::warn(format!(
            "Database not created yet: {} (created by the first ingest)",
            path.display()
        ));
    }

    let store = match SqliteInspectionStore::new(path).await {
        Ok(s) => s,
        Err(e) => {
            return CheckResult::error(format!(
                "Failed to open database {}: {}",
                path.display(),
                e
            ));
        }
    };

    let metrics = store.fleet_metrics().await;
    let uploads = store.upload_stats().await;
    store.close().await;

    match (metrics, uploads) {
        (Ok(metrics), Ok(uploads)) => CheckResult::ok(format!(
            "{}: {} inspections, {} uploads",
            path.display(),
            metrics.totals.inspections,
            uploads.total_uploads
        ))
        .with_details(serde_json::json!({
            "path": path.display().to_string(),
            "inspections": metrics.totals.inspections,
            "drivers": metrics.totals.drivers,
            "vehicles": metrics.totals.vehicles,
            "uploads": uploads.total_uploads,
            "failedUploads": uploads.failed_uploads,
        })),
        (Err(e), _) | (_, Err(e)) => CheckResult::error(format!("Database query failed: {}", e)),
    }
}

fn check_fingerprint(config: &AppConfig) -> CheckResult {
    let algorithm = config.fingerprint.algorithm;
    match algorithm {
        FingerprintAlgorithm::Rolling => CheckResult::warn(format!(
            "Algorithm: {} (32-bit, collisions possible on large fleets)",
            algorithm.as_str()
        )),
        FingerprintAlgorithm::Sha256 => {
            CheckResult::ok(format!("Algorithm: {}", algorithm.as_str()))
        }
    }
}

fn check_upload(config: &AppConfig) -> CheckResult {
    let upload = &config.upload;

    if upload.allowed_extensions.is_empty() {
        return CheckResult::error("No allowed upload extensions configured");
    }

    if upload.max_file_bytes == 0 {
        return CheckResult::error("max_file_bytes is 0; every upload would be rejected");
    }

    let unsupported: Vec<&str> = upload
        .allowed_extensions
        .iter()
        .map(String::as_str)
        .filter(|e| {
            let e = e.trim_start_matches('.').to_lowercase();
            e != "json" && e != "jsonl"
        })
        .collect();

    let message = format!(
        "Extensions: {}, Max size: {} bytes",
        upload.allowed_extensions.join(", "),
        upload.max_file_bytes
    );

    if unsupported.is_empty() {
        CheckResult::ok(message)
    } else {
        CheckResult::warn(format!(
            "{} (read as JSON arrays: {})",
            message,
            unsupported.join(", ")
        ))
    }
}

fn print_report(report: &DoctorReport) {
    println!("fleet-inspect Doctor Report");
    println!("===========================");
    println!();

    print_check("Config", &report.config);
    print_check("Database", &report.database);
    print_check("Fingerprint", &report.fingerprint);
    print_check("Upload", &report.upload);

    println!();
    let symbol = match report.overall.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} Overall: {}", symbol, report.overall.to_uppercase());

    if report.overall != "error" {
        println!();
        println!("Ready! Try: fleet-inspect ingest --file <upload.json> --dry-run");
    }
}

fn print_check(name: &str, result: &CheckResult) {
    let symbol = match result.status.as_str() {
        "ok" => "✓",
        "warn" => "⚠",
        _ => "✗",
    };
    println!("{} {}: {}", symbol, name, result.message);
}

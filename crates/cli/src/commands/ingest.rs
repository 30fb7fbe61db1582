//! Ingest command - load an upload file, skip duplicates, persist the rest

use anyhow::{Context, Result};
use fleet_inspect_adapters::upload::FsUploadSource;
use fleet_inspect_domain::usecases::{IngestConfig, IngestUseCase};
use fleet_inspect_domain::{IngestReport, SystemClock, UploadSource};
use std::path::PathBuf;
use std::sync::Arc;

use crate::args::IngestArgs;
use crate::config::AppConfig;

pub async fn execute(args: IngestArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = AppConfig::load(config_path.as_deref())?;

    let source = FsUploadSource::new(
        config.upload.max_file_bytes,
        config.upload.allowed_extensions.clone(),
    );

    let store = Arc::new(super::open_store(&config).await?);
    let usecase = IngestUseCase::new(
        Arc::clone(&store),
        Arc::new(SystemClock),
        IngestConfig {
            algorithm: config.fingerprint.algorithm,
        },
    );

    let batch = match source.load(&args.file).await {
        Ok(batch) => batch,
        Err(e) => {
            if !args.dry_run {
                let file_name = args
                    .file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| args.file.display().to_string());
                usecase.reject(&file_name, &e.to_string()).await?;
            }
            store.close().await;
            return Err(e)
                .with_context(|| format!("Failed to load upload: {}", args.file.display()));
        }
    };

    tracing::info!(
        file = %batch.file_name,
        records = batch.records.len(),
        algorithm = config.fingerprint.algorithm.as_str(),
        dry_run = args.dry_run,
        "Processing upload"
    );

    let result = if args.dry_run {
        usecase.check(&batch.records).await
    } else {
        usecase.ingest(&batch.file_name, &batch.records).await
    };
    store.close().await;

    let report = result.context("Ingest failed")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        print_report(&batch.file_name, &report, args.dry_run);
    }

    Ok(())
}

fn print_report(file_name: &str, report: &IngestReport, dry_run: bool) {
    if dry_run {
        println!("Dry run: {} (nothing written)", file_name);
    } else {
        println!("Ingested: {}", file_name);
    }
    println!("================");
    println!();
    println!("Records:              {}", report.total);
    println!("New:                  {}", report.new_records);
    println!("Already stored:       {}", report.duplicates);
    println!("Repeated in file:     {}", report.in_batch_duplicates);
    if !dry_run {
        println!("Inserted:             {}", report.inserted);
    }
    println!(
        "Fatigue:              {} normal, {} warning, {} critical",
        report.fatigue.normal, report.fatigue.warning, report.fatigue.critical
    );
    println!("Critical observations: {}", report.critical_observations);

    if !report.duplicate_details.is_empty() {
        println!();
        println!("Duplicates:");
        super::print_summaries(&report.duplicate_details);
    }
}

//! Fingerprint command - compute the duplicate-detection hash of one inspection

use anyhow::{Context, Result};
use fleet_inspect_domain::compute_fingerprint_with;
use std::path::PathBuf;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::args::FingerprintArgs;
use crate::config::AppConfig;

pub async fn execute(args: FingerprintArgs, config_path: Option<PathBuf>) -> Result<()> {
    let algorithm = match args.algorithm {
        Some(algorithm) => algorithm,
        None => AppConfig::load(config_path.as_deref())?.fingerprint.algorithm,
    };

    let timestamp = OffsetDateTime::parse(&args.timestamp, &Rfc3339)
        .with_context(|| format!("Invalid timestamp (expected RFC 3339): {}", args.timestamp))?;

    let fingerprint =
        compute_fingerprint_with(algorithm, timestamp, &args.driver, &args.plate, args.mileage);

    tracing::debug!(algorithm = algorithm.as_str(), %fingerprint, "Computed fingerprint");
    println!("{}", fingerprint);

    Ok(())
}

//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use fleet_inspect_domain::FingerprintAlgorithm;
use std::path::PathBuf;

/// fleet-inspect: deduplicate, score and search vehicle inspection uploads
#[derive(Parser, Debug)]
#[command(name = "fleet-inspect")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the duplicate-detection fingerprint of one inspection
    Fingerprint(FingerprintArgs),

    /// Score a fatigue self-report
    Fatigue(FatigueArgs),

    /// Extract issue tags from inspector notes
    Categorize(CategorizeArgs),

    /// Load an upload file, skip duplicates and persist the rest
    Ingest(IngestArgs),

    /// Search stored inspections by driver, plate or observations
    Search(SearchArgs),

    /// Show the newest stored inspections
    Recent(RecentArgs),

    /// Fleet metrics and upload statistics
    Stats(StatsArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct FingerprintArgs {
    /// Inspection time (RFC 3339, e.g. 2024-03-05T14:30:00Z)
    #[arg(long)]
    pub timestamp: String,

    /// Driver's name
    #[arg(long)]
    pub driver: String,

    /// Vehicle plate
    #[arg(long)]
    pub plate: String,

    /// Odometer reading
    #[arg(long, allow_hyphen_values = true)]
    pub mileage: Option<i64>,

    /// Override the configured algorithm (rolling, sha256)
    #[arg(long)]
    pub algorithm: Option<FingerprintAlgorithm>,
}

#[derive(Args, Debug)]
pub struct FatigueArgs {
    /// Driver slept at least seven hours
    #[arg(long)]
    pub slept_seven_hours: bool,

    /// Driver reports no fatigue
    #[arg(long)]
    pub fatigue_free: bool,

    /// Driver feels fit to drive
    #[arg(long)]
    pub fit_to_drive: bool,

    /// Driver took medication that affects alertness
    #[arg(long)]
    pub took_medication: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CategorizeArgs {
    /// Text to categorize
    #[arg(long, conflicts_with = "file")]
    pub text: Option<String>,

    /// File containing text to categorize (use - for stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Upload file (.json array or .jsonl)
    #[arg(long)]
    pub file: PathBuf,

    /// Report new and duplicate records without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Text to look for
    pub query: String,

    /// Maximum results (defaults to search.default_limit)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RecentArgs {
    /// Maximum results (defaults to search.default_limit)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./fleet-inspect.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration (file and environment merged)
    Show,
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

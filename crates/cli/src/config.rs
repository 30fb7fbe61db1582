//! Configuration loading and management

use anyhow::{Context, Result};
use fleet_inspect_adapters::upload::DEFAULT_MAX_FILE_BYTES;
use fleet_inspect_domain::FingerprintAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub fingerprint: FingerprintConfig,

    #[serde(default)]
    pub upload: UploadConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FingerprintConfig {
    #[serde(default)]
    pub algorithm: FingerprintAlgorithm,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,

    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_search_limit")]
    pub default_limit: usize,
}

// Default value functions
fn default_database_path() -> PathBuf {
    PathBuf::from("./fleet-inspect.sqlite")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_file_bytes() -> u64 {
    DEFAULT_MAX_FILE_BYTES
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["json".to_string(), "jsonl".to_string()]
}

fn default_search_limit() -> usize {
    20
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            log_level: default_log_level(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_search_limit(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./fleet-inspect.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            // User specified a path that doesn't exist
            anyhow::bail!("Config file not found: {}", path.display());
        }

        // Add environment variable overrides
        builder = builder.add_source(
            config::Environment::with_prefix("FLEET_INSPECT")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# fleet-inspect configuration

[general]
database_path = "./fleet-inspect.sqlite"
log_level = "info"

[fingerprint]
# rolling: 8-hex-char rolling hash, compatible with existing data (default)
# sha256: 64-hex-char digest, far fewer collisions; do not mix with rolling data
algorithm = "rolling"

[upload]
max_file_bytes = 10485760  # 10 MiB
allowed_extensions = ["json", "jsonl"]

[search]
default_limit = 20
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_toml_matches_defaults() {
        let parsed: AppConfig = toml::from_str(&AppConfig::example_toml()).unwrap();
        let defaults = AppConfig::default();

        assert_eq!(parsed.general.database_path, defaults.general.database_path);
        assert_eq!(parsed.fingerprint.algorithm, FingerprintAlgorithm::Rolling);
        assert_eq!(parsed.upload.max_file_bytes, defaults.upload.max_file_bytes);
        assert_eq!(
            parsed.upload.allowed_extensions,
            defaults.upload.allowed_extensions
        );
        assert_eq!(parsed.search.default_limit, 20);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: AppConfig = toml::from_str("[fingerprint]\nalgorithm = \"sha256\"\n").unwrap();

        assert_eq!(parsed.fingerprint.algorithm, FingerprintAlgorithm::Sha256);
        assert_eq!(parsed.search.default_limit, 20);
        assert_eq!(parsed.upload.max_file_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let result = AppConfig::load(Some(Path::new("/nonexistent/fleet-inspect.toml")));
        assert!(result.is_err());
    }
}

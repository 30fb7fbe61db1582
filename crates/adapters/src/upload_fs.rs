//! Filesystem-based upload source

use async_trait::async_trait;
use fleet_inspect_domain::{InspectionRecord, UploadBatch, UploadError, UploadSource};
use std::path::Path;

/// Default upload size limit (10 MiB)
pub const DEFAULT_MAX_FILE_BYTES: u64 = 10 * 1024 * 1024;

/// Reads inspection uploads from `.json` (array) or `.jsonl` (one record per line) files
pub struct FsUploadSource {
    max_file_bytes: u64,
    allowed_extensions: Vec<String>,
}

impl FsUploadSource {
    pub fn new(max_file_bytes: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_file_bytes,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn check_extension(&self, path: &Path) -> Result<String, UploadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !self.allowed_extensions.contains(&extension) {
            return Err(UploadError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.join(", "),
            });
        }
        Ok(extension)
    }

    fn parse(
        file: &str,
        extension: &str,
        content: &str,
    ) -> Result<Vec<InspectionRecord>, UploadError> {
        if extension == "jsonl" {
            let mut records = Vec::new();
            for (index, line) in content.lines().enumerate() {
                if line.trim().is_empty() {
                    continue;
                }
                let record = serde_json::from_str(line).map_err(|e| UploadError::Parse {
                    file: file.to_string(),
                    message: format!("line {}: {}", index + 1, e),
                })?;
                records.push(record);
            }
            return Ok(records);
        }

        serde_json::from_str(content).map_err(|e| UploadError::Parse {
            file: file.to_string(),
            message: e.to_string(),
        })
    }
}

impl Default for FsUploadSource {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_FILE_BYTES,
            vec!["json".to_string(), "jsonl".to_string()],
        )
    }
}

#[async_trait]
impl UploadSource for FsUploadSource {
    async fn load(&self, path: &Path) -> Result<UploadBatch, UploadError> {
        let extension = self.check_extension(path)?;

        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_file_bytes {
            return Err(UploadError::TooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        let content = tokio::fs::read_to_string(path).await?;
        let records = Self::parse(&file_name, &extension, &content)?;

        tracing::debug!(file = %file_name, records = records.len(), "Loaded upload file");

        Ok(UploadBatch { file_name, records })
    }
}

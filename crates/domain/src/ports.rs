//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::{
    Fingerprint, FleetMetrics, InspectionRecord, InspectionSummary, ProcessedInspection,
    UploadRecord, UploadStats,
};

/// Error type for inspection store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting and querying inspections
#[async_trait]
pub trait InspectionStore: Send + Sync {
    /// Stored inspections whose fingerprint is one of `fingerprints`
    async fn find_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<Vec<InspectionSummary>, StoreError>;

    /// Insert all inspections or none; returns the number written
    async fn insert_inspections(
        &self,
        inspections: &[ProcessedInspection],
    ) -> Result<usize, StoreError>;

    /// Record an upload attempt
    async fn record_upload(&self, upload: &UploadRecord) -> Result<(), StoreError>;

    /// Aggregate upload counters
    async fn upload_stats(&self) -> Result<UploadStats, StoreError>;

    /// Newest inspections first
    async fn recent(&self, limit: usize) -> Result<Vec<InspectionSummary>, StoreError>;

    /// Case-insensitive substring search over driver, plate and observations
    async fn search(&self, query: &str, limit: usize)
    -> Result<Vec<InspectionSummary>, StoreError>;

    /// Dashboard figures for the whole fleet
    async fn fleet_metrics(&self) -> Result<FleetMetrics, StoreError>;
}

/// Error type for loading upload files
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file type '{extension}'. Allowed: {allowed}")]
    InvalidExtension { extension: String, allowed: String },
    #[error("File size {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },
    #[error("Parse error in {file}: {message}")]
    Parse { file: String, message: String },
}

/// Inspections read from one uploaded file
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub file_name: String,
    pub records: Vec<InspectionRecord>,
}

/// Port for reading uploaded inspection files
#[async_trait]
pub trait UploadSource: Send + Sync {
    async fn load(&self, path: &Path) -> Result<UploadBatch, UploadError>;
}

/// Port for time/clock operations (enables deterministic testing)
pub trait Clock: Send + Sync {
    /// Get the current time
    fn now(&self) -> OffsetDateTime;
}

/// Real clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

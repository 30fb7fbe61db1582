//! Domain models and value objects

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;
use uuid::Uuid;

/// A single inspection as submitted by an upload (one spreadsheet row)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionRecord {
    /// When the inspection was filled in
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Driver's full name, free text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub driver_name: String,
    /// Vehicle plate or fleet identifier, free text
    #[serde(default, deserialize_with = "null_as_empty")]
    pub plate: String,
    /// Odometer reading, if reported
    #[serde(default)]
    pub mileage: Option<i64>,
    /// Free-text notes from the inspector
    #[serde(default)]
    pub observations: Option<String>,
    /// Contract the vehicle operates under
    #[serde(default)]
    pub contract: Option<String>,
    /// Field / coordination area
    #[serde(default)]
    pub coordination_field: Option<String>,
    /// Work shift
    #[serde(default)]
    pub shift: Option<String>,
    /// Fatigue self-report, if the form included it
    #[serde(default)]
    pub fatigue: Option<FatigueAnswers>,
    /// Checklist answers (HQ-FO-40 elements)
    #[serde(default)]
    pub checklist: Vec<ChecklistAnswer>,
}

/// Spreadsheet exports write empty cells as `null`
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Duplicate-detection fingerprint of an inspection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Hash function used to fingerprint inspections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FingerprintAlgorithm {
    /// 32-bit polynomial rolling hash, 8+ hex chars (collisions expected at scale)
    #[default]
    Rolling,
    /// SHA-256 over the same canonical string, 64 hex chars
    Sha256,
}

impl FingerprintAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rolling => "rolling",
            Self::Sha256 => "sha256",
        }
    }
}

impl FromStr for FingerprintAlgorithm {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rolling" => Ok(Self::Rolling),
            "sha256" => Ok(Self::Sha256),
            other => Err(UnknownVariant {
                kind: "fingerprint algorithm",
                value: other.to_string(),
            }),
        }
    }
}

/// Result of splitting a batch of fingerprints against the stored set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatePartition {
    /// Fingerprints not present in the stored set, in candidate order
    pub new_ones: Vec<Fingerprint>,
    /// Fingerprints already stored, in candidate order
    pub duplicates: Vec<Fingerprint>,
}

/// A driver's four-question fatigue self-report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FatigueAnswers {
    pub slept_seven_hours: bool,
    pub feels_fatigue_free: bool,
    pub fit_to_drive: bool,
    pub took_alertness_affecting_medication: bool,
}

/// Traffic-light compliance classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceState {
    Normal,
    Warning,
    Critical,
}

impl ComplianceState {
    pub const ALL: [ComplianceState; 3] = [Self::Normal, Self::Warning, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Display colour of the state
    pub fn color(&self) -> &'static str {
        match self {
            Self::Normal => "green",
            Self::Warning => "yellow",
            Self::Critical => "red",
        }
    }
}

impl fmt::Display for ComplianceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplianceState {
    type Err = UnknownVariant;

    /// Accepts state names, colours and the legacy Spanish labels
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "green" | "verde" => Ok(Self::Normal),
            "warning" | "yellow" | "amarillo" => Ok(Self::Warning),
            "critical" | "red" | "rojo" => Ok(Self::Critical),
            other => Err(UnknownVariant {
                kind: "compliance state",
                value: other.to_string(),
            }),
        }
    }
}

/// Fatigue score (0-4) with its compliance state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FatigueAssessment {
    pub score: u8,
    pub state: ComplianceState,
}

/// Severity of an observation tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Urgent,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Urgent => "urgent",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehicle system an observation category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueArea {
    Safety,
    Mechanical,
    Electrical,
}

impl IssueArea {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Safety => "safety",
            Self::Mechanical => "mechanical",
            Self::Electrical => "electrical",
        }
    }
}

/// An issue heuristically extracted from inspector notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationTag {
    pub category: String,
    pub area: IssueArea,
    pub severity: Severity,
    pub description: String,
}

/// One answered checklist line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistAnswer {
    /// Element name, e.g. "FRENOS"
    pub element: String,
    /// Whether the element passed inspection
    pub compliant: bool,
}

/// Failure counts for a set of checklist answers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSummary {
    pub inspected: usize,
    pub critical_failures: usize,
    pub minor_failures: usize,
    pub failed_elements: Vec<String>,
}

/// An inspection after fingerprinting, scoring and categorisation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedInspection {
    pub id: Uuid,
    pub record: InspectionRecord,
    pub fingerprint: Fingerprint,
    pub fatigue: Option<FatigueAssessment>,
    pub tags: Vec<ObservationTag>,
    pub checklist: ChecklistSummary,
    /// Month (1-12) the data belongs to, taken from the timestamp
    pub data_month: u8,
    pub data_year: i32,
}

impl ProcessedInspection {
    /// Listing view of this inspection
    pub fn summary(&self) -> InspectionSummary {
        InspectionSummary {
            id: self.id,
            fingerprint: self.fingerprint.clone(),
            driver_name: self.record.driver_name.clone(),
            plate: self.record.plate.clone(),
            timestamp: self.record.timestamp,
            observations: self.record.observations.clone(),
            fatigue_state: self.fatigue.map(|f| f.state),
            month_label: crate::metrics::month_label(self.data_month, self.data_year),
        }
    }
}

/// Stored inspection as returned by listings and duplicate lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionSummary {
    pub id: Uuid,
    pub fingerprint: Fingerprint,
    pub driver_name: String,
    pub plate: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub observations: Option<String>,
    pub fatigue_state: Option<ComplianceState>,
    pub month_label: String,
}

/// Per-state counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub normal: u64,
    pub warning: u64,
    pub critical: u64,
}

impl StateCounts {
    pub fn add(&mut self, state: ComplianceState, n: u64) {
        match state {
            ComplianceState::Normal => self.normal += n,
            ComplianceState::Warning => self.warning += n,
            ComplianceState::Critical => self.critical += n,
        }
    }

    pub fn get(&self, state: ComplianceState) -> u64 {
        match state {
            ComplianceState::Normal => self.normal,
            ComplianceState::Warning => self.warning,
            ComplianceState::Critical => self.critical,
        }
    }

    pub fn total(&self) -> u64 {
        self.normal + self.warning + self.critical
    }
}

/// Outcome of checking or ingesting a batch of inspections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    /// Records in the batch
    pub total: usize,
    /// Records not seen before
    pub new_records: usize,
    /// Records whose fingerprint is already stored
    pub duplicates: usize,
    /// Records repeating an earlier fingerprint of the same batch
    pub in_batch_duplicates: usize,
    /// Stored rows matching the duplicate fingerprints
    pub duplicate_details: Vec<InspectionSummary>,
    /// Rows written (0 on a dry run)
    pub inserted: usize,
    /// Fatigue states of the new records
    pub fatigue: StateCounts,
    /// Observation tags of the new records at critical severity
    pub critical_observations: usize,
}

/// Outcome of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    Success,
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for UploadStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(UnknownVariant {
                kind: "upload status",
                value: other.to_string(),
            }),
        }
    }
}

/// Audit row for one uploaded file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub id: Uuid,
    pub file_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub uploaded_at: OffsetDateTime,
    pub total_records: usize,
    pub new_records: usize,
    pub duplicates: usize,
    pub status: UploadStatus,
    pub error: Option<String>,
}

/// Aggregate upload counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadStats {
    pub total_uploads: u64,
    pub successful_uploads: u64,
    pub failed_uploads: u64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_upload: Option<OffsetDateTime>,
}

/// Entity totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FleetTotals {
    pub inspections: u64,
    pub drivers: u64,
    pub vehicles: u64,
}

/// A month for which inspection data exists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataMonth {
    pub month: u8,
    pub year: i32,
    pub label: String,
}

/// Dashboard figures for the whole fleet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetMetrics {
    pub totals: FleetTotals,
    /// Fatigue states over all stored assessments
    pub fatigue: StateCounts,
    /// Drivers by activity state
    pub drivers: StateCounts,
    /// Vehicles by activity state
    pub vehicles: StateCounts,
    /// Distinct drivers with at least one critical fatigue assessment
    pub drivers_at_risk: u64,
    /// Months with data, newest first
    pub months: Vec<DataMonth>,
}

/// Error for parsing enum values from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

//! Ingest use case - fingerprint, score, categorise and persist an upload

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    checklist::summarize_checklist,
    fingerprint::{fingerprint_record, partition_duplicates},
    model::{
        Fingerprint, FingerprintAlgorithm, IngestReport, InspectionRecord, ProcessedInspection,
        Severity, UploadRecord, UploadStatus,
    },
    observations::categorize_observations,
    ports::{Clock, InspectionStore, StoreError},
};

/// Configuration for the ingest use case
#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    pub algorithm: FingerprintAlgorithm,
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// What an ingest would write, plus the report describing it
struct IngestPlan {
    report: IngestReport,
    new_inspections: Vec<ProcessedInspection>,
}

/// Use case for ingesting batches of inspection records
pub struct IngestUseCase<S, C>
where
    S: InspectionStore + ?Sized,
    C: Clock + ?Sized,
{
    store: Arc<S>,
    clock: Arc<C>,
    config: IngestConfig,
}

impl<S, C> IngestUseCase<S, C>
where
    S: InspectionStore + ?Sized,
    C: Clock + ?Sized,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, config: IngestConfig) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Fingerprint, score and categorise records without touching the store
    pub fn prepare(&self, records: &[InspectionRecord]) -> Vec<ProcessedInspection> {
        records
            .iter()
            .map(|record| prepare_record(self.config.algorithm, record))
            .collect()
    }

    /// Dry run: report which records are new and which are duplicates
    pub async fn check(&self, records: &[InspectionRecord]) -> Result<IngestReport, IngestError> {
        let plan = self.plan(records).await?;
        Ok(plan.report)
    }

    /// Persist the new records of an upload and record the upload itself
    pub async fn ingest(
        &self,
        file_name: &str,
        records: &[InspectionRecord],
    ) -> Result<IngestReport, IngestError> {
        let result = self.plan_and_insert(records).await;

        let upload = match &result {
            Ok(report) => UploadRecord {
                id: Uuid::new_v4(),
                file_name: file_name.to_string(),
                uploaded_at: self.clock.now(),
                total_records: report.total,
                new_records: report.inserted,
                duplicates: report.duplicates + report.in_batch_duplicates,
                status: UploadStatus::Success,
                error: None,
            },
            Err(e) => UploadRecord {
                id: Uuid::new_v4(),
                file_name: file_name.to_string(),
                uploaded_at: self.clock.now(),
                total_records: records.len(),
                new_records: 0,
                duplicates: 0,
                status: UploadStatus::Failed,
                error: Some(e.to_string()),
            },
        };

        if let Err(e) = self.store.record_upload(&upload).await {
            // A failed ingest already carries the more useful error
            if result.is_ok() {
                return Err(e.into());
            }
            tracing::warn!(error = %e, file = %file_name, "Failed to record upload");
        }

        match &result {
            Ok(report) => tracing::info!(
                file = %file_name,
                total = report.total,
                inserted = report.inserted,
                duplicates = report.duplicates,
                in_batch_duplicates = report.in_batch_duplicates,
                "Upload ingested"
            ),
            Err(e) => tracing::error!(file = %file_name, error = %e, "Upload failed"),
        }

        result
    }

    /// Record an upload that was rejected before any record could be read
    pub async fn reject(&self, file_name: &str, reason: &str) -> Result<(), IngestError> {
        tracing::warn!(file = %file_name, reason = %reason, "Upload rejected");

        let upload = UploadRecord {
            id: Uuid::new_v4(),
            file_name: file_name.to_string(),
            uploaded_at: self.clock.now(),
            total_records: 0,
            new_records: 0,
            duplicates: 0,
            status: UploadStatus::Failed,
            error: Some(reason.to_string()),
        };
        self.store.record_upload(&upload).await?;
        Ok(())
    }

    async fn plan_and_insert(
        &self,
        records: &[InspectionRecord],
    ) -> Result<IngestReport, IngestError> {
        let IngestPlan {
            mut report,
            new_inspections,
        } = self.plan(records).await?;

        if !new_inspections.is_empty() {
            report.inserted = self.store.insert_inspections(&new_inspections).await?;
        }

        Ok(report)
    }

    async fn plan(&self, records: &[InspectionRecord]) -> Result<IngestPlan, IngestError> {
        let processed = self.prepare(records);
        let total = processed.len();

        // Keep the first occurrence of each fingerprint within the batch
        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(processed.len());
        for inspection in processed {
            if seen.insert(inspection.fingerprint.clone()) {
                unique.push(inspection);
            }
        }
        let in_batch_duplicates = total - unique.len();

        let candidates: Vec<Fingerprint> = unique.iter().map(|i| i.fingerprint.clone()).collect();

        let duplicate_details = if candidates.is_empty() {
            Vec::new()
        } else {
            self.store.find_by_fingerprints(&candidates).await?
        };
        let existing: HashSet<Fingerprint> = duplicate_details
            .iter()
            .map(|d| d.fingerprint.clone())
            .collect();

        let partition = partition_duplicates(&candidates, &existing);
        let fresh: HashSet<&Fingerprint> = partition.new_ones.iter().collect();

        let new_inspections: Vec<ProcessedInspection> = unique
            .into_iter()
            .filter(|i| fresh.contains(&i.fingerprint))
            .collect();

        let mut report = IngestReport {
            total,
            new_records: new_inspections.len(),
            duplicates: partition.duplicates.len(),
            in_batch_duplicates,
            duplicate_details,
            ..Default::default()
        };

        for inspection in &new_inspections {
            if let Some(fatigue) = inspection.fatigue {
                report.fatigue.add(fatigue.state, 1);
            }
            report.critical_observations += inspection
                .tags
                .iter()
                .filter(|t| t.severity == Severity::Critical)
                .count();
        }

        tracing::debug!(
            total = report.total,
            new_records = report.new_records,
            duplicates = report.duplicates,
            in_batch_duplicates = report.in_batch_duplicates,
            "Planned ingest"
        );

        Ok(IngestPlan {
            report,
            new_inspections,
        })
    }
}

/// Derive everything stored alongside a single record
pub fn prepare_record(
    algorithm: FingerprintAlgorithm,
    record: &InspectionRecord,
) -> ProcessedInspection {
    ProcessedInspection {
        id: Uuid::new_v4(),
        fingerprint: fingerprint_record(algorithm, record),
        fatigue: record.fatigue.map(|answers| answers.assess()),
        tags: categorize_observations(record.observations.as_deref().unwrap_or_default()),
        checklist: summarize_checklist(&record.checklist),
        data_month: u8::from(record.timestamp.month()),
        data_year: record.timestamp.year(),
        record: record.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ChecklistAnswer, ComplianceState, FatigueAnswers, FleetMetrics, InspectionSummary,
        UploadStats,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;

    #[derive(Default)]
    struct FakeStore {
        rows: Mutex<Vec<ProcessedInspection>>,
        uploads: Mutex<Vec<UploadRecord>>,
        fail_inserts: bool,
    }

    #[async_trait]
    impl InspectionStore for FakeStore {
        async fn find_by_fingerprints(
            &self,
            fingerprints: &[Fingerprint],
        ) -> Result<Vec<InspectionSummary>, StoreError> {
            let rows = self.rows.lock().unwrap();
            Ok(rows
                .iter()
                .filter(|r| fingerprints.contains(&r.fingerprint))
                .map(ProcessedInspection::summary)
                .collect())
        }

        async fn insert_inspections(
            &self,
            inspections: &[ProcessedInspection],
        ) -> Result<usize, StoreError> {
            if self.fail_inserts {
                return Err(StoreError::Database("disk full".to_string()));
            }
            self.rows.lock().unwrap().extend(inspections.iter().cloned());
            Ok(inspections.len())
        }

        async fn record_upload(&self, upload: &UploadRecord) -> Result<(), StoreError> {
            self.uploads.lock().unwrap().push(upload.clone());
            Ok(())
        }

        async fn upload_stats(&self) -> Result<UploadStats, StoreError> {
            Ok(UploadStats::default())
        }

        async fn recent(&self, _limit: usize) -> Result<Vec<InspectionSummary>, StoreError> {
            Ok(vec![])
        }

        async fn search(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<InspectionSummary>, StoreError> {
            Ok(vec![])
        }

        async fn fleet_metrics(&self) -> Result<FleetMetrics, StoreError> {
            Ok(FleetMetrics::default())
        }
    }

    struct FixedClock(OffsetDateTime);

    impl Clock for FixedClock {
        fn now(&self) -> OffsetDateTime {
            self.0
        }
    }

    fn ts(s: &str) -> OffsetDateTime {
        OffsetDateTime::parse(s, &Rfc3339).unwrap()
    }

    fn record(driver: &str, plate: &str, at: &str) -> InspectionRecord {
        InspectionRecord {
            timestamp: ts(at),
            driver_name: driver.to_string(),
            plate: plate.to_string(),
            mileage: Some(1200),
            observations: None,
            contract: None,
            coordination_field: None,
            shift: None,
            fatigue: None,
            checklist: vec![],
        }
    }

    fn usecase(store: Arc<FakeStore>) -> IngestUseCase<FakeStore, FixedClock> {
        IngestUseCase::new(
            store,
            Arc::new(FixedClock(ts("2024-02-01T00:00:00Z"))),
            IngestConfig::default(),
        )
    }

    #[test]
    fn test_prepare_derives_everything() {
        let mut r = record("Ana", "XYZ-1", "2024-03-10T06:00:00Z");
        r.observations = Some("Freno trasero con ruido".to_string());
        r.fatigue = Some(FatigueAnswers {
            slept_seven_hours: true,
            feels_fatigue_free: false,
            fit_to_drive: true,
            took_alertness_affecting_medication: false,
        });
        r.checklist = vec![ChecklistAnswer {
            element: "FRENOS".to_string(),
            compliant: false,
        }];

        let usecase = usecase(Arc::new(FakeStore::default()));
        let processed = usecase.prepare(std::slice::from_ref(&r));

        assert_eq!(processed.len(), 1);
        let p = &processed[0];
        assert_eq!(p.data_month, 3);
        assert_eq!(p.data_year, 2024);
        assert_eq!(p.fatigue.unwrap().score, 3);
        assert_eq!(p.fatigue.unwrap().state, ComplianceState::Warning);
        assert_eq!(p.tags.len(), 2);
        assert_eq!(p.checklist.critical_failures, 1);
        assert_eq!(
            p.fingerprint,
            crate::fingerprint::compute_fingerprint(r.timestamp, "Ana", "XYZ-1", Some(1200))
        );
    }

    #[tokio::test]
    async fn test_ingest_inserts_new_records() {
        let store = Arc::new(FakeStore::default());
        let usecase = usecase(Arc::clone(&store));

        let records = vec![
            record("Ana", "XYZ-1", "2024-01-10T06:00:00Z"),
            record("Luis", "XYZ-2", "2024-01-10T06:05:00Z"),
        ];

        let report = usecase.ingest("enero.json", &records).await.unwrap();

        assert_eq!(report.total, 2);
        assert_eq!(report.new_records, 2);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.duplicates, 0);
        assert_eq!(store.rows.lock().unwrap().len(), 2);

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].status, UploadStatus::Success);
        assert_eq!(uploads[0].new_records, 2);
    }

    #[tokio::test]
    async fn test_reupload_is_detected_as_duplicate() {
        let store = Arc::new(FakeStore::default());
        let usecase = usecase(Arc::clone(&store));

        let records = vec![record("Ana", "XYZ-1", "2024-01-10T06:00:00Z")];
        usecase.ingest("a.json", &records).await.unwrap();

        let mut again = records.clone();
        again[0].driver_name = "  ana ".to_string();
        again.push(record("Luis", "XYZ-2", "2024-01-11T06:00:00Z"));

        let report = usecase.ingest("a-copy.json", &again).await.unwrap();

        assert_eq!(report.new_records, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.duplicate_details.len(), 1);
        assert_eq!(report.duplicate_details[0].driver_name, "Ana");
        assert_eq!(store.rows.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_repeats_within_batch_are_inserted_once() {
        let store = Arc::new(FakeStore::default());
        let usecase = usecase(Arc::clone(&store));

        let r = record("Ana", "XYZ-1", "2024-01-10T06:00:00Z");
        let report = usecase
            .ingest("dup.json", &[r.clone(), r.clone(), r])
            .await
            .unwrap();

        assert_eq!(report.total, 3);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.in_batch_duplicates, 2);
        assert_eq!(report.duplicates, 0);
    }

    #[tokio::test]
    async fn test_check_does_not_write() {
        let store = Arc::new(FakeStore::default());
        let usecase = usecase(Arc::clone(&store));

        let mut r = record("Ana", "XYZ-1", "2024-01-10T06:00:00Z");
        r.observations = Some("llanta lisa".to_string());
        r.fatigue = Some(FatigueAnswers::default());

        let report = usecase.check(&[r]).await.unwrap();

        assert_eq!(report.new_records, 1);
        assert_eq!(report.inserted, 0);
        assert_eq!(report.fatigue.critical, 1);
        assert_eq!(report.critical_observations, 1);
        assert!(store.rows.lock().unwrap().is_empty());
        assert!(store.uploads.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_insert_records_failed_upload() {
        let store = Arc::new(FakeStore {
            fail_inserts: true,
            ..Default::default()
        });
        let usecase = usecase(Arc::clone(&store));

        let result = usecase
            .ingest("bad.json", &[record("Ana", "XYZ-1", "2024-01-10T06:00:00Z")])
            .await;

        assert!(matches!(result, Err(IngestError::Store(_))));
        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads[0].status, UploadStatus::Failed);
        assert!(uploads[0].error.as_deref().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn test_reject_records_failed_upload() {
        let store = Arc::new(FakeStore::default());
        let usecase = usecase(Arc::clone(&store));

        usecase.reject("notes.txt", "Invalid file type").await.unwrap();

        let uploads = store.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].status, UploadStatus::Failed);
        assert_eq!(uploads[0].uploaded_at, ts("2024-02-01T00:00:00Z"));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let store = Arc::new(FakeStore::default());
        let usecase = usecase(Arc::clone(&store));

        let report = usecase.ingest("empty.json", &[]).await.unwrap();
        assert_eq!(report.total, 0);
        assert_eq!(report.inserted, 0);
        assert_eq!(store.uploads.lock().unwrap().len(), 1);
    }
}

//! In-memory inspection store for testing and offline mode

use async_trait::async_trait;
use fleet_inspect_domain::{
    ComplianceState, DataMonth, Fingerprint, FleetMetrics, FleetTotals, InspectionStore,
    InspectionSummary, ProcessedInspection, StateCounts, StoreError, UploadRecord, UploadStats,
    UploadStatus, activity_state, fingerprint::normalize_identity, month_label,
};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::RwLock;

/// In-memory inspection store implementation
pub struct InMemoryInspectionStore {
    inspections: RwLock<Vec<ProcessedInspection>>,
    uploads: RwLock<Vec<UploadRecord>>,
}

impl InMemoryInspectionStore {
    pub fn new() -> Self {
        Self {
            inspections: RwLock::new(Vec::new()),
            uploads: RwLock::new(Vec::new()),
        }
    }

    fn newest_first(
        &self,
        filter: impl Fn(&ProcessedInspection) -> bool,
        limit: usize,
    ) -> Result<Vec<InspectionSummary>, StoreError> {
        let inspections = self
            .inspections
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let mut matching: Vec<&ProcessedInspection> =
            inspections.iter().filter(|i| filter(i)).collect();
        matching.sort_by(|a, b| b.record.timestamp.cmp(&a.record.timestamp));

        Ok(matching
            .into_iter()
            .take(limit)
            .map(ProcessedInspection::summary)
            .collect())
    }
}

impl Default for InMemoryInspectionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn activity_counts(keys: impl Iterator<Item = String>) -> StateCounts {
    let mut per_key: HashMap<String, u64> = HashMap::new();
    for key in keys {
        *per_key.entry(key).or_default() += 1;
    }

    let mut counts = StateCounts::default();
    for count in per_key.into_values() {
        counts.add(activity_state(count), 1);
    }
    counts
}

#[async_trait]
impl InspectionStore for InMemoryInspectionStore {
    async fn find_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<Vec<InspectionSummary>, StoreError> {
        let wanted: HashSet<&Fingerprint> = fingerprints.iter().collect();
        let inspections = self
            .inspections
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(inspections
            .iter()
            .filter(|i| wanted.contains(&i.fingerprint))
            .map(ProcessedInspection::summary)
            .collect())
    }

    async fn insert_inspections(
        &self,
        inspections: &[ProcessedInspection],
    ) -> Result<usize, StoreError> {
        let mut stored = self
            .inspections
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        // Same uniqueness rule as the SQLite schema; reject the whole batch
        let mut taken: HashSet<Fingerprint> =
            stored.iter().map(|i| i.fingerprint.clone()).collect();
        for inspection in inspections {
            if !taken.insert(inspection.fingerprint.clone()) {
                return Err(StoreError::Database(format!(
                    "UNIQUE constraint failed: inspections.fingerprint ({})",
                    inspection.fingerprint
                )));
            }
        }

        stored.extend(inspections.iter().cloned());
        Ok(inspections.len())
    }

    async fn record_upload(&self, upload: &UploadRecord) -> Result<(), StoreError> {
        let mut uploads = self
            .uploads
            .write()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        uploads.push(upload.clone());
        Ok(())
    }

    async fn upload_stats(&self) -> Result<UploadStats, StoreError> {
        let uploads = self
            .uploads
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let successful = uploads
            .iter()
            .filter(|u| u.status == UploadStatus::Success)
            .count() as u64;

        Ok(UploadStats {
            total_uploads: uploads.len() as u64,
            successful_uploads: successful,
            failed_uploads: uploads.len() as u64 - successful,
            last_upload: uploads.iter().map(|u| u.uploaded_at).max(),
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<InspectionSummary>, StoreError> {
        self.newest_first(|_| true, limit)
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<InspectionSummary>, StoreError> {
        let needle = query.trim().to_lowercase();
        self.newest_first(
            |i| {
                i.record.driver_name.to_lowercase().contains(&needle)
                    || i.record.plate.to_lowercase().contains(&needle)
                    || i.record
                        .observations
                        .as_deref()
                        .is_some_and(|o| o.to_lowercase().contains(&needle))
            },
            limit,
        )
    }

    async fn fleet_metrics(&self) -> Result<FleetMetrics, StoreError> {
        let inspections = self
            .inspections
            .read()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let drivers: HashSet<String> = inspections
            .iter()
            .map(|i| normalize_identity(&i.record.driver_name))
            .collect();
        let vehicles: HashSet<String> = inspections
            .iter()
            .map(|i| normalize_identity(&i.record.plate))
            .collect();

        let mut fatigue = StateCounts::default();
        let mut at_risk = HashSet::new();
        for inspection in inspections.iter() {
            if let Some(assessment) = inspection.fatigue {
                fatigue.add(assessment.state, 1);
                if assessment.state == ComplianceState::Critical {
                    at_risk.insert(normalize_identity(&inspection.record.driver_name));
                }
            }
        }

        let months: BTreeSet<(i32, u8)> = inspections
            .iter()
            .map(|i| (i.data_year, i.data_month))
            .collect();

        Ok(FleetMetrics {
            totals: FleetTotals {
                inspections: inspections.len() as u64,
                drivers: drivers.len() as u64,
                vehicles: vehicles.len() as u64,
            },
            fatigue,
            drivers: activity_counts(
                inspections
                    .iter()
                    .map(|i| normalize_identity(&i.record.driver_name)),
            ),
            vehicles: activity_counts(
                inspections
                    .iter()
                    .map(|i| normalize_identity(&i.record.plate)),
            ),
            drivers_at_risk: at_risk.len() as u64,
            months: months
                .into_iter()
                .rev()
                .map(|(year, month)| DataMonth {
                    month,
                    year,
                    label: month_label(month, year),
                })
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_inspect_domain::{
        FatigueAnswers, FingerprintAlgorithm, InspectionRecord, usecases::prepare_record,
    };
    use time::OffsetDateTime;
    use time::format_description::well_known::Rfc3339;
    use uuid::Uuid;

    fn processed(driver: &str, plate: &str, at: &str) -> ProcessedInspection {
        let record = InspectionRecord {
            timestamp: OffsetDateTime::parse(at, &Rfc3339).unwrap(),
            driver_name: driver.to_string(),
            plate: plate.to_string(),
            mileage: None,
            observations: Some("Batería descargada".to_string()),
            contract: None,
            coordination_field: None,
            shift: None,
            fatigue: Some(FatigueAnswers::default()),
            checklist: vec![],
        };
        prepare_record(FingerprintAlgorithm::Rolling, &record)
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = InMemoryInspectionStore::new();
        let a = processed("Ana", "XYZ-1", "2024-01-10T06:00:00Z");
        store.insert_inspections(std::slice::from_ref(&a)).await.unwrap();

        let found = store
            .find_by_fingerprints(&[a.fingerprint.clone()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].fatigue_state, Some(ComplianceState::Critical));
    }

    #[tokio::test]
    async fn test_conflicting_batch_is_rejected_whole() {
        let store = InMemoryInspectionStore::new();
        let a = processed("Ana", "XYZ-1", "2024-01-10T06:00:00Z");
        store.insert_inspections(std::slice::from_ref(&a)).await.unwrap();

        let b = processed("Luis", "XYZ-2", "2024-01-11T06:00:00Z");
        let mut a_again = a.clone();
        a_again.id = Uuid::new_v4();

        assert!(store.insert_inspections(&[b.clone(), a_again]).await.is_err());
        assert!(store.find_by_fingerprints(&[b.fingerprint]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_observations() {
        let store = InMemoryInspectionStore::new();
        store
            .insert_inspections(&[
                processed("Ana", "XYZ-1", "2024-01-10T06:00:00Z"),
                processed("Luis", "ABC-2", "2024-01-12T06:00:00Z"),
            ])
            .await
            .unwrap();

        let results = store.search("BATERÍA", 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].driver_name, "Luis");

        assert_eq!(store.search("abc", 10).await.unwrap().len(), 1);
        assert_eq!(store.recent(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_metrics_and_upload_stats() {
        let store = InMemoryInspectionStore::new();
        store
            .insert_inspections(&[
                processed("Ana", "XYZ-1", "2024-01-10T06:00:00Z"),
                processed(" ana", "XYZ-1", "2024-02-10T06:00:00Z"),
            ])
            .await
            .unwrap();

        let metrics = store.fleet_metrics().await.unwrap();
        assert_eq!(metrics.totals.inspections, 2);
        assert_eq!(metrics.totals.drivers, 1);
        assert_eq!(metrics.fatigue.critical, 2);
        assert_eq!(metrics.drivers_at_risk, 1);
        assert_eq!(metrics.drivers.critical, 1);
        assert_eq!(metrics.months[0].label, "Febrero 2024");

        let stats = store.upload_stats().await.unwrap();
        assert_eq!(stats.total_uploads, 0);
        assert!(stats.last_upload.is_none());
    }
}

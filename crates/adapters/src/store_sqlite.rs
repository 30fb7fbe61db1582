//! SQLite inspection store implementation

use async_trait::async_trait;
use fleet_inspect_domain::{
    ComplianceState, DataMonth, Fingerprint, FleetMetrics, FleetTotals, InspectionStore,
    InspectionSummary, ProcessedInspection, StateCounts, StoreError, UploadRecord, UploadStats,
    activity_state, fingerprint::iso_timestamp, fingerprint::normalize_identity, month_label,
};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

/// Fingerprints per `IN (...)` lookup, below SQLite's bound-parameter limit
const LOOKUP_CHUNK: usize = 500;

/// Separates fields in the lower-cased search column
const SEARCH_SEPARATOR: &str = "\u{1f}";

const SUMMARY_COLUMNS: &str = r#"
    i.id, i.fingerprint, i.driver_name, i.plate, i.recorded_at, i.observations,
    f.state, i.data_month, i.data_year
"#;

type SummaryRow = (
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

/// SQLite-backed inspection store
pub struct SqliteInspectionStore {
    pool: SqlitePool,
}

impl SqliteInspectionStore {
    /// Open (or create) the database at `db_path` and run migrations
    pub async fn new(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StoreError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(db_err)?;

        tracing::debug!(path = %db_path.display(), "Opened inspection database");

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Close all pooled connections
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS inspections (
                id TEXT PRIMARY KEY,
                fingerprint TEXT NOT NULL UNIQUE,
                inspected_at TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                driver_name TEXT NOT NULL,
                driver_key TEXT NOT NULL,
                plate TEXT NOT NULL,
                plate_key TEXT NOT NULL,
                mileage INTEGER,
                observations TEXT,
                contract TEXT,
                coordination_field TEXT,
                shift TEXT,
                data_month INTEGER NOT NULL,
                data_year INTEGER NOT NULL,
                tags_json TEXT NOT NULL,
                checklist_json TEXT NOT NULL,
                critical_failures INTEGER NOT NULL,
                minor_failures INTEGER NOT NULL,
                search_text TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS fatigue_controls (
                inspection_id TEXT PRIMARY KEY REFERENCES inspections(id),
                slept_seven_hours INTEGER NOT NULL,
                feels_fatigue_free INTEGER NOT NULL,
                fit_to_drive INTEGER NOT NULL,
                took_medication INTEGER NOT NULL,
                score INTEGER NOT NULL,
                state TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS uploads (
                id TEXT PRIMARY KEY,
                file_name TEXT NOT NULL,
                uploaded_at TEXT NOT NULL,
                total_records INTEGER NOT NULL,
                new_records INTEGER NOT NULL,
                duplicates INTEGER NOT NULL,
                status TEXT NOT NULL,
                error TEXT
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_inspections_inspected_at ON inspections(inspected_at)",
            "CREATE INDEX IF NOT EXISTS idx_inspections_driver_key ON inspections(driver_key)",
            "CREATE INDEX IF NOT EXISTS idx_inspections_plate_key ON inspections(plate_key)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }

        Ok(())
    }

    async fn state_counts_by_group(&self, key_column: &str) -> Result<StateCounts, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM inspections GROUP BY {}", key_column);
        let rows: Vec<(i64,)> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut counts = StateCounts::default();
        for (count,) in rows {
            counts.add(activity_state(count.max(0) as u64), 1);
        }
        Ok(counts)
    }
}

#[async_trait]
impl InspectionStore for SqliteInspectionStore {
    async fn find_by_fingerprints(
        &self,
        fingerprints: &[Fingerprint],
    ) -> Result<Vec<InspectionSummary>, StoreError> {
        let mut found = Vec::new();

        for chunk in fingerprints.chunks(LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT {} FROM inspections i
                 LEFT JOIN fatigue_controls f ON f.inspection_id = i.id
                 WHERE i.fingerprint IN ({})",
                SUMMARY_COLUMNS, placeholders
            );

            let mut query = sqlx::query_as::<_, SummaryRow>(&sql);
            for fingerprint in chunk {
                query = query.bind(fingerprint.as_str());
            }

            let rows = query.fetch_all(&self.pool).await.map_err(db_err)?;
            for row in rows {
                found.push(summary_from_row(row)?);
            }
        }

        Ok(found)
    }

    async fn insert_inspections(
        &self,
        inspections: &[ProcessedInspection],
    ) -> Result<usize, StoreError> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        for inspection in inspections {
            let record = &inspection.record;
            let id = inspection.id.to_string();
            let tags_json = serde_json::to_string(&inspection.tags)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let checklist_json = serde_json::to_string(&record.checklist)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            // inspected_at is the UTC sort key; recorded_at keeps offset and precision
            let recorded_at = record
                .timestamp
                .format(&Rfc3339)
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            let search_text = [
                record.driver_name.as_str(),
                record.plate.as_str(),
                record.observations.as_deref().unwrap_or_default(),
            ]
            .join(SEARCH_SEPARATOR)
            .to_lowercase();

            sqlx::query(
                r#"
                INSERT INTO inspections
                (id, fingerprint, inspected_at, recorded_at, driver_name, driver_key, plate,
                 plate_key, mileage, observations, contract, coordination_field, shift,
                 data_month, data_year, tags_json, checklist_json,
                 critical_failures, minor_failures, search_text)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&id)
            .bind(inspection.fingerprint.as_str())
            .bind(iso_timestamp(record.timestamp))
            .bind(&recorded_at)
            .bind(&record.driver_name)
            .bind(normalize_identity(&record.driver_name))
            .bind(&record.plate)
            .bind(normalize_identity(&record.plate))
            .bind(record.mileage)
            .bind(&record.observations)
            .bind(&record.contract)
            .bind(&record.coordination_field)
            .bind(&record.shift)
            .bind(i64::from(inspection.data_month))
            .bind(i64::from(inspection.data_year))
            .bind(&tags_json)
            .bind(&checklist_json)
            .bind(inspection.checklist.critical_failures as i64)
            .bind(inspection.checklist.minor_failures as i64)
            .bind(&search_text)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            if let (Some(answers), Some(assessment)) = (record.fatigue, inspection.fatigue) {
                sqlx::query(
                    r#"
                    INSERT INTO fatigue_controls
                    (inspection_id, slept_seven_hours, feels_fatigue_free, fit_to_drive,
                     took_medication, score, state)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(&id)
                .bind(answers.slept_seven_hours)
                .bind(answers.feels_fatigue_free)
                .bind(answers.fit_to_drive)
                .bind(answers.took_alertness_affecting_medication)
                .bind(i64::from(assessment.score))
                .bind(assessment.state.as_str())
                .execute(&mut *tx)
                .await
                .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)?;

        tracing::debug!(count = inspections.len(), "Inserted inspections");

        Ok(inspections.len())
    }

    async fn record_upload(&self, upload: &UploadRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO uploads
            (id, file_name, uploaded_at, total_records, new_records, duplicates, status, error)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(upload.id.to_string())
        .bind(&upload.file_name)
        .bind(iso_timestamp(upload.uploaded_at))
        .bind(upload.total_records as i64)
        .bind(upload.new_records as i64)
        .bind(upload.duplicates as i64)
        .bind(upload.status.as_str())
        .bind(&upload.error)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(())
    }

    async fn upload_stats(&self) -> Result<UploadStats, StoreError> {
        let (total, successful, failed, last): (i64, Option<i64>, Option<i64>, Option<String>) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    SUM(CASE WHEN status = 'success' THEN 1 ELSE 0 END),
                    SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END),
                    MAX(uploaded_at)
                FROM uploads
                "#,
            )
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;

        Ok(UploadStats {
            total_uploads: total.max(0) as u64,
            successful_uploads: successful.unwrap_or(0).max(0) as u64,
            failed_uploads: failed.unwrap_or(0).max(0) as u64,
            last_upload: last.as_deref().map(parse_timestamp).transpose()?,
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<InspectionSummary>, StoreError> {
        let sql = format!(
            "SELECT {} FROM inspections i
             LEFT JOIN fatigue_controls f ON f.inspection_id = i.id
             ORDER BY i.inspected_at DESC
             LIMIT ?",
            SUMMARY_COLUMNS
        );

        let rows: Vec<SummaryRow> = sqlx::query_as(&sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.into_iter().map(summary_from_row).collect()
    }

    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<InspectionSummary>, StoreError> {
        let needle = query.trim().to_lowercase().replace(SEARCH_SEPARATOR, "");

        let sql = format!(
            "SELECT {} FROM inspections i
             LEFT JOIN fatigue_controls f ON f.inspection_id = i.id
             WHERE instr(i.search_text, ?) > 0
             ORDER BY i.inspected_at DESC
             LIMIT ?",
            SUMMARY_COLUMNS
        );

        let rows: Vec<SummaryRow> = sqlx::query_as(&sql)
            .bind(&needle)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        tracing::debug!(query = %needle, results = rows.len(), "Searched inspections");

        rows.into_iter().map(summary_from_row).collect()
    }

    async fn fleet_metrics(&self) -> Result<FleetMetrics, StoreError> {
        let (inspections, drivers, vehicles): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(DISTINCT driver_key), COUNT(DISTINCT plate_key) FROM inspections",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let fatigue_rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT state, COUNT(*) FROM fatigue_controls GROUP BY state")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        let mut fatigue = StateCounts::default();
        for (state, count) in fatigue_rows {
            let state = state
                .parse::<ComplianceState>()
                .map_err(|e| StoreError::Serialization(e.to_string()))?;
            fatigue.add(state, count.max(0) as u64);
        }

        let (drivers_at_risk,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(DISTINCT i.driver_key)
            FROM inspections i
            JOIN fatigue_controls f ON f.inspection_id = i.id
            WHERE f.state = 'critical'
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let month_rows: Vec<(i64, i64)> = sqlx::query_as(
            r#"
            SELECT DISTINCT data_month, data_year
            FROM inspections
            ORDER BY data_year DESC, data_month DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let months = month_rows
            .into_iter()
            .map(|(month, year)| {
                let month = month.clamp(0, 255) as u8;
                let year = year as i32;
                DataMonth {
                    month,
                    year,
                    label: month_label(month, year),
                }
            })
            .collect();

        Ok(FleetMetrics {
            totals: FleetTotals {
                inspections: inspections.max(0) as u64,
                drivers: drivers.max(0) as u64,
                vehicles: vehicles.max(0) as u64,
            },
            fatigue,
            drivers: self.state_counts_by_group("driver_key").await?,
            vehicles: self.state_counts_by_group("plate_key").await?,
            drivers_at_risk: drivers_at_risk.max(0) as u64,
            months,
        })
    }
}

fn db_err(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

fn parse_timestamp(value: &str) -> Result<OffsetDateTime, StoreError> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn summary_from_row(row: SummaryRow) -> Result<InspectionSummary, StoreError> {
    let (id, fingerprint, driver_name, plate, recorded_at, observations, state, month, year) = row;

    let id = Uuid::parse_str(&id).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let fatigue_state = state
        .map(|s| {
            s.parse::<ComplianceState>()
                .map_err(|e| StoreError::Serialization(e.to_string()))
        })
        .transpose()?;
    let month = month.clamp(0, 255) as u8;

    Ok(InspectionSummary {
        id,
        fingerprint: Fingerprint::new(fingerprint),
        driver_name,
        plate,
        timestamp: parse_timestamp(&recorded_at)?,
        observations,
        fatigue_state,
        month_label: month_label(month, year as i32),
    })
}

//! Duplicate-detection fingerprints
//!
//! A fingerprint identifies one physical inspection by its timestamp, driver,
//! plate and mileage, so that re-importing the same spreadsheet can be caught
//! before insertion. The default rolling hash is not collision resistant.

use sha2::{Digest, Sha256};
use std::collections::HashSet;
use time::{OffsetDateTime, UtcOffset};

use crate::model::{DuplicatePartition, Fingerprint, FingerprintAlgorithm, InspectionRecord};

/// Compute the rolling-hash fingerprint of an inspection
pub fn compute_fingerprint(
    timestamp: OffsetDateTime,
    driver_name: &str,
    plate: &str,
    mileage: Option<i64>,
) -> Fingerprint {
    compute_fingerprint_with(
        FingerprintAlgorithm::Rolling,
        timestamp,
        driver_name,
        plate,
        mileage,
    )
}

/// Compute a fingerprint with an explicit algorithm
pub fn compute_fingerprint_with(
    algorithm: FingerprintAlgorithm,
    timestamp: OffsetDateTime,
    driver_name: &str,
    plate: &str,
    mileage: Option<i64>,
) -> Fingerprint {
    let canonical = canonical_identity(timestamp, driver_name, plate, mileage);

    match algorithm {
        FingerprintAlgorithm::Rolling => Fingerprint::new(rolling_hash_hex(&canonical)),
        FingerprintAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(canonical.as_bytes());
            Fingerprint::new(format!("{:x}", hasher.finalize()))
        }
    }
}

/// Fingerprint an inspection record
pub fn fingerprint_record(
    algorithm: FingerprintAlgorithm,
    record: &InspectionRecord,
) -> Fingerprint {
    compute_fingerprint_with(
        algorithm,
        record.timestamp,
        &record.driver_name,
        &record.plate,
        record.mileage,
    )
}

/// Split candidates into fingerprints absent from and present in `existing`
pub fn partition_duplicates(
    candidates: &[Fingerprint],
    existing: &HashSet<Fingerprint>,
) -> DuplicatePartition {
    let (duplicates, new_ones): (Vec<_>, Vec<_>) = candidates
        .iter()
        .cloned()
        .partition(|fp| existing.contains(fp));

    DuplicatePartition {
        new_ones,
        duplicates,
    }
}

/// Canonical string hashed for a fingerprint
pub fn canonical_identity(
    timestamp: OffsetDateTime,
    driver_name: &str,
    plate: &str,
    mileage: Option<i64>,
) -> String {
    format!(
        "{}{}{}{}",
        iso_timestamp(timestamp),
        normalize_identity(driver_name),
        normalize_identity(plate),
        mileage.unwrap_or(0)
    )
}

/// Upper-cased, trimmed form of a driver name or plate
///
/// Trimming follows ECMAScript `String.prototype.trim`, so fingerprints
/// match the ones already stored by the spreadsheet importer.
pub fn normalize_identity(value: &str) -> String {
    value.to_uppercase().trim_matches(is_ecma_whitespace).to_string()
}

/// ECMAScript WhiteSpace and LineTerminator code points
fn is_ecma_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000A}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{000D}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}

/// UTC ISO-8601 with millisecond precision, e.g. `2024-01-15T08:30:00.000Z`
pub fn iso_timestamp(timestamp: OffsetDateTime) -> String {
    let utc = timestamp.to_offset(UtcOffset::UTC);
    format!(
        "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
        utc.year(),
        u8::from(utc.month()),
        utc.day(),
        utc.hour(),
        utc.minute(),
        utc.second(),
        utc.millisecond()
    )
}

/// `hash = hash * 31 + unit` over UTF-16 code units, wrapping at 32 bits
fn rolling_hash(data: &str) -> i32 {
    data.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

fn rolling_hash_hex(data: &str) -> String {
    format!("{:08x}", rolling_hash(data).unsigned_abs())
}

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const UPLOAD: &str = r#"[
  {"timestamp":"2024-03-05T14:30:00Z","driverName":"Juan Pérez","plate":"ABC-123","mileage":45210,
   "observations":"Frenos con ruido","fatigue":{"sleptSevenHours":true,"feelsFatigueFree":true,"fitToDrive":true,"tookAlertnessAffectingMedication":false}},
  {"timestamp":"2024-03-06T07:00:00Z","driverName":"Ana Gómez","plate":"XYZ-789",
   "observations":"Batería descargada","fatigue":{"sleptSevenHours":false,"feelsFatigueFree":false,"fitToDrive":true,"tookAlertnessAffectingMedication":true}},
  {"timestamp":"2024-03-05T14:30:00Z","driverName":"juan pérez ","plate":"abc-123","mileage":45210}
]"#;

/// Writes a config pointing the database into `dir`
fn write_config(dir: &TempDir) -> PathBuf {
    let config_path = dir.path().join("fleet-inspect.toml");
    let db_path = dir.path().join("fleet.sqlite");
    fs::write(
        &config_path,
        format!(
            "[general]\ndatabase_path = {:?}\n",
            db_path.display().to_string()
        ),
    )
    .expect("write config");
    config_path
}

fn write_upload(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, UPLOAD).expect("write upload");
    path
}

fn ingest_json(config: &Path, upload: &Path, dry_run: bool) -> Value {
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.arg("--config").arg(config).args(["ingest", "--json", "--file"]).arg(upload);
    if dry_run {
        cmd.arg("--dry-run");
    }
    let output = cmd.output().expect("run ingest");
    assert!(output.status.success(), "ingest failed: {:?}", output);
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn config_init_writes_example_file() {
    let dir = TempDir::new().expect("temp dir");
    let config_path = dir.path().join("fleet-inspect.toml");

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).expect("read config");
    assert!(content.contains("database_path"));
    assert!(content.contains("algorithm = \"rolling\""));

    // A second init without --force refuses to overwrite
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.args(["config", "init", "--path"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn fingerprint_matches_known_value() {
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .args([
            "fingerprint",
            "--timestamp",
            "2024-03-05T14:30:00Z",
            "--driver",
            "Juan Pérez",
            "--plate",
            "ABC-123",
            "--mileage",
            "45210",
        ])
        .output()
        .expect("run fingerprint");
    assert!(output.status.success());
    let first = String::from_utf8(output.stdout).expect("utf8");

    // Same identity after normalisation
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .args([
            "fingerprint",
            "--timestamp",
            "2024-03-05T09:30:00-05:00",
            "--driver",
            "  juan pérez",
            "--plate",
            "abc-123 ",
            "--mileage",
            "45210",
        ])
        .output()
        .expect("run fingerprint");
    assert!(output.status.success());
    let second = String::from_utf8(output.stdout).expect("utf8");

    assert_eq!(first.trim(), "00273d8f");
    assert_eq!(first, second);
}

#[test]
fn fingerprint_sha256_is_64_chars() {
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .args([
            "fingerprint",
            "--timestamp",
            "2024-03-05T14:30:00Z",
            "--driver",
            "Ana",
            "--plate",
            "XYZ",
            "--algorithm",
            "sha256",
        ])
        .output()
        .expect("run fingerprint");
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap().trim().len(), 64);
}

#[test]
fn config_log_level_applies_without_flag() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("fleet-inspect.toml");
    fs::write(&config_path, "[general]\nlog_level = \"debug\"\n").unwrap();
    let fingerprint_args = [
        "fingerprint",
        "--timestamp",
        "2024-03-05T14:30:00Z",
        "--driver",
        "Ana",
        "--plate",
        "XYZ",
    ];

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config_path)
        .args(fingerprint_args)
        .assert()
        .success()
        .stderr(predicate::str::contains("Computed fingerprint"));

    // The flag still overrides the file
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(&config_path)
        .args(["--log-level", "warn"])
        .args(fingerprint_args)
        .assert()
        .success()
        .stderr(predicate::str::contains("Computed fingerprint").not());
}

#[test]
fn fingerprint_rejects_bad_timestamp() {
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.args([
        "fingerprint",
        "--timestamp",
        "yesterday",
        "--driver",
        "Ana",
        "--plate",
        "XYZ",
    ])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Invalid timestamp"));
}

#[test]
fn fatigue_outputs_state() {
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .args([
            "fatigue",
            "--slept-seven-hours",
            "--fatigue-free",
            "--fit-to-drive",
            "--json",
        ])
        .output()
        .expect("run fatigue");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["score"], 4);
    assert_eq!(value["state"], "normal");

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.args(["fatigue", "--took-medication"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0/4").and(predicate::str::contains("critical")));
}

#[test]
fn categorize_outputs_tags_in_order() {
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .args([
            "categorize",
            "--text",
            "Ruido en los FRENOS y la llanta gastada",
            "--json",
        ])
        .output()
        .expect("run categorize");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let categories: Vec<&str> = value
        .as_array()
        .expect("array")
        .iter()
        .map(|t| t["category"].as_str().unwrap())
        .collect();
    assert_eq!(categories, vec!["brakes", "tires", "noise"]);
}

#[test]
fn categorize_reads_stdin() {
    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.args(["categorize", "--file", "-"])
        .write_stdin("sin novedad")
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues matched"));
}

#[test]
fn ingest_dry_run_writes_nothing() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let upload = write_upload(&dir, "march.json");

    let report = ingest_json(&config, &upload, true);
    assert_eq!(report["total"], 3);
    assert_eq!(report["newRecords"], 2);
    assert_eq!(report["inBatchDuplicates"], 1);
    assert_eq!(report["inserted"], 0);

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .arg("--config")
        .arg(&config)
        .args(["recent", "--json"])
        .output()
        .expect("run recent");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert!(value.as_array().expect("array").is_empty());
}

#[test]
fn ingest_twice_reports_duplicates() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let upload = write_upload(&dir, "march.json");

    let first = ingest_json(&config, &upload, false);
    assert_eq!(first["inserted"], 2);
    assert_eq!(first["duplicates"], 0);
    assert_eq!(first["fatigue"]["normal"], 1);
    assert_eq!(first["fatigue"]["critical"], 1);
    assert_eq!(first["criticalObservations"], 1);

    let second = ingest_json(&config, &upload, false);
    assert_eq!(second["inserted"], 0);
    assert_eq!(second["duplicates"], 2);
    assert_eq!(
        second["duplicateDetails"].as_array().expect("array").len(),
        2
    );
}

#[test]
fn ingest_rejects_bad_extension_and_counts_failure() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let upload = dir.path().join("march.csv");
    fs::write(&upload, "a,b,c").expect("write upload");

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    cmd.arg("--config")
        .arg(&config)
        .args(["ingest", "--file"])
        .arg(&upload)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid file type"));

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .arg("--config")
        .arg(&config)
        .args(["stats", "--json"])
        .output()
        .expect("run stats");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["uploads"]["totalUploads"], 1);
    assert_eq!(value["uploads"]["failedUploads"], 1);
}

#[test]
fn search_and_stats_after_ingest() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let upload = write_upload(&dir, "march.json");
    ingest_json(&config, &upload, false);

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .arg("--config")
        .arg(&config)
        .args(["search", "batería", "--json"])
        .output()
        .expect("run search");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    let results = value.as_array().expect("array");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["plate"], "XYZ-789");
    assert_eq!(results[0]["monthLabel"], "Marzo 2024");

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .arg("--config")
        .arg(&config)
        .args(["stats", "--json"])
        .output()
        .expect("run stats");
    assert!(output.status.success());
    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["metrics"]["totals"]["inspections"], 2);
    assert_eq!(value["metrics"]["totals"]["drivers"], 2);
    assert_eq!(value["metrics"]["driversAtRisk"], 1);
    assert_eq!(value["uploads"]["successfulUploads"], 1);
}

#[test]
fn doctor_does_not_create_database() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .arg("--config")
        .arg(&config)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["config"]["status"], "ok");
    assert_eq!(value["database"]["status"], "warn");
    assert!(!dir.path().join("fleet.sqlite").exists());
}

#[test]
fn doctor_reports_existing_database() {
    let dir = TempDir::new().expect("temp dir");
    let config = write_config(&dir);
    let upload = write_upload(&dir, "march.json");
    ingest_json(&config, &upload, false);

    let mut cmd = cargo_bin_cmd!("fleet-inspect");
    let output = cmd
        .arg("--config")
        .arg(&config)
        .args(["doctor", "--json"])
        .output()
        .expect("run doctor");
    assert!(output.status.success());

    let value: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(value["database"]["status"], "ok");
    assert_eq!(value["database"]["details"]["inspections"], 2);
    assert_eq!(value["overall"], "warn");
}

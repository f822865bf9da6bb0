//! Integration tests for the routing engine
//!
//! These tests verify:
//! - Console stdout/stderr split
//! - Primary/error file split and single-destination fallback
//! - Rotation through the logger
//! - JSON output shape and stack traces
//! - Sync failure reporting
//! - Panic severity delivery
//! - Network delivery

use std::fs;
use std::io::{BufRead, BufReader};
use std::net::TcpListener;
use std::path::Path;
use std::thread;
use tee_logger::prelude::*;
use tee_logger::writers::CaptureBuffer;
use tee_logger::{info, IGNORED_KEY};
use tempfile::TempDir;

fn read_json_lines(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("Failed to read log file")
        .lines()
        .map(|line| serde_json::from_str(line).expect("Line is not valid JSON"))
        .collect()
}

fn file_config(dir: &TempDir, level: LogLevel) -> LoggerConfig {
    LoggerConfig {
        level,
        outputs: vec![OutputKind::File],
        file: Some(FileOptions::new(dir.path().join("app.log"))),
        ..LoggerConfig::default()
    }
}

#[test]
fn test_console_info_goes_to_stdout_only() {
    let stdout = CaptureBuffer::new();
    let stderr = CaptureBuffer::new();
    let config: LoggerConfig =
        serde_json::from_str(r#"{"level": "info", "outputs": ["console"]}"#)
            .expect("Failed to parse config");

    let logger = config
        .to_builder()
        .expect("Invalid config")
        .console_to(
            ConsoleTarget::Capture(stdout.clone()),
            ConsoleTarget::Capture(stderr.clone()),
        )
        .build()
        .expect("Failed to build logger");

    logger.info("start", &["port".into(), 8081.into()]);

    let lines = stdout.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("start"));
    assert!(lines[0].contains("port=8081"));
    assert!(stderr.is_empty());
}

#[test]
fn test_console_high_severity_goes_to_stderr_only() {
    for threshold in [LogLevel::Debug, LogLevel::Info, LogLevel::Warn, LogLevel::Error] {
        let stdout = CaptureBuffer::new();
        let stderr = CaptureBuffer::new();
        let logger = Logger::builder()
            .level(threshold)
            .console_to(
                ConsoleTarget::Capture(stdout.clone()),
                ConsoleTarget::Capture(stderr.clone()),
            )
            .build()
            .expect("Failed to build logger");

        logger.error("boom", &[]);
        logger.dpanic("worse", &[]);

        assert!(stdout.is_empty(), "threshold {}", threshold);
        assert_eq!(stderr.lines().len(), 2, "threshold {}", threshold);
    }
}

#[test]
fn test_debug_and_error_to_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let logger = file_config(&dir, LogLevel::Debug)
        .build()
        .expect("Failed to build logger");

    logger.debug("x", &[]);
    logger.error("y", &[]);
    logger.sync().expect("Failed to sync");

    let records = read_json_lines(&dir.path().join("app.log"));
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["level"], "debug");
    assert_eq!(records[0]["msg"], "x");
    assert!(records[0].get("stacktrace").is_none());
    assert_eq!(records[1]["level"], "error");
    assert_eq!(records[1]["msg"], "y");
    assert!(records[1]["stacktrace"].is_string());
    assert!(records[1]["caller"]
        .as_str()
        .is_some_and(|c| c.contains("integration_tests.rs:")));
}

#[test]
fn test_file_split() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = file_config(&dir, LogLevel::Debug);
    config.error_file = Some(FileOptions::new(dir.path().join("error.log")));
    let logger = config.build().expect("Failed to build logger");

    logger.debug("d", &[]);
    logger.info("i", &[]);
    logger.warn("w", &[]);
    logger.error("e", &[]);
    logger.sync().expect("Failed to sync");

    let primary: Vec<String> = read_json_lines(&dir.path().join("app.log"))
        .iter()
        .map(|r| r["msg"].as_str().unwrap_or_default().to_string())
        .collect();
    let errors: Vec<String> = read_json_lines(&dir.path().join("error.log"))
        .iter()
        .map(|r| r["msg"].as_str().unwrap_or_default().to_string())
        .collect();

    assert_eq!(primary, vec!["d", "i", "w", "e"]);
    assert_eq!(errors, vec!["e"]);
}

#[test]
fn test_error_file_same_as_primary_is_not_duplicated() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = file_config(&dir, LogLevel::Info);
    config.error_file = Some(FileOptions::new(dir.path().join("app.log")));
    let logger = config.build().expect("Failed to build logger");

    logger.error("once", &[]);
    logger.sync().expect("Failed to sync");

    assert_eq!(read_json_lines(&dir.path().join("app.log")).len(), 1);
}

#[test]
fn test_error_file_same_as_primary_keeps_primary_policy() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("app.log");
    let logger = Logger::builder()
        .level(LogLevel::Info)
        .file(&path, RotationPolicy::new().with_max_size(256).with_max_backups(1))
        .separate_error_file(&path, RotationPolicy::new().with_max_backups(5))
        .build()
        .expect("Failed to build logger");

    let filler = "x".repeat(100);
    for i in 0..10 {
        logger.info(filler.as_str(), &["seq".into(), i.into()]);
    }
    logger.sync().expect("Failed to sync");

    // Rotation follows the primary policy: small files, a single backup
    assert!(dir.path().join("app.log.1").exists());
    assert!(!dir.path().join("app.log.2").exists());
    assert!(fs::metadata(&path).expect("Missing active file").len() <= 256);
}

#[test]
fn test_json_round_trip_preserves_content() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let logger = file_config(&dir, LogLevel::Debug)
        .build()
        .expect("Failed to build logger");

    let message = "multi\nline \"quoted\" \u{1F980} tab\there";
    logger.warn(
        message,
        &[
            "user".into(),
            "ünïcødé \\ back".into(),
            "count".into(),
            42.into(),
            "ratio".into(),
            0.25.into(),
            "ok".into(),
            true.into(),
        ],
    );
    logger.sync().expect("Failed to sync");

    let records = read_json_lines(&dir.path().join("app.log"));
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["msg"], message);
    assert_eq!(record["level"], "warn");
    assert_eq!(record["user"], "ünïcødé \\ back");
    assert_eq!(record["count"], 42);
    assert_eq!(record["ratio"], 0.25);
    assert_eq!(record["ok"], true);
}

#[test]
fn test_odd_key_values_are_reported() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let logger = file_config(&dir, LogLevel::Info)
        .build()
        .expect("Failed to build logger");

    info!(logger, "odd", "port", 8081, "orphan");
    logger.sync().expect("Failed to sync");

    let records = read_json_lines(&dir.path().join("app.log"));
    assert_eq!(records[0]["port"], 8081);
    assert_eq!(records[0][IGNORED_KEY], "orphan");
}

#[test]
fn test_rotation_through_logger() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("app.log");
    let logger = Logger::builder()
        .level(LogLevel::Info)
        .file(&path, RotationPolicy::new().with_max_size(256).with_max_backups(3))
        .build()
        .expect("Failed to build logger");

    let filler = "x".repeat(100);
    for i in 0..20 {
        logger.info(filler.as_str(), &["seq".into(), i.into()]);
    }
    logger.sync().expect("Failed to sync");

    for index in 1..=3 {
        assert!(dir.path().join(format!("app.log.{}", index)).exists());
    }
    assert!(!dir.path().join("app.log.4").exists());

    // The newest record is in the active file
    let active = read_json_lines(&path);
    assert_eq!(active.last().map(|r| r["seq"].clone()), Some(serde_json::json!(19)));
}

#[test]
fn test_priming_rotates_existing_oversized_file() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("app.log");
    fs::write(&path, "y".repeat(2 * 1024 * 1024)).expect("Failed to seed file");

    let mut config = file_config(&dir, LogLevel::Info);
    if let Some(ref mut file) = config.file {
        file.max_size_mb = 1;
    }
    let logger = config.build().expect("Failed to build logger");
    logger.info("fresh", &[]);
    logger.sync().expect("Failed to sync");

    assert_eq!(read_json_lines(&path).len(), 1);
    assert_eq!(
        fs::metadata(dir.path().join("app.log.1"))
            .expect("Missing backup")
            .len(),
        2 * 1024 * 1024
    );
}

#[test]
fn test_sync_reports_failures_and_flushes_others() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let doomed_dir = dir.path().join("doomed");
    let healthy = dir.path().join("healthy.log");

    let logger = Logger::builder()
        .level(LogLevel::Info)
        .file(&healthy, RotationPolicy::new())
        .separate_error_file(doomed_dir.join("error.log"), RotationPolicy::new().with_max_size(8))
        .build()
        .expect("Failed to build logger");

    logger.error("first", &[]);
    fs::remove_dir_all(&doomed_dir).expect("Failed to remove directory");
    // Forces a rotation in a directory that no longer exists
    logger.error("second", &[]);

    let err = logger.sync().expect_err("Sync should fail");
    match err {
        LoggerError::SyncFailed { failures } => {
            assert_eq!(failures.len(), 1);
            assert!(failures[0].writer.ends_with("error.log"));
        }
        other => panic!("Unexpected error: {}", other),
    }

    let records = read_json_lines(&healthy);
    assert_eq!(records.len(), 2);
    assert!(logger.metrics().write_failures() >= 1);
    assert_eq!(logger.metrics().sync_failures(), 1);
}

#[test]
fn test_panic_record_written_before_unwinding() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let logger = file_config(&dir, LogLevel::Info)
        .build()
        .expect("Failed to build logger");

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        logger.panic("unrecoverable", &["reason".into(), "disk".into()]);
    }));

    let payload = result.expect_err("panic must unwind");
    assert_eq!(
        payload.downcast_ref::<String>().map(String::as_str),
        Some("unrecoverable")
    );

    let records = read_json_lines(&dir.path().join("app.log"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["level"], "panic");
    assert_eq!(records[0]["reason"], "disk");
}

#[test]
fn test_network_destination_receives_json() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
    let address = listener.local_addr().expect("No local address").to_string();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("Failed to accept");
        BufReader::new(stream)
            .lines()
            .map(|line| line.expect("Failed to read line"))
            .collect::<Vec<_>>()
    });

    {
        let logger = Logger::builder()
            .level(LogLevel::Warn)
            .name("edge")
            .network(address)
            .build()
            .expect("Failed to build logger");

        logger.info("filtered", &[]);
        logger.warn("shipped", &["node".into(), 3.into()]);
        logger.sync().expect("Failed to sync");
    }

    let lines = server.join().expect("Server thread panicked");
    assert_eq!(lines.len(), 1);
    let record: serde_json::Value = serde_json::from_str(&lines[0]).expect("Invalid JSON");
    assert_eq!(record["msg"], "shipped");
    assert_eq!(record["logger"], "edge");
    assert_eq!(record["node"], 3);
}

#[test]
fn test_named_child_with_fields() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut config = file_config(&dir, LogLevel::Info);
    config.name = Some("api".to_string());
    config.fields.insert("service".to_string(), serde_json::json!("billing"));
    let logger = config.build().expect("Failed to build logger");

    let child = logger.named("db").with_fields(&["pool".into(), 4.into()]);
    child.info("connected", &[]);
    logger.sync().expect("Failed to sync");

    let records = read_json_lines(&dir.path().join("app.log"));
    assert_eq!(records[0]["logger"], "api.db");
    assert_eq!(records[0]["service"], "billing");
    assert_eq!(records[0]["pool"], 4);
}

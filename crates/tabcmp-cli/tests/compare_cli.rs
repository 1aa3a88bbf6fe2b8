use serde_json::Value;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const TRADES_CONFIG: &str = r#"
{
  "csv_settings": {
    "files": {
      "trades\\.csv": {
        "keys": ["id"],
        "column_settings": [ { "names": ["npv"], "abs_tol": 0.01 } ]
      }
    }
  }
}
"#;

#[test]
fn matching_csv_files_exit_zero() {
    let temp = TempDir::new().expect("tempdir should be created");
    let expected = temp.path().join("expected/trades.csv");
    let calculated = temp.path().join("calculated/trades.csv");
    let config = temp.path().join("comparison_config.json");
    write_file(&expected, "id,npv\nT1,1.0\nT2,2.0\n");
    write_file(&calculated, "id,npv\nT2,2.005\nT1,1.0\n");
    write_file(&config, TRADES_CONFIG);

    let output = run_tabcmp(&expected, &calculated, &config, &[]);

    assert!(
        output.status.success(),
        "command should succeed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(
        String::from_utf8_lossy(&output.stdout).contains("Comparison status: MATCH"),
        "stdout should contain match status"
    );
}

#[test]
fn mismatch_exits_zero_unless_requested() {
    let temp = TempDir::new().expect("tempdir should be created");
    let expected = temp.path().join("expected/trades.csv");
    let calculated = temp.path().join("calculated/trades.csv");
    let config = temp.path().join("comparison_config.json");
    write_file(&expected, "id,npv\nT1,1.0\nT2,2.0\n");
    write_file(&calculated, "id,npv\nT1,1.0\nT2,2.5\n");
    write_file(&config, TRADES_CONFIG);

    let output = run_tabcmp(&expected, &calculated, &config, &[]);
    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Comparison status: MISMATCH"));
    assert!(
        String::from_utf8_lossy(&output.stderr).contains("column 'npv'"),
        "the group report should be logged"
    );

    let output = run_tabcmp(&expected, &calculated, &config, &["--fail-on-mismatch"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn csv_without_rule_exits_with_input_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let expected = temp.path().join("expected/flows.csv");
    let calculated = temp.path().join("calculated/flows.csv");
    let config = temp.path().join("comparison_config.json");
    write_file(&expected, "id\n1\n");
    write_file(&calculated, "id\n1\n");
    write_file(&config, TRADES_CONFIG);

    let output = run_tabcmp(&expected, &calculated, &config, &[]);

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: [INPUT.CONFIG_REQUIRED]"), "stderr: {stderr}");
    assert!(stderr.contains("FATAL EXIT CODE: 2"));
}

#[test]
fn missing_config_exits_with_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let expected = temp.path().join("a.txt");
    write_file(&expected, "same\n");

    let output = run_tabcmp(&expected, &expected, &temp.path().join("absent.json"), &[]);

    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: [IO.CONFIG_ACCESS]"));
}

#[test]
fn invalid_pattern_exits_with_input_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let expected = temp.path().join("a.txt");
    let config = temp.path().join("comparison_config.json");
    write_file(&expected, "same\n");
    write_file(&config, r#"{ "csv_settings": { "files": { "(unclosed": { "keys": ["id"] } } } }"#);

    let output = run_tabcmp(&expected, &expected, &config, &[]);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("ERROR: [INPUT.CONFIG_SCHEMA]"));
}

#[test]
fn report_file_carries_verdict_and_diagnostics() {
    let temp = TempDir::new().expect("tempdir should be created");
    let expected = temp.path().join("expected/log.txt");
    let calculated = temp.path().join("calculated/log.txt");
    let config = temp.path().join("comparison_config.json");
    let report_path = temp.path().join("report/nested/report.json");
    write_file(&expected, "started\nfinished\n");
    write_file(&calculated, "started\naborted\n");
    write_file(&config, TRADES_CONFIG);

    let output = run_tabcmp(
        &expected,
        &calculated,
        &config,
        &["--report", report_path.to_str().expect("utf-8 path"), "--label", "smoke"],
    );

    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(report_path.exists(), "report file should be created");

    let parsed: Value = serde_json::from_str(
        &fs::read_to_string(&report_path).expect("report should be readable"),
    )
    .expect("report should be valid json");
    assert_eq!(parsed["label"], "smoke");
    assert_eq!(parsed["verdict"]["matched"], false);
    assert_eq!(parsed["verdict"]["source"], "direct");
    assert_eq!(parsed["verdict"]["issues"][0]["kind"], "text_diff");
    let diagnostics = parsed["diagnostics"]
        .as_array()
        .expect("diagnostics should be an array");
    assert!(
        diagnostics
            .iter()
            .any(|entry| entry["severity"] == "warning" && entry["message"] == "+aborted")
    );
}

fn run_tabcmp(file_1: &Path, file_2: &Path, config: &Path, extra_args: &[&str]) -> Output {
    let binary_path = env!("CARGO_BIN_EXE_tabcmp");

    Command::new(binary_path)
        .arg("--file_1")
        .arg(file_1)
        .arg("--file_2")
        .arg(file_2)
        .arg("--config")
        .arg(config)
        .args(extra_args)
        .env_remove("RUST_LOG")
        .output()
        .expect("tabcmp should run")
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("parent dir should be created");
    }
    fs::write(path, content).expect("file should be written");
}

//! CLI regression tests for the `oasgate` binary.
//!
//! These tests invoke the binary as a subprocess to catch regressions in flag
//! names, exit codes, and output formats.
//!
//! Run with: `cargo test -p oasgate-test`
//! Requires the `oasgate` binary to be built first (`cargo build -p oasgate`).

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Returns an assert_cmd Command wrapping the `oasgate` binary.
fn oasgate() -> Command {
    // cargo_bin is deprecated for custom build-dir setups; fine for standard workspace use.
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("oasgate")
        .expect("oasgate binary not found, run `cargo build -p oasgate` first");
    cmd.env_remove("OASGATE_RULESET");
    cmd
}

/// Absolute path to the workspace root.
fn workspace() -> PathBuf {
    // CARGO_MANIFEST_DIR = .../crates/oasgate-test
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("crates/")
        .parent()
        .expect("workspace root")
        .to_path_buf()
}

/// Absolute path to the shared test fixtures directory.
fn fixtures() -> PathBuf {
    workspace().join("tests/fixtures")
}

/// `oasgate validate --ruleset <fixture ruleset>`.
fn validate() -> Command {
    let mut cmd = oasgate();
    cmd.arg("validate")
        .arg("--ruleset")
        .arg(fixtures().join("ruleset.yaml"));
    cmd
}

fn json_stdout(output: &[u8]) -> serde_json::Value {
    let s = std::str::from_utf8(output).expect("stdout should be valid UTF-8");
    serde_json::from_str(s).expect("--format json output should be valid JSON")
}

// ---------------------------------------------------------------------------
// oasgate validate
// ---------------------------------------------------------------------------

#[test]
fn validate_valid_spec_exits_zero() {
    validate()
        .arg("--spec")
        .arg(fixtures().join("valid.yaml"))
        .assert()
        .success()
        .stderr(contains("valid.yaml is valid"))
        .stderr(contains("validated 1 spec(s): 1 valid, 0 invalid"));
}

#[test]
fn validate_warnings_only_exits_zero() {
    validate()
        .arg("--spec")
        .arg(fixtures().join("warning.yaml"))
        .assert()
        .success()
        .stderr(contains("is valid (with 1 warning(s))"))
        .stderr(contains("info-contact"));
}

#[test]
fn validate_schema_error_exits_one() {
    validate()
        .arg("--spec")
        .arg(fixtures().join("missing-info.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("oas3-schema"));
}

#[test]
fn validate_custom_error_rule_exits_one() {
    validate()
        .arg("--spec")
        .arg(fixtures().join("plaintext-server.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("servers-https"))
        .stderr(contains("Server url http://pets.example.com/v1 must use https"));
}

#[test]
fn validate_unrecognized_format_exits_one() {
    validate()
        .arg("--spec")
        .arg(fixtures().join("unrecognized.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("unrecognized-format"));
}

#[test]
fn validate_yaml_syntax_error_exits_one() {
    validate()
        .arg("--spec")
        .arg(fixtures().join("invalid-yaml.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("parser"));
}

#[test]
fn validate_missing_file_exits_three() {
    validate()
        .args(["--spec", "this-file-does-not-exist.yaml"])
        .assert()
        .failure()
        .code(3)
        .stderr(contains("cannot read file"));
}

#[test]
fn validate_non_utf8_file_exits_one() {
    let tmp = TempDir::new().expect("temp dir");
    let spec = tmp.path().join("latin1.yaml");
    std::fs::write(&spec, b"openapi: 3.0.3\ninfo:\n  title: Caf\xe9\n").expect("write spec");

    validate()
        .arg("--spec")
        .arg(&spec)
        .assert()
        .failure()
        .code(1)
        .stderr(contains("not valid UTF-8"));
}

#[test]
fn validate_multiple_specs_summarizes() {
    validate()
        .arg("--spec")
        .arg(fixtures().join("valid.yaml"))
        .arg(fixtures().join("missing-info.yaml"))
        .assert()
        .failure()
        .code(1)
        .stderr(contains("validated 2 spec(s): 1 valid, 1 invalid"));
}

#[test]
fn validate_json_format_outputs_valid_json() {
    let output = validate()
        .arg("--spec")
        .arg(fixtures().join("warning.yaml"))
        .args(["--format", "json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = json_stdout(&output);
    assert_eq!(v["summary"]["total"], 1);
    assert_eq!(v["summary"]["valid"], 1);

    let finding = &v["results"][0]["findings"][0];
    assert_eq!(finding["code"], "info-contact");
    assert_eq!(finding["severity"], "Warning");
    assert_eq!(finding["path"], serde_json::json!(["info", "contact"]));
    assert!(finding["range"]["start"]["line"].is_u64());
}

#[test]
fn validate_json_format_invalid_spec_exits_one_with_json() {
    let output = validate()
        .arg("--spec")
        .arg(fixtures().join("unrecognized.yaml"))
        .args(["--format", "json"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let v = json_stdout(&output);
    let results = v["results"].as_array().expect("results should be an array");
    assert_eq!(results[0]["valid"], false);
    assert_eq!(v["summary"]["invalid"], 1);
}

#[test]
fn validate_bad_ruleset_exits_two() {
    oasgate()
        .arg("validate")
        .arg("--ruleset")
        .arg(fixtures().join("bad-ruleset.yaml"))
        .arg("--spec")
        .arg(fixtures().join("valid.yaml"))
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown function 'isPresent'"));
}

#[test]
fn validate_reads_ruleset_from_env() {
    oasgate()
        .env("OASGATE_RULESET", fixtures().join("ruleset.yaml"))
        .arg("validate")
        .arg("--spec")
        .arg(fixtures().join("valid.yaml"))
        .assert()
        .success();
}

#[test]
fn validate_without_spec_exits_two() {
    // clap returns exit code 2 for missing required args
    validate().assert().failure().code(2);
}

#[test]
fn validate_with_shipped_ruleset() {
    oasgate()
        .arg("validate")
        .arg("--ruleset")
        .arg(workspace().join("rulesets/custom-ruleset.yaml"))
        .arg("--spec")
        .arg(fixtures().join("valid.yaml"))
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// oasgate check-ruleset
// ---------------------------------------------------------------------------

#[test]
fn check_ruleset_lists_rules() {
    oasgate()
        .arg("check-ruleset")
        .arg("--ruleset")
        .arg(fixtures().join("ruleset.yaml"))
        .assert()
        .success()
        .stdout(contains("3 rule(s), 2 active"))
        .stdout(contains("servers-https"))
        .stdout(contains("[oas3]"));
}

#[test]
fn check_ruleset_rejects_bad_ruleset() {
    oasgate()
        .arg("check-ruleset")
        .arg("--ruleset")
        .arg(fixtures().join("bad-ruleset.yaml"))
        .assert()
        .failure()
        .code(2);
}

#[test]
fn check_ruleset_missing_file_exits_two() {
    oasgate()
        .args(["check-ruleset", "--ruleset", "no-such-ruleset.yaml"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("cannot read ruleset"));
}

#[test]
fn check_shipped_ruleset() {
    oasgate()
        .arg("check-ruleset")
        .arg("--ruleset")
        .arg(workspace().join("rulesets/custom-ruleset.yaml"))
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// oasgate serve
// ---------------------------------------------------------------------------

#[test]
fn serve_with_bad_ruleset_exits_two_before_binding() {
    oasgate()
        .args(["serve", "--listen", "127.0.0.1:0", "--ruleset"])
        .arg(fixtures().join("bad-ruleset.yaml"))
        .assert()
        .failure()
        .code(2);
}

#[test]
fn serve_rejects_unknown_log_format() {
    oasgate()
        .args(["serve", "--log-format", "xml"])
        .assert()
        .failure()
        .code(2)
        .stderr(contains("unknown log format"));
}

#[test]
fn help_lists_subcommands() {
    oasgate()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("serve"))
        .stdout(contains("validate"))
        .stdout(contains("check-ruleset"));
}

//! End-to-end tests for the deplift CLI
//!
//! These tests verify:
//! - Parse-only runs produce the JSON output schema
//! - Text output for parse-only runs
//! - Exit codes for fatal errors and bad arguments

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn deplift() -> Command {
    let mut cmd = Command::cargo_bin("deplift").expect("binary should be built");
    cmd.env_remove("DEPLIFT_CREDENTIALS")
        .env_remove("LOCAL_GITHUB_ACCESS_TOKEN")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// Create a test directory with an npm project
fn create_npm_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");

    let package_json = r#"{
  "name": "test-project",
  "version": "1.0.0",
  "dependencies": {
    "lodash": "^4.17.0"
  },
  "devDependencies": {
    "typescript": "~5.0.0"
  }
}"#;
    fs::write(temp_dir.path().join("package.json"), package_json).unwrap();

    let package_lock = r#"{
  "name": "test-project",
  "lockfileVersion": 3,
  "packages": {
    "": {"name": "test-project"},
    "node_modules/lodash": {
      "version": "4.17.21",
      "resolved": "https://registry.npmjs.org/lodash/-/lodash-4.17.21.tgz"
    },
    "node_modules/typescript": {
      "version": "5.0.4",
      "resolved": "https://registry.npmjs.org/typescript/-/typescript-5.0.4.tgz",
      "dev": true
    }
  }
}"#;
    fs::write(temp_dir.path().join("package-lock.json"), package_lock).unwrap();

    temp_dir
}

/// Create a test directory with a Puppetfile
fn create_puppet_project() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
    let puppetfile = r#"forge "https://forgeapi.puppetlabs.com"

mod "puppetlabs/stdlib", "4.25.1"
mod "puppetlabs/apt", "7.0.0"
"#;
    fs::write(temp_dir.path().join("Puppetfile"), puppetfile).unwrap();
    temp_dir
}

fn run_json(args: &[&str]) -> serde_json::Value {
    let output = deplift().args(args).output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_npm_parse_only_json() {
    let project = create_npm_project();
    let path = project.path().to_str().unwrap();

    let json = run_json(&["npm_and_yarn", path, "--parse-only", "--json"]);

    assert_eq!(json["package_manager"], "npm_and_yarn");
    assert_eq!(json["summary"]["dependencies"], 2);
    assert!(json.get("results").is_none());

    let dependencies = json["dependencies"].as_array().unwrap();
    let lodash = dependencies
        .iter()
        .find(|d| d["name"] == "lodash")
        .expect("lodash should be extracted");
    assert_eq!(lodash["version"], "4.17.21");
    assert_eq!(lodash["package_manager"], "npm_and_yarn");
    assert_eq!(lodash["requirements"][0]["requirement"], "^4.17.0");
    assert_eq!(lodash["requirements"][0]["file"], "package.json");
    assert_eq!(lodash["requirements"][0]["source"]["type"], "registry");
}

#[test]
fn test_puppet_parse_only_json() {
    let project = create_puppet_project();
    let path = project.path().to_str().unwrap();

    let json = run_json(&["puppet", path, "--parse-only", "--json"]);

    assert_eq!(json["package_manager"], "puppet");
    let names: Vec<&str> = json["dependencies"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["name"].as_str())
        .collect();
    assert!(names.contains(&"puppetlabs-stdlib"));
    assert!(names.contains(&"puppetlabs-apt"));
}

#[test]
fn test_parse_only_text_output() {
    let project = create_npm_project();

    deplift()
        .arg("npm")
        .arg(project.path())
        .arg("--parse-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("lodash"))
        .stdout(predicate::str::contains("package.json: ^4.17.0 [dependencies]"))
        .stdout(predicate::str::contains("typescript"));
}

#[test]
fn test_dir_option() {
    let project = create_npm_project();
    fs::create_dir_all(project.path().join("infra")).unwrap();
    fs::write(
        project.path().join("infra/Puppetfile"),
        "mod 'puppetlabs/ntp', '9.0.0'\n",
    )
    .unwrap();
    let path = project.path().to_str().unwrap();

    let json = run_json(&["puppet", path, "--dir", "/infra", "--parse-only", "--json"]);
    assert_eq!(json["dependencies"][0]["name"], "puppetlabs-ntp");
}

#[test]
fn test_missing_manifest_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    deplift()
        .arg("puppet")
        .arg(temp_dir.path())
        .arg("--parse-only")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("Puppetfile not found"));
}

#[test]
fn test_puppetfile_syntax_error_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("Puppetfile"), "if true\n  mod 'a/b'\n").unwrap();

    deplift()
        .arg("puppet")
        .arg(temp_dir.path())
        .arg("--parse-only")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn test_unknown_ecosystem_is_rejected() {
    deplift()
        .arg("cargo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid ecosystem 'cargo'"));
}

#[test]
fn test_invalid_credentials_fail() {
    let project = create_puppet_project();

    deplift()
        .arg("puppet")
        .arg(project.path())
        .arg("--parse-only")
        .env("DEPLIFT_CREDENTIALS", "not json")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid credentials"));
}

#[test]
fn test_version_flag() {
    deplift()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("deplift"));
}

// Command-line tests for ecore-graph

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixtures_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

// Copy both fixtures into a scratch directory so default outputs land there
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    for name in ["library.ecore", "contacts.ecore"] {
        fs::copy(fixtures_path(name), dir.path().join(name)).unwrap();
    }
    let input = dir.path().join("library.ecore");
    (dir, input)
}

fn ecore_graph() -> Command {
    let mut cmd = Command::cargo_bin("ecore-graph").unwrap();
    cmd.env_remove("ECORE_GRAPH_LOG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_convert_default_output() {
    let (dir, input) = workspace();

    ecore_graph()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Conversion finished:"))
        .stdout(predicate::str::contains("library.graphml"));

    let output = fs::read_to_string(dir.path().join("library.graphml")).unwrap();
    assert!(output.contains("<graphml"));
    assert!(output.contains("contacts::Address"));
}

#[test]
fn test_convert_explicit_output_and_materialize() {
    let (dir, input) = workspace();
    let out = dir.path().join("diagram.graphml");

    ecore_graph()
        .current_dir(dir.path())
        .args(["convert", "-e", "-o"])
        .arg(&out)
        .arg(&input)
        .assert()
        .success();

    let output = fs::read_to_string(&out).unwrap();
    assert!(output.contains("dashed"));
    assert!(!output.contains("contacts::Address"));
}

#[test]
fn test_convert_json_format() {
    let (dir, input) = workspace();

    ecore_graph()
        .current_dir(dir.path())
        .args(["convert", "--format", "json"])
        .arg(&input)
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("library.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(value["nodes"].as_array().unwrap().len(), 4);
    assert_eq!(value["edges"].as_array().unwrap().len(), 4);
}

#[test]
fn test_convert_missing_input() {
    let dir = TempDir::new().unwrap();

    ecore_graph()
        .current_dir(dir.path())
        .args(["convert", "nope.ecore"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Path not found"));
}

#[test]
fn test_convert_strict_failure_writes_nothing() {
    let (dir, input) = workspace();
    fs::remove_file(dir.path().join("contacts.ecore")).unwrap();

    ecore_graph()
        .current_dir(dir.path())
        .args(["convert", "--strict"])
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot load metamodel"));

    assert!(!dir.path().join("library.graphml").exists());
}

#[test]
fn test_convert_with_catalog_file() {
    let (dir, input) = workspace();
    fs::create_dir(dir.path().join("shared")).unwrap();
    fs::rename(
        dir.path().join("contacts.ecore"),
        dir.path().join("shared").join("contacts.ecore"),
    )
    .unwrap();
    fs::write(
        dir.path().join("catalog.toml"),
        "[schema_location]\n\"contacts.ecore\" = \"shared/contacts.ecore\"\n",
    )
    .unwrap();

    ecore_graph()
        .current_dir(dir.path())
        .args(["convert", "--strict", "--catalog", "catalog.toml"])
        .arg(&input)
        .assert()
        .success();
}

#[test]
fn test_config_file_enables_options() {
    let (dir, input) = workspace();
    fs::write(
        dir.path().join("ecore-graph.toml"),
        "[conversion]\nhide_multiplicity = true\n",
    )
    .unwrap();

    ecore_graph()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .assert()
        .success();

    let output = fs::read_to_string(dir.path().join("library.graphml")).unwrap();
    assert!(output.contains("address : contacts::Address"));
    assert!(!output.contains("[0..1]"));
}

#[test]
fn test_malformed_default_config_is_reported() {
    let (dir, input) = workspace();
    fs::write(dir.path().join("ecore-graph.toml"), "[conversion\nhide = ").unwrap();

    ecore_graph()
        .current_dir(dir.path())
        .arg("convert")
        .arg(&input)
        .assert()
        .success()
        .stderr(predicate::str::contains("Ignoring malformed config file"));

    assert!(dir.path().join("library.graphml").exists());
}

#[test]
fn test_catalog_help_describes_format() {
    ecore_graph()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[schema_location]"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let (dir, input) = workspace();

    ecore_graph()
        .current_dir(dir.path())
        .args(["convert", "-c", "missing.toml"])
        .arg(&input)
        .assert()
        .failure();
}

#[test]
fn test_version() {
    ecore_graph()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ecore-graph "));
}

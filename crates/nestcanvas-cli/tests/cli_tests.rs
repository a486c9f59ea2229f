//! CLI integration tests
//!
//! Each test drives the built binary against a scratch database.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{json, Value};
use tempfile::TempDir;

const FORMAT: &str = "nestcanvas.diagram/1";

fn diagram() -> Value {
    json!({
        "formatVersion": FORMAT,
        "nodes": [
            {"id": "a", "kind": "root", "x": 0, "y": 0, "w": 800, "h": 600, "label": "Board"},
            {"id": "b", "kind": "container", "parentId": "a", "x": 10, "y": 10, "w": 300, "h": 200},
            {"id": "c", "kind": "leaf", "parentId": "b", "x": 20, "y": 20, "w": 40, "h": 40, "label": "Card"}
        ],
        "settings": {"gridSize": 20},
        "layoutMetadata": {"algorithm": "grid", "isUserArranged": false, "preservePositions": false},
        "timestamp": 1700000000000i64
    })
}

fn write_json(dir: &TempDir, name: &str, value: &Value) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
    path
}

fn run(dir: &TempDir, args: &[&str]) -> Output {
    let db = dir.path().join("state").join("diagram.db");
    Command::new(env!("CARGO_BIN_EXE_nestcanvas"))
        .current_dir(dir.path())
        .env("RUST_LOG", "off")
        .arg("--db")
        .arg(&db)
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn test_validate_accepts_good_file() {
    let dir = TempDir::new().unwrap();
    let file = write_json(&dir, "good.json", &diagram());

    let output = run(&dir, &["validate", path_arg(&file)]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("valid (3 nodes"));
}

#[test]
fn test_validate_rejects_dangling_parent() {
    let dir = TempDir::new().unwrap();
    let mut bad = diagram();
    bad["nodes"][2]["parentId"] = "missing".into();
    let file = write_json(&dir, "bad.json", &bad);

    let output = run(&dir, &["validate", path_arg(&file)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("'missing'"));
    assert!(stderr(&output).starts_with("Error:"));
}

#[test]
fn test_validate_json_report() {
    let dir = TempDir::new().unwrap();
    let mut warn = diagram();
    warn["nodes"][1]["label"] = 5.into();
    let file = write_json(&dir, "warn.json", &warn);

    let output = run(&dir, &["validate", "--json", path_arg(&file)]);

    assert!(output.status.success());
    let report: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["errors"].as_array().unwrap().len(), 0);
    assert!(!report["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_import_then_restore_prints_outline() {
    let dir = TempDir::new().unwrap();
    let file = write_json(&dir, "diagram.json", &diagram());

    let import = run(&dir, &["import", path_arg(&file)]);
    assert!(import.status.success(), "stderr: {}", stderr(&import));
    assert!(stdout(&import).contains("Imported 3 nodes"));

    let restore = run(&dir, &["restore"]);
    assert!(restore.status.success(), "stderr: {}", stderr(&restore));
    let text = stdout(&restore);
    assert!(text.contains("- node-1 [root] \"Board\""));
    assert!(text.contains("    - node-3 [leaf] \"Card\""));
}

#[test]
fn test_import_unknown_format_fails() {
    let dir = TempDir::new().unwrap();
    let mut old = diagram();
    old["formatVersion"] = "0.9".into();
    let file = write_json(&dir, "old.json", &old);

    let output = run(&dir, &["import", path_arg(&file)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Import failed"));

    let status = run(&dir, &["status"]);
    assert!(stdout(&status).contains("No saved diagram"));
}

#[test]
fn test_status_after_import() {
    let dir = TempDir::new().unwrap();
    let file = write_json(&dir, "diagram.json", &diagram());
    run(&dir, &["import", path_arg(&file)]);

    let output = run(&dir, &["status", "--json"]);

    assert!(output.status.success());
    let status: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(status["saved"], true);
    assert_eq!(status["intact"], true);
    assert_eq!(status["cleared"], false);
    assert_eq!(status["nodeCount"], 3);
}

#[test]
fn test_export_round_trips_through_validate() {
    let dir = TempDir::new().unwrap();
    let file = write_json(&dir, "diagram.json", &diagram());
    run(&dir, &["import", path_arg(&file)]);

    let out = dir.path().join("out").join("export.json");
    let export = run(&dir, &["export", path_arg(&out)]);
    assert!(export.status.success(), "stderr: {}", stderr(&export));
    assert!(stdout(&export).contains("Exported 3 nodes"));

    let exported: Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
    assert_eq!(exported["formatVersion"], FORMAT);
    assert!(run(&dir, &["validate", path_arg(&out)]).status.success());
}

#[test]
fn test_export_without_saved_diagram_fails() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("export.json");

    let output = run(&dir, &["export", path_arg(&out)]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists());
}

#[test]
fn test_clear_removes_saved_diagram() {
    let dir = TempDir::new().unwrap();
    let file = write_json(&dir, "diagram.json", &diagram());
    run(&dir, &["import", path_arg(&file)]);

    let clear = run(&dir, &["clear"]);
    assert!(clear.status.success());

    let status = run(&dir, &["status"]);
    assert!(stdout(&status).contains("No saved diagram"));
    let restore = run(&dir, &["restore"]);
    assert!(stdout(&restore).contains("No saved diagram"));
}

#[test]
fn test_bad_config_is_reported() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("engine.toml");
    fs::write(&config, "save_debounce = 10\n").unwrap();

    let output = run(&dir, &["--config", path_arg(&config), "status"]);
    // status does not read the config
    assert!(output.status.success());

    let output = run(&dir, &["--config", path_arg(&config), "restore"]);
    assert_eq!(output.status.code(), Some(1));
}

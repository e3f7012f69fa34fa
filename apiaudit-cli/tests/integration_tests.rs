//! Integration tests for the apiaudit CLI
//!
//! Tests end-to-end command behavior using the CLI binary.
//! Uses tempfile for isolated package trees and report directories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Run apiaudit with the given args in the specified directory
fn run_apiaudit(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_apiaudit"))
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("Failed to execute apiaudit command")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_file(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).expect("Failed to write fixture file");
}

/// First version of the `shop` package under `root`.
fn write_shop_v1(root: &Path) {
    write_file(
        &root.join("shop/__init__.py"),
        r#"
from .widgets import Widget, make_widget

MAX_SIZE = 10
"#,
    );
    write_file(
        &root.join("shop/widgets.py"),
        r#"
class WidgetError(ValueError):
    pass


class Widget(object):
    color = "red"

    def __init__(self, name):
        self.name = name

    def resize(self, width):
        pass


def make_widget(name):
    return Widget(name)
"#,
    );
    write_file(&root.join("shop/tests/__init__.py"), "");
    write_file(&root.join("shop/tests/test_widgets.py"), "def test_x():\n    pass\n");
}

/// Second version: `resize` gains a required parameter, a function and a
/// constant are added.
fn write_shop_v2(root: &Path) {
    write_shop_v1(root);
    write_file(
        &root.join("shop/widgets.py"),
        r#"
class WidgetError(ValueError):
    pass


class Widget(object):
    color = "red"

    def __init__(self, name):
        self.name = name

    def resize(self, width, height):
        pass


def make_widget(name):
    return Widget(name)


def make_gadget(name, size=1):
    return None

EXTRA = 3
"#,
    );
}

// ============================================================================
// General
// ============================================================================

#[test]
fn test_no_command_prints_help() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_apiaudit(temp_dir.path(), &[]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("changelog"));
}

// ============================================================================
// Report Command Tests
// ============================================================================

#[test]
fn test_report_writes_one_file_per_module() {
    let temp_dir = TempDir::new().unwrap();
    write_shop_v1(&temp_dir.path().join("src"));

    let output = run_apiaudit(
        temp_dir.path(),
        &["report", "shop", "--search-path", "src", "--output-dir", "out"],
    );
    assert!(output.status.success(), "report failed: {}", stderr(&output));

    let reports = temp_dir.path().join("out/shop/code_reports/latest");
    assert!(reports.join("__init__.json").exists());
    assert!(reports.join("widgets.json").exists());
    assert!(!reports.join("tests.json").exists());

    let widgets: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(reports.join("widgets.json")).unwrap()).unwrap();
    assert_eq!(
        widgets["classes"]["Widget"]["methods"]["resize"],
        serde_json::json!({"name": "resize", "parameters": [{"name": "self"}, {"name": "width"}]})
    );
    assert_eq!(
        widgets["exceptions"]["WidgetError"],
        serde_json::json!({"name": "WidgetError", "baseclasses": ["ValueError"]})
    );

    let init: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(reports.join("__init__.json")).unwrap()).unwrap();
    assert_eq!(init["classes"]["Widget"]["source"], "shop.widgets");
    assert_eq!(init["others"]["MAX_SIZE"], "10");
}

#[test]
fn test_report_aggregate_json_output() {
    let temp_dir = TempDir::new().unwrap();
    write_shop_v1(&temp_dir.path().join("src"));

    let output = run_apiaudit(
        temp_dir.path(),
        &[
            "report",
            "shop",
            "--search-path",
            "src",
            "--output-dir",
            "out",
            "--aggregate-report",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "report failed: {}", stderr(&output));

    let summary: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(summary["package"], "shop");
    assert_eq!(summary["versions"][0]["version"], "latest");
    assert_eq!(summary["versions"][0]["modules"], 2);

    let aggregate = temp_dir.path().join("out/shop/code_reports/latest/report.json");
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(aggregate).unwrap()).unwrap();
    assert!(report.get("shop").is_some());
    assert!(report.get("shop.widgets").is_some());
}

#[test]
fn test_report_missing_module_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_apiaudit(temp_dir.path(), &["report", "nothing-here"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("nothing.here"));
}

#[test]
fn test_report_unprovisioned_version_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_apiaudit(temp_dir.path(), &["report", "shop", "--version", "1.0.0"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("shop==1.0.0"));
}

// ============================================================================
// Changelog Command Tests
// ============================================================================

#[test]
fn test_changelog_between_provisioned_versions() {
    let temp_dir = TempDir::new().unwrap();
    write_shop_v1(&temp_dir.path().join("envs/shop/1.0.0"));
    write_shop_v2(&temp_dir.path().join("envs/shop/2.0.0"));
    write_file(
        &temp_dir.path().join(".apiaudit.toml"),
        "[provision]\nenvironments_dir = \"envs\"\n",
    );

    let output = run_apiaudit(temp_dir.path(), &["changelog", "shop:1.0.0", "shop:2.0.0"]);
    assert!(output.status.success(), "changelog failed: {}", stderr(&output));

    assert_eq!(
        stdout(&output).trim_end(),
        "**Features**\n\n\
         - Function make_gadget in module shop.widgets is new.\n\n\
         **Breaking changes**\n\n\
         - Method resize of Widget in module shop.widgets has a different signature."
    );
}

#[test]
fn test_changelog_between_report_files() {
    let temp_dir = TempDir::new().unwrap();
    let report = r#"{"functions": {}, "classes": {}, "exceptions": {}, "others": {}}"#;
    write_file(&temp_dir.path().join("old/shop/code_reports/1.0/core.json"), report);
    write_file(
        &temp_dir.path().join("new/shop/code_reports/2.0/core.json"),
        r#"{"functions": {"make": {"name": "make", "parameters": []}}, "classes": {}, "exceptions": {}, "others": {}}"#,
    );

    let output = run_apiaudit(
        temp_dir.path(),
        &[
            "changelog",
            "old/shop/code_reports/1.0/core.json",
            "new/shop/code_reports/2.0/core.json",
            "--format",
            "json",
        ],
    );
    assert!(output.status.success(), "changelog failed: {}", stderr(&output));

    let result: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(
        result["features"],
        serde_json::json!(["Function make in module shop.core is new."])
    );
    assert_eq!(result["breaking_changes"], serde_json::json!([]));
}

#[test]
fn test_changelog_identical_reports_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    write_shop_v1(&temp_dir.path().join("src"));

    let output = run_apiaudit(
        temp_dir.path(),
        &["changelog", "shop:latest", "shop:latest", "--search-path", "src"],
    );
    assert!(output.status.success(), "changelog failed: {}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "");
}

#[test]
fn test_changelog_rejects_non_mapping_report() {
    let temp_dir = TempDir::new().unwrap();
    write_file(&temp_dir.path().join("a.json"), "[1, 2]");
    write_file(&temp_dir.path().join("b.json"), "{}");

    let output = run_apiaudit(temp_dir.path(), &["changelog", "a.json", "b.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Incompatible reports"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_changelog_missing_file_fails() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_apiaudit(temp_dir.path(), &["changelog", "missing.json", "other.json"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("missing.json"));
}

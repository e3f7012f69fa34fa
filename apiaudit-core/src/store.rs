//! Report persistence.
//!
//! Reports live under `<root>/<package>/code_reports/<version>/`: one
//! `<submodule>.json` per module (`__init__.json` for the package itself) or
//! a single `report.json` aggregate.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::error::{AuditError, Result};
use crate::extract::sub_module_part;
use crate::report::{AggregateReport, ModuleReport, CLASSES, EXCEPTIONS, FUNCTIONS, MODELS, OPERATIONS, OTHERS};

pub const REPORTS_DIR: &str = "code_reports";
pub const AGGREGATE_FILE: &str = "report.json";
pub const PACKAGE_FILE_STEM: &str = "__init__";
pub const DEFAULT_VERSION: &str = "latest";

/// Writes reports into the `code_reports` layout below a root directory.
#[derive(Clone, Debug)]
pub struct ReportStore {
    root: PathBuf,
}

impl ReportStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn version_dir(&self, package: &str, version: Option<&str>) -> PathBuf {
        self.root
            .join(package)
            .join(REPORTS_DIR)
            .join(version.unwrap_or(DEFAULT_VERSION))
    }

    /// File of one module's report.
    pub fn module_path(&self, package: &str, version: Option<&str>, module: &str) -> PathBuf {
        let sub = sub_module_part(package, module);
        let stem = if sub.is_empty() { PACKAGE_FILE_STEM } else { sub.as_str() };
        self.version_dir(package, version).join(format!("{}.json", stem))
    }

    pub fn aggregate_path(&self, package: &str, version: Option<&str>) -> PathBuf {
        self.version_dir(package, version).join(AGGREGATE_FILE)
    }

    pub fn write_report(
        &self,
        package: &str,
        version: Option<&str>,
        module: &str,
        report: &ModuleReport,
    ) -> Result<PathBuf> {
        let path = self.module_path(package, version, module);
        write_json(&path, report)?;
        Ok(path)
    }

    pub fn write_aggregate(
        &self,
        package: &str,
        version: Option<&str>,
        report: &AggregateReport,
    ) -> Result<PathBuf> {
        let path = self.aggregate_path(package, version);
        write_json(&path, report)?;
        Ok(path)
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| AuditError::io(parent, e))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).map_err(|e| AuditError::io(path, e))?;
    info!("Report written to {}", path.display());
    Ok(())
}

/// Read a persisted report, single-module or aggregate.
pub fn load_report(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
    Ok(serde_json::from_str(&text)?)
}

/// Whether `value` looks like a single-module report rather than an
/// aggregate keyed by module name.
pub fn is_module_report(value: &Value) -> bool {
    const CATEGORIES: [&str; 6] = [FUNCTIONS, CLASSES, EXCEPTIONS, OTHERS, OPERATIONS, MODELS];
    match value.as_object() {
        Some(map) => {
            map.contains_key(FUNCTIONS) && map.keys().all(|k| CATEGORIES.contains(&k.as_str()))
        }
        None => false,
    }
}

/// Module name of a persisted single-module report.
///
/// Inside a `<package>/code_reports/<version>/` tree the name is rebuilt
/// from the package directory and the file stem; elsewhere the stem is used.
pub fn infer_module_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let package = path
        .parent()
        .and_then(Path::parent)
        .filter(|dir| dir.file_name().is_some_and(|n| n == REPORTS_DIR))
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().replace('-', "."));

    match package {
        Some(package) if stem == PACKAGE_FILE_STEM => package,
        Some(package) => format!("{}.{}", package, stem),
        None => stem,
    }
}

/// Key a single-module report by its module name; aggregates pass through.
pub fn as_aggregate(report: Value, module: &str) -> Value {
    if is_module_report(&report) {
        let mut map = Map::new();
        map.insert(module.to_string(), report);
        Value::Object(map)
    } else {
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let store = ReportStore::new("/reports");
        assert_eq!(
            store.module_path("azure-mgmt-shop", Some("1.0.0"), "azure.mgmt.shop.models"),
            PathBuf::from("/reports/azure-mgmt-shop/code_reports/1.0.0/models.json")
        );
        assert_eq!(
            store.module_path("azure-mgmt-shop", None, "azure.mgmt.shop"),
            PathBuf::from("/reports/azure-mgmt-shop/code_reports/latest/__init__.json")
        );
        assert_eq!(
            store.aggregate_path("shop", Some("2.0")),
            PathBuf::from("/reports/shop/code_reports/2.0/report.json")
        );
    }

    #[test]
    fn test_write_and_load() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path());

        let mut report = ModuleReport::default();
        report.others.insert("MAX".to_string(), json!("3"));
        let path = store.write_report("shop", Some("1.0"), "shop.core", &report).unwrap();
        assert!(path.ends_with("shop/code_reports/1.0/core.json"));

        let loaded = load_report(&path).unwrap();
        assert_eq!(loaded["others"]["MAX"], json!("3"));
        assert!(is_module_report(&loaded));
        assert_eq!(infer_module_name(&path), "shop.core");

        let mut aggregate = AggregateReport::new();
        aggregate.insert("shop.core".to_string(), report);
        let path = store.write_aggregate("shop", Some("1.0"), &aggregate).unwrap();
        let loaded = load_report(&path).unwrap();
        assert!(!is_module_report(&loaded));
        assert!(loaded.get("shop.core").is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_report(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AuditError::Io { .. }));
    }

    #[test]
    fn test_infer_module_name() {
        assert_eq!(
            infer_module_name(Path::new("out/azure-mgmt-shop/code_reports/1.0/__init__.json")),
            "azure.mgmt.shop"
        );
        assert_eq!(
            infer_module_name(Path::new("out/azure-mgmt-shop/code_reports/1.0/v1.models.json")),
            "azure.mgmt.shop.v1.models"
        );
        assert_eq!(infer_module_name(Path::new("/tmp/old.json")), "old");
    }

    #[test]
    fn test_as_aggregate() {
        let single = json!({"functions": {}, "classes": {}, "exceptions": {}, "others": {}});
        assert_eq!(
            as_aggregate(single.clone(), "shop"),
            json!({"shop": single})
        );

        let aggregate = json!({"shop": {"functions": {}}});
        assert_eq!(as_aggregate(aggregate.clone(), "shop"), aggregate);
    }
}

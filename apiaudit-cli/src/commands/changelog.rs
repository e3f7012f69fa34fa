//! Changelog command - Classify API changes between two reports
//!
//! Each operand is a report file or `<package>:<version>`, where version is
//! a literal version, `latest` (the installed package) or `pypi` (the most
//! recent published release). Package operands are extracted in memory as
//! aggregate reports of the whole package.

use std::path::{Path, PathBuf};

use anyhow::Context;
use apiaudit_core::extract::{self, parse_input};
use apiaudit_core::{build_change_log, store, ChangeLog, PythonSourceReflector};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::AuditSettings;
use crate::output::{Output, OutputConfig, Outputter};

/// Version part of a package operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSpec {
    Latest,
    Pypi,
    Exact(String),
}

impl VersionSpec {
    fn parse(text: &str) -> Self {
        match text {
            "latest" => VersionSpec::Latest,
            "pypi" => VersionSpec::Pypi,
            other => VersionSpec::Exact(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    File(PathBuf),
    Package { input: String, version: VersionSpec },
}

impl Operand {
    /// Existing paths are files; otherwise `name:version` is a package.
    pub fn parse(text: &str) -> Self {
        if Path::new(text).exists() {
            return Operand::File(PathBuf::from(text));
        }
        match text.split_once(':') {
            Some((input, version)) => Operand::Package {
                input: input.to_string(),
                version: VersionSpec::parse(version),
            },
            None => Operand::File(PathBuf::from(text)),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChangelogResult {
    pub base: String,
    pub latest: String,
    #[serde(flatten)]
    pub changelog: ChangeLog,
}

impl Outputter for ChangelogResult {
    fn to_text(&self, _config: &OutputConfig) -> String {
        self.changelog.build_md()
    }
}

/// Load an operand as a report keyed by module name.
pub async fn load_operand(operand: &Operand, settings: &AuditSettings) -> anyhow::Result<Value> {
    match operand {
        Operand::File(path) => {
            let report = store::load_report(path)
                .with_context(|| format!("Failed to load report {}", path.display()))?;
            Ok(store::as_aggregate(report, &store::infer_module_name(path)))
        }
        Operand::Package { input, version } => {
            let (package, module) = parse_input(input);
            let roots = match version {
                VersionSpec::Latest => settings.search_paths.clone(),
                VersionSpec::Exact(version) => settings.roots_for(&package, version)?,
                VersionSpec::Pypi => {
                    let version = settings.pypi().latest_version(&package).await?;
                    info!("Latest version of {} on PyPI is {}", package, version);
                    settings.roots_for(&package, version.as_str())?
                }
            };

            let reflector = PythonSourceReflector::new(roots);
            let report = extract::extract_package(&reflector, &module, &settings.options)
                .with_context(|| format!("Was not able to build a report for {}", input))?;
            Ok(serde_json::to_value(report)?)
        }
    }
}

pub async fn run(
    base: &str,
    latest: &str,
    settings: &AuditSettings,
    output: OutputConfig,
) -> anyhow::Result<()> {
    let old_report = load_operand(&Operand::parse(base), settings).await?;
    let new_report = load_operand(&Operand::parse(latest), settings).await?;

    let changelog = build_change_log(&old_report, &new_report)?;
    info!(
        "{} feature(s), {} breaking change(s)",
        changelog.features.len(),
        changelog.breaking_changes.len()
    );

    let result = ChangelogResult {
        base: base.to_string(),
        latest: latest.to_string(),
        changelog,
    };
    Output::new(result, output).render()
}

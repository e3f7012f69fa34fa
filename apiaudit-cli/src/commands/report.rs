//! Report command - Extract and persist public API reports
//!
//! Reports the installed package by default, or one or more published
//! versions from their provisioned environments.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::Context;
use apiaudit_core::extract::{self, parse_input};
use apiaudit_core::{ExtractOptions, PythonSourceReflector, ReportStore};
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use super::AuditSettings;
use crate::output::{Output, OutputConfig, Outputter};

/// Which versions to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionSelection {
    /// The package found on the search paths.
    Installed,
    /// One explicit version.
    Exact(String),
    /// Every published version.
    AllPublished,
    /// The latest published version.
    LatestPublished,
}

impl VersionSelection {
    pub fn from_flags(version: Option<String>, pypi: bool, last_pypi: bool) -> Self {
        match (version, pypi, last_pypi) {
            (Some(version), _, _) => VersionSelection::Exact(version),
            (None, _, true) => VersionSelection::LatestPublished,
            (None, true, false) => VersionSelection::AllPublished,
            (None, false, false) => VersionSelection::Installed,
        }
    }
}

/// Reports written for one version.
#[derive(Debug, Serialize)]
pub struct VersionReports {
    pub version: String,
    pub modules: usize,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct ReportResult {
    pub package: String,
    pub module: String,
    pub versions: Vec<VersionReports>,
    /// Versions that could not be reported, with the reason.
    pub skipped: Vec<(String, String)>,
    pub duration_ms: u64,
}

impl Outputter for ReportResult {
    fn to_text(&self, _config: &OutputConfig) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "{} {} ({}ms)",
            "REPORT:".cyan().bold(),
            self.module.yellow(),
            self.duration_ms
        ));

        for version in &self.versions {
            lines.push(format!(
                "  {} {} module(s)",
                version.version.green().bold(),
                version.modules
            ));
            for file in &version.files {
                lines.push(format!("    {}", file.display().to_string().dimmed()));
            }
        }

        for (version, reason) in &self.skipped {
            lines.push(format!("  {} {}: {}", "SKIPPED".red(), version, reason));
        }

        lines.join("\n")
    }
}

/// Extract every module of `module` from `roots` and write the reports.
pub fn write_reports(
    roots: Vec<PathBuf>,
    package: &str,
    module: &str,
    version: Option<&str>,
    options: &ExtractOptions,
    aggregate: bool,
    store: &ReportStore,
) -> anyhow::Result<VersionReports> {
    let reflector = PythonSourceReflector::new(roots);
    let modules = extract::find_all_modules(&reflector, module, &options.denylist)?;
    let reports = extract::create_reports(&reflector, &modules, options)?;

    let files = if aggregate {
        let report = extract::aggregate(reports);
        vec![store.write_aggregate(package, version, &report)?]
    } else {
        reports
            .iter()
            .map(|(name, report)| store.write_report(package, version, name, report))
            .collect::<apiaudit_core::Result<Vec<_>>>()?
    };

    Ok(VersionReports {
        version: version.unwrap_or(apiaudit_core::store::DEFAULT_VERSION).to_string(),
        modules: modules.len(),
        files,
    })
}

pub async fn run(
    input: &str,
    selection: VersionSelection,
    aggregate: bool,
    settings: &AuditSettings,
    output_dir: &Path,
    output: OutputConfig,
) -> anyhow::Result<()> {
    let start = Instant::now();
    let (package, module) = parse_input(input);
    let store = ReportStore::new(output_dir);

    let mut result = ReportResult {
        package: package.clone(),
        module: module.clone(),
        versions: Vec::new(),
        skipped: Vec::new(),
        duration_ms: 0,
    };

    let versions = match &selection {
        VersionSelection::Installed => {
            let written = write_reports(
                settings.search_paths.clone(),
                &package,
                &module,
                None,
                &settings.options,
                aggregate,
                &store,
            )
            .with_context(|| format!("Failed to report {}", module))?;
            result.versions.push(written);
            Vec::new()
        }
        VersionSelection::Exact(version) => vec![version.clone()],
        VersionSelection::AllPublished | VersionSelection::LatestPublished => {
            info!("Download versions of {} on PyPI", package);
            let mut published: Vec<String> = settings
                .pypi()
                .ordered_versions(&package)
                .await?
                .iter()
                .map(|v| v.as_str().to_string())
                .collect();
            info!("Got {:?}", published);
            if selection == VersionSelection::LatestPublished {
                published = published.pop().into_iter().collect();
            }
            published
        }
    };

    let single = versions.len() == 1 && matches!(selection, VersionSelection::Exact(_));
    for version in versions {
        let written = settings.roots_for(&package, &version).and_then(|roots| {
            write_reports(
                roots,
                &package,
                &module,
                Some(&version),
                &settings.options,
                aggregate,
                &store,
            )
        });
        match written {
            Ok(written) => result.versions.push(written),
            Err(e) if single => {
                return Err(e.context(format!("Failed to report {} {}", module, version)));
            }
            Err(e) => {
                warn!("Version {} could not be reported: {:#}", version, e);
                result.skipped.push((version, format!("{:#}", e)));
            }
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    Output::new(result, output).render()
}

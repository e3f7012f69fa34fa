//! Command implementations for the apiaudit CLI
//!
//! Each command module provides a `run` function that executes the command logic.

pub mod changelog;
pub mod report;
pub mod versions;

use std::path::PathBuf;

use apiaudit_core::ExtractOptions;

use crate::config::AuditConfig;
use crate::provision::{DirectoryProvisioner, Provisioner};
use crate::pypi::PypiClient;

/// Extraction settings: command-line flags over `.apiaudit.toml`.
#[derive(Debug, Clone)]
pub struct AuditSettings {
    /// Module roots of the currently installed package.
    pub search_paths: Vec<PathBuf>,
    pub options: ExtractOptions,
    pub environments_dir: PathBuf,
    pub pypi_host: String,
}

impl AuditSettings {
    pub fn resolve(
        config: &AuditConfig,
        search_paths: Vec<PathBuf>,
        denylist: Vec<String>,
        groupings: bool,
    ) -> Self {
        Self {
            search_paths: if search_paths.is_empty() {
                config.search_paths()
            } else {
                search_paths
            },
            options: ExtractOptions {
                groupings: groupings || config.groupings(),
                denylist: if denylist.is_empty() {
                    config.denylist()
                } else {
                    denylist
                },
            },
            environments_dir: config.environments_dir(),
            pypi_host: config.pypi_host().to_string(),
        }
    }

    pub fn provisioner(&self) -> DirectoryProvisioner {
        DirectoryProvisioner::new(&self.environments_dir)
    }

    pub fn pypi(&self) -> PypiClient {
        PypiClient::new(&self.pypi_host)
    }

    /// Module roots of `package` at `version`.
    pub fn roots_for(&self, package: &str, version: &str) -> anyhow::Result<Vec<PathBuf>> {
        Ok(vec![self.provisioner().provision(package, version)?])
    }
}

//! apiaudit configuration loading from `.apiaudit.toml`.
//!
//! Configuration is optional; every setting has a default and command-line
//! flags override the file.
//!
//! # Example Configuration
//!
//! ```toml
//! [extract]
//! search_paths = ["site-packages"]
//! denylist = ["tests", "_vendor"]
//! groupings = true
//!
//! [output]
//! reports_dir = "reports"
//! format = "json"
//! color = false
//!
//! [provision]
//! environments_dir = "/opt/envs"
//!
//! [pypi]
//! host = "https://pypi.org"
//! ```

use std::path::{Path, PathBuf};

use apiaudit_core::extract::DEFAULT_DENYLIST;
use serde::Deserialize;

pub const CONFIG_FILE: &str = ".apiaudit.toml";
pub const DEFAULT_ENVIRONMENTS_DIR: &str = ".apiaudit/envs";
pub const DEFAULT_PYPI_HOST: &str = "https://pypi.org";

/// Root configuration structure loaded from `.apiaudit.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct AuditConfig {
    /// Module roots and extraction switches.
    #[serde(default)]
    pub extract: ExtractSettings,

    /// Where reports go and how results are printed.
    #[serde(default)]
    pub output: OutputSettings,

    /// Per-version package environments.
    #[serde(default)]
    pub provision: ProvisionSettings,

    /// Package index.
    #[serde(default)]
    pub pypi: PypiSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct ExtractSettings {
    /// Directories searched for modules, in order.
    ///
    /// Default: the working directory.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Module names skipped when walking a package.
    ///
    /// Default: `["tests"]`.
    #[serde(default)]
    pub denylist: Option<Vec<String>>,

    /// Also report operation groups and data models.
    #[serde(default)]
    pub groupings: bool,
}

/// Output preferences. `--format` overrides `format`.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Directory receiving the `<package>/code_reports` trees.
    #[serde(default)]
    pub reports_dir: Option<PathBuf>,

    /// Default output format: `text` or `json`.
    #[serde(default)]
    pub format: Option<String>,

    /// Whether to use colored output; auto-detected when unset.
    #[serde(default)]
    pub color: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ProvisionSettings {
    /// Directory holding `<package>/<version>` environments.
    #[serde(default)]
    pub environments_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PypiSettings {
    #[serde(default)]
    pub host: Option<String>,
}

impl AuditConfig {
    /// Load configuration from `.apiaudit.toml` in the given directory.
    ///
    /// A missing file yields defaults; an unreadable or malformed one is
    /// logged and also yields defaults.
    pub fn load(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse {}: {}", CONFIG_FILE, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read {}: {}", CONFIG_FILE, e);
                }
            }
        }
        Self::default()
    }

    /// Search paths, falling back to the working directory.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        if self.extract.search_paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.extract.search_paths.clone()
        }
    }

    pub fn denylist(&self) -> Vec<String> {
        match &self.extract.denylist {
            Some(denylist) => denylist.clone(),
            None => DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn groupings(&self) -> bool {
        self.extract.groupings
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.output
            .reports_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }

    pub fn environments_dir(&self) -> PathBuf {
        self.provision
            .environments_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENVIRONMENTS_DIR))
    }

    pub fn pypi_host(&self) -> &str {
        self.pypi.host.as_deref().unwrap_or(DEFAULT_PYPI_HOST)
    }
}

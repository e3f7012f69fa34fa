//! Package environments for specific versions.
//!
//! Reports against a published version are extracted from an environment
//! where that version is installed. Environments are prepared outside of
//! apiaudit, e.g. with `pip install --target <dir>/<package>/<version>
//! <package>==<version>`.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error(
        "No environment for {package}=={version} at {}; install it with `pip install --target {} {package}=={version}`",
        path.display(),
        path.display()
    )]
    Missing {
        package: String,
        version: String,
        path: PathBuf,
    },
}

/// Source of module search roots for a given package version.
pub trait Provisioner {
    fn provision(&self, package: &str, version: &str) -> Result<PathBuf, ProvisionError>;
}

/// Looks up pre-installed environments at `<environments_dir>/<package>/<version>`.
#[derive(Debug, Clone)]
pub struct DirectoryProvisioner {
    environments_dir: PathBuf,
}

impl DirectoryProvisioner {
    pub fn new(environments_dir: impl Into<PathBuf>) -> Self {
        Self {
            environments_dir: environments_dir.into(),
        }
    }
}

impl Provisioner for DirectoryProvisioner {
    fn provision(&self, package: &str, version: &str) -> Result<PathBuf, ProvisionError> {
        let path = self.environments_dir.join(package).join(version);
        if !path.is_dir() {
            return Err(ProvisionError::Missing {
                package: package.to_string(),
                version: version.to_string(),
                path,
            });
        }
        let root = site_packages(&path).unwrap_or(path);
        debug!("Using environment {} for {}=={}", root.display(), package, version);
        Ok(root)
    }
}

/// `lib/python*/site-packages` of a virtual environment, if `env` is one.
fn site_packages(env: &Path) -> Option<PathBuf> {
    let mut candidates: Vec<PathBuf> = fs::read_dir(env.join("lib"))
        .ok()?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("python"))
        .map(|entry| entry.path().join("site-packages"))
        .filter(|path| path.is_dir())
        .collect();
    candidates.sort();
    candidates.pop()
}

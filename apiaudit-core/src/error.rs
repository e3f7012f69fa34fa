//! Error types for apiaudit-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for apiaudit-core operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Errors raised while reflecting over a package.
///
/// Any of these is fatal for the module reference that produced it: no
/// partial report is built from a module that cannot be resolved.
#[derive(Error, Debug)]
pub enum ReflectError {
    /// No search root contains the requested module.
    #[error("No module named '{module}'")]
    ModuleNotFound {
        /// Fully qualified module name that was requested.
        module: String,
    },

    /// The module was located but its source could not be read.
    #[error("Failed to read module '{module}' from {path}: {source}")]
    Unreadable {
        /// Fully qualified module name.
        module: String,
        /// File that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The grammar could not be loaded or produced no tree.
    #[error("Failed to parse module '{module}': {message}")]
    Parse {
        /// Fully qualified module name.
        module: String,
        /// Description of the parser failure.
        message: String,
    },
}

/// Errors that can occur while building, storing or comparing reports.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Module resolution or reflection failed.
    #[error(transparent)]
    Reflect(#[from] ReflectError),

    /// IO error on a report file.
    #[error("IO error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The two reports handed to the changelog cannot be compared at all.
    #[error("Incompatible reports: {message}")]
    IncompatibleReports {
        /// What is wrong with the operands.
        message: String,
    },
}

impl AuditError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AuditError::Io {
            path: path.into(),
            source,
        }
    }
}

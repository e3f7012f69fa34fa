//! apiaudit core - public API snapshots and changelog classification for
//! Python packages.
//!
//! The pipeline has four stages:
//!
//! - **Reflection**: a [`Reflector`] lists what a module exposes. The
//!   shipped [`PythonSourceReflector`] reads installed source trees with
//!   tree-sitter.
//! - **Extraction**: [`extract::create_report`] turns a module surface into a
//!   canonical [`ModuleReport`].
//! - **Diffing**: [`treediff::diff`] computes structural edits between two
//!   reports.
//! - **Classification**: [`changelog::build_change_log`] decides what each
//!   edit means and renders the result as Markdown.
//!
//! # Usage
//!
//! ```no_run
//! use apiaudit_core::{changelog, extract, PythonSourceReflector};
//!
//! let old = PythonSourceReflector::new(vec!["envs/shop/1.0".into()]);
//! let new = PythonSourceReflector::new(vec!["envs/shop/2.0".into()]);
//! let options = extract::ExtractOptions::default();
//!
//! let old = extract::extract_package(&old, "shop", &options)?;
//! let new = extract::extract_package(&new, "shop", &options)?;
//! let log = changelog::build_change_log(
//!     &serde_json::to_value(&old)?,
//!     &serde_json::to_value(&new)?,
//! )?;
//! println!("{}", log.build_md());
//! # Ok::<(), apiaudit_core::AuditError>(())
//! ```

pub mod changelog;
pub mod error;
pub mod extract;
pub mod reflect;
pub mod report;
pub mod store;
pub mod treediff;
pub mod versions;

pub use changelog::{build_change_log, ChangeLog, Verdict};
pub use error::{AuditError, ReflectError, Result};
pub use extract::ExtractOptions;
pub use reflect::{PythonSourceReflector, Reflector};
pub use report::{AggregateReport, ModuleReport};
pub use store::ReportStore;

/// Get the version of apiaudit-core.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

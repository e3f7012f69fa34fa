//! Changelog generation from two reports.
//!
//! The reports are diffed with [`crate::treediff::diff`] and every edit is
//! classified on its own by [`rules::classify`]. Entries keep the order of
//! the edits that produced them.

pub mod markdown;
mod messages;
pub mod rules;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{AuditError, Result};
use crate::treediff;

pub use rules::{classify, Verdict};

/// Classified entries of a comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeLog {
    pub features: Vec<String>,
    pub breaking_changes: Vec<String>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verdict, flattening batches. An entry already listed is not
    /// repeated: one change can span several edits.
    pub fn record(&mut self, verdict: Verdict) {
        match verdict {
            Verdict::Ignore => {}
            Verdict::Feature(text) => push_unique(&mut self.features, text),
            Verdict::Breaking(text) => push_unique(&mut self.breaking_changes, text),
            Verdict::Batch(verdicts) => {
                for verdict in verdicts {
                    self.record(verdict);
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty() && self.breaking_changes.is_empty()
    }

    /// Markdown document of both lists.
    pub fn build_md(&self) -> String {
        markdown::render(&self.features, &self.breaking_changes)
    }
}

fn push_unique(entries: &mut Vec<String>, text: String) {
    if !entries.contains(&text) {
        entries.push(text);
    }
}

/// Compare two reports, single-module or aggregate.
///
/// Both operands must be JSON mappings; anything else about their shape is
/// taken as is.
pub fn build_change_log(old: &Value, new: &Value) -> Result<ChangeLog> {
    for (side, report) in [("old", old), ("new", new)] {
        if !report.is_object() {
            return Err(AuditError::IncompatibleReports {
                message: format!("the {} report is not a JSON mapping", side),
            });
        }
    }

    let edits = treediff::diff(old, new);
    debug!("{} edits between reports", edits.len());

    let mut changelog = ChangeLog::new();
    for edit in &edits {
        match classify(edit, old, new) {
            Verdict::Ignore => debug!("Ignoring edit at {:?}", edit.path),
            verdict => changelog.record(verdict),
        }
    }
    Ok(changelog)
}

//! Structural diff of two JSON trees.
//!
//! The diff is a list of [`Edit`]s: a path into the old tree and, for
//! additions and replacements, the new value at that path. An edit without
//! a value is a deletion. Applying the edits in order to the old tree yields
//! the new one.

use std::fmt;

use serde::ser::{SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

/// One step of a path into a JSON tree.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(key) => Some(key),
            PathSegment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(idx) => Some(*idx),
            PathSegment::Key(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => write!(f, "{}", key),
            PathSegment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(idx: usize) -> Self {
        PathSegment::Index(idx)
    }
}

/// A single edit. Serializes as `[path]` for deletions and `[path, value]`
/// otherwise.
#[derive(Clone, Debug, PartialEq)]
pub struct Edit {
    pub path: Vec<PathSegment>,
    pub value: Option<Value>,
}

impl Edit {
    pub fn is_deletion(&self) -> bool {
        self.value.is_none()
    }
}

impl Serialize for Edit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.value.is_some() { 2 } else { 1 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.path)?;
        if let Some(value) = &self.value {
            seq.serialize_element(value)?;
        }
        seq.end()
    }
}

/// Compute the edits turning `old` into `new`.
pub fn diff(old: &Value, new: &Value) -> Vec<Edit> {
    let mut edits = Vec::new();
    let mut path = Vec::new();
    diff_values(old, new, &mut path, &mut edits);
    edits
}

fn diff_values(old: &Value, new: &Value, path: &mut Vec<PathSegment>, edits: &mut Vec<Edit>) {
    if old == new {
        return;
    }
    match (old, new) {
        (Value::Object(old), Value::Object(new)) => diff_maps(old, new, path, edits),
        (Value::Array(old), Value::Array(new)) => diff_sequences(old, new, path, edits),
        _ => edits.push(Edit {
            path: path.clone(),
            value: Some(new.clone()),
        }),
    }
}

fn diff_maps(
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    path: &mut Vec<PathSegment>,
    edits: &mut Vec<Edit>,
) {
    for key in old.keys().filter(|k| !new.contains_key(*k)) {
        edits.push(Edit {
            path: child_path(path, PathSegment::Key(key.clone())),
            value: None,
        });
    }

    for (key, old_value) in old {
        if let Some(new_value) = new.get(key) {
            path.push(PathSegment::Key(key.clone()));
            diff_values(old_value, new_value, path, edits);
            path.pop();
        }
    }

    for (key, value) in new.iter().filter(|(k, _)| !old.contains_key(*k)) {
        edits.push(Edit {
            path: child_path(path, PathSegment::Key(key.clone())),
            value: Some(value.clone()),
        });
    }
}

/// Longest common subsequence; unmatched old elements are deleted from the
/// back, then unmatched new elements inserted from the front.
fn diff_sequences(old: &[Value], new: &[Value], path: &[PathSegment], edits: &mut Vec<Edit>) {
    let (old_matched, new_matched) = lcs_matches(old, new);

    for idx in (0..old.len()).rev().filter(|i| !old_matched[*i]) {
        edits.push(Edit {
            path: child_path(path, PathSegment::Index(idx)),
            value: None,
        });
    }
    for idx in (0..new.len()).filter(|i| !new_matched[*i]) {
        edits.push(Edit {
            path: child_path(path, PathSegment::Index(idx)),
            value: Some(new[idx].clone()),
        });
    }
}

fn lcs_matches(old: &[Value], new: &[Value]) -> (Vec<bool>, Vec<bool>) {
    let (n, m) = (old.len(), new.len());
    // lengths[i][j]: LCS length of old[i..] and new[j..]
    let mut lengths = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lengths[i][j] = if old[i] == new[j] {
                lengths[i + 1][j + 1] + 1
            } else {
                lengths[i + 1][j].max(lengths[i][j + 1])
            };
        }
    }

    let mut old_matched = vec![false; n];
    let mut new_matched = vec![false; m];
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            old_matched[i] = true;
            new_matched[j] = true;
            i += 1;
            j += 1;
        } else if lengths[i + 1][j] >= lengths[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    (old_matched, new_matched)
}

fn child_path(path: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut child = path.to_vec();
    child.push(segment);
    child
}

//! Decision table mapping a diff edit to a changelog verdict.
//!
//! Edits are classified by the shape of their path alone, with the two
//! reports consulted only for facts the edit does not carry: the name of a
//! deleted attribute, whether a new model parameter is required, the full
//! list of operations when a group changed wholesale.
//!
//! Module-level paths start with the module name: `[module, category,
//! name, ...]`. Operation and model paths start with `operations` or
//! `models`, either at the root of the report or right below a module name.

use std::collections::BTreeSet;

use serde_json::Value;

use super::messages;
use crate::report::{
    ATTRIBUTES, CLASSES, FUNCTIONS, METADATA, METHODS, MODELS, MODEL_ENUMS, MODEL_EXCEPTIONS,
    OPERATIONS, PARAMETERS,
};
use crate::treediff::{Edit, PathSegment};

/// What a single edit means for the changelog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Ignore,
    Feature(String),
    Breaking(String),
    /// Several entries from one edit, in order.
    Batch(Vec<Verdict>),
}

/// Classify one edit of the diff between `old` and `new`.
pub fn classify(edit: &Edit, old: &Value, new: &Value) -> Verdict {
    let path = edit.path.as_slice();
    let deletion = edit.is_deletion();

    match key(path, 0) {
        Some(OPERATIONS) => return operation(path, deletion, old, new),
        Some(MODELS) => return model(path, deletion, old, new),
        _ => {}
    }

    if let (Some(module), Some(category)) = (key(path, 0), key(path, 1)) {
        if category == OPERATIONS || category == MODELS {
            let old_scope = old.get(module).unwrap_or(&Value::Null);
            let new_scope = new.get(module).unwrap_or(&Value::Null);
            let scoped = &path[1..];
            return if category == OPERATIONS {
                operation(scoped, deletion, old_scope, new_scope)
            } else {
                model(scoped, deletion, old_scope, new_scope)
            };
        }
    }

    module_level(edit, old, new)
}

/// Functions, classes, methods and attributes: `[module, category, name, ...]`.
fn module_level(edit: &Edit, old: &Value, new: &Value) -> Verdict {
    let path = edit.path.as_slice();
    let deletion = edit.is_deletion();
    let module = segment(path, 0);
    let name = segment(path, 2);

    // Re-exports only record their origin; their members are reported where
    // they are defined.
    if path.len() >= 4 && [old, new].iter().any(|r| is_imported(lookup(r, &path[..3]))) {
        return Verdict::Ignore;
    }

    if path.len() >= 4 && key(path, 3) == Some(METHODS) {
        if path.len() == 4 {
            return Verdict::Ignore;
        }
        let method = segment(path, 4);
        let old_signature = lookup(old, &path[..5]);
        let current = new_signature(edit, new, path);
        if is_unknown_signature(old_signature) || is_unknown_signature(current) {
            return Verdict::Ignore;
        }
        if path.len() == 5 && !deletion && old_signature.is_none() {
            return Verdict::Feature(messages::method_added(&method, &name, &module));
        }
        return Verdict::Breaking(messages::method_signature_changed(&method, &name, &module));
    }

    if path.len() == 3 && key(path, 1) == Some(FUNCTIONS) {
        return if deletion {
            Verdict::Breaking(messages::function_removed(&name, &module))
        } else {
            Verdict::Feature(messages::function_added(&name, &module))
        };
    }

    if path.len() == 3 && key(path, 1) == Some(CLASSES) {
        return if deletion {
            Verdict::Breaking(messages::class_removed(&name, &module))
        } else {
            Verdict::Feature(messages::class_added(&name, &module))
        };
    }

    if path.len() >= 4 && key(path, 3) == Some(ATTRIBUTES) {
        let names = if deletion {
            let list = lookup(old, &path[..4]);
            match path.get(4) {
                Some(PathSegment::Index(idx)) => list
                    .and_then(|l| l.get(*idx))
                    .map(attribute_names)
                    .unwrap_or_default(),
                Some(PathSegment::Key(_)) => Vec::new(),
                None => list.map(attribute_names).unwrap_or_default(),
            }
        } else {
            edit.value.as_ref().map(attribute_names).unwrap_or_default()
        };
        if names.is_empty() {
            return Verdict::Ignore;
        }
        return if deletion {
            Verdict::Breaking(messages::attributes_removed(&names, &name, &module))
        } else {
            Verdict::Feature(messages::attributes_added(&names, &name, &module))
        };
    }

    Verdict::Ignore
}

/// `[operations, group, functions, name, ...]`.
fn operation(path: &[PathSegment], deletion: bool, old: &Value, new: &Value) -> Verdict {
    let group = segment(path, 1);
    match path.len() {
        0 | 1 => Verdict::Ignore,
        2 => {
            if deletion {
                Verdict::Breaking(messages::operation_group_removed(&group))
            } else {
                Verdict::Feature(messages::operation_group_added(&group))
            }
        }
        3 if key(path, 2) == Some(FUNCTIONS) => {
            // The whole function map changed type or appeared; diff the names.
            let names = |report: &Value| -> BTreeSet<String> {
                report
                    .get(OPERATIONS)
                    .and_then(|o| o.get(group.as_str()))
                    .and_then(|g| g.get(FUNCTIONS))
                    .and_then(Value::as_object)
                    .map(|functions| functions.keys().cloned().collect())
                    .unwrap_or_default()
            };
            let (old_names, new_names) = (names(old), names(new));
            let removed = old_names
                .difference(&new_names)
                .map(|f| Verdict::Breaking(messages::operation_removed(&group, f)));
            let added = new_names
                .difference(&old_names)
                .map(|f| Verdict::Feature(messages::operation_added(&group, f)));
            Verdict::Batch(removed.chain(added).collect())
        }
        3 => Verdict::Ignore,
        _ if key(path, 3) == Some(METADATA) => Verdict::Ignore,
        4 => {
            let function = segment(path, 3);
            if deletion {
                Verdict::Breaking(messages::operation_removed(&group, &function))
            } else {
                Verdict::Feature(messages::operation_added(&group, &function))
            }
        }
        _ if key(path, 4) == Some(METADATA) => Verdict::Ignore,
        _ => {
            if is_unknown_signature(lookup(old, &path[..4])) || is_unknown_signature(lookup(new, &path[..4])) {
                return Verdict::Ignore;
            }
            Verdict::Breaking(messages::operation_signature_changed(
                &group,
                &segment(path, 3),
            ))
        }
    }
}

/// `[models, category, model, parameters, parameter, ...]`.
fn model(path: &[PathSegment], deletion: bool, old: &Value, new: &Value) -> Verdict {
    // New or removed categories and models usually come with new operations.
    if path.len() <= 3 {
        return Verdict::Ignore;
    }
    if matches!(key(path, 1), Some(MODEL_ENUMS) | Some(MODEL_EXCEPTIONS)) {
        return Verdict::Ignore;
    }

    let model = segment(path, 2);
    if path.len() == 4 {
        return Verdict::Breaking(messages::model_signature_changed(&model));
    }
    if key(path, 3) != Some(PARAMETERS) {
        return if path.len() == 5 {
            Verdict::Breaking(messages::model_signature_changed(&model))
        } else {
            Verdict::Ignore
        };
    }

    let parameter = segment(path, 4);
    let required = |report: &Value| is_required(report, &path[..5]);
    if path.len() == 5 {
        return if deletion {
            Verdict::Breaking(messages::model_parameter_removed(&model, &parameter))
        } else if required(new) {
            Verdict::Breaking(messages::model_required_parameter_added(&model, &parameter))
        } else {
            Verdict::Feature(messages::model_parameter_added(&model, &parameter))
        };
    }

    if required(new) && !required(old) {
        Verdict::Breaking(messages::model_parameter_now_required(&parameter, &model))
    } else {
        Verdict::Ignore
    }
}

fn key(path: &[PathSegment], idx: usize) -> Option<&str> {
    path.get(idx).and_then(PathSegment::as_key)
}

fn segment(path: &[PathSegment], idx: usize) -> String {
    path.get(idx).map(ToString::to_string).unwrap_or_default()
}

fn lookup<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| match segment {
        PathSegment::Key(key) => current.get(key.as_str()),
        PathSegment::Index(idx) => current.get(*idx),
    })
}

/// The method signature after the edit: the new report's, or the value a
/// whole-method edit carries.
fn new_signature<'a>(edit: &'a Edit, new: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    lookup(new, &path[..5]).or_else(|| match path.len() {
        5 => edit.value.as_ref(),
        _ => None,
    })
}

fn is_imported(entry: Option<&Value>) -> bool {
    entry.is_some_and(|e| e.get("source").is_some())
}

fn is_unknown_signature(signature: Option<&Value>) -> bool {
    matches!(signature, Some(Value::Object(map)) if map.is_empty())
}

fn is_required(report: &Value, parameter_path: &[PathSegment]) -> bool {
    lookup(report, parameter_path)
        .and_then(|p| p.get("properties"))
        .and_then(|p| p.get("required"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

fn attribute_names(value: &Value) -> Vec<String> {
    match value {
        Value::String(name) => vec![name.clone()],
        Value::Array(items) => items
            .iter()
            .filter_map(|i| i.as_str().map(str::to_string))
            .collect(),
        Value::Object(map) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

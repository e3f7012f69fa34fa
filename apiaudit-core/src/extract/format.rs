//! Best-effort JSON form of runtime values.

use serde_json::Value;

use crate::reflect::ObjectRepr;

/// Render a value for a report. Total over [`ObjectRepr`].
///
/// Mappings and sequences are kept verbatim, classes become
/// `<class 'qualname'>`, values whose text looks like `<...>` become
/// `instance of <class 'type'>`, and everything else its string form.
pub fn format_for_report(value: &ObjectRepr) -> Value {
    match value {
        ObjectRepr::Json(json @ (Value::Object(_) | Value::Array(_))) => json.clone(),
        ObjectRepr::Json(scalar) => Value::String(python_str(scalar)),
        ObjectRepr::Class { qualname } => Value::String(class_repr(qualname)),
        ObjectRepr::Instance { type_name, repr } => Value::String(opaque(repr, type_name)),
        ObjectRepr::Text(text) => Value::String(opaque(text, "object")),
    }
}

/// `str()` of a class object.
pub fn class_repr(qualname: &str) -> String {
    format!("<class '{}'>", qualname)
}

fn opaque(text: &str, type_name: &str) -> String {
    if text.starts_with('<') && text.ends_with('>') {
        format!("instance of {}", class_repr(type_name))
    } else {
        text.to_string()
    }
}

/// `str()` of a JSON scalar as Python prints it.
fn python_str(scalar: &Value) -> String {
    match scalar {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

//! Changelog entry wording.

// Module-level API
pub fn method_added(method: &str, class: &str, module: &str) -> String {
    format!("Method {} of {} in module {} is new.", method, class, module)
}

pub fn method_signature_changed(method: &str, class: &str, module: &str) -> String {
    format!(
        "Method {} of {} in module {} has a different signature.",
        method, class, module
    )
}

pub fn function_added(function: &str, module: &str) -> String {
    format!("Function {} in module {} is new.", function, module)
}

pub fn function_removed(function: &str, module: &str) -> String {
    format!("Function {} in module {} has been removed.", function, module)
}

pub fn class_added(class: &str, module: &str) -> String {
    format!("Class {} in module {} is new.", class, module)
}

pub fn class_removed(class: &str, module: &str) -> String {
    format!("Class {} in module {} has been removed.", class, module)
}

pub fn attributes_added(names: &[String], class: &str, module: &str) -> String {
    let plural = if names.len() > 1 { "s" } else { "" };
    format!(
        "Attribute{} {} of class {} in module {} is new.",
        plural,
        names.join(", "),
        class,
        module
    )
}

pub fn attributes_removed(names: &[String], class: &str, module: &str) -> String {
    format!(
        "Attribute {} of class {} in module {} has been removed.",
        names.join(", "),
        class,
        module
    )
}

// Operation groups
pub fn operation_group_added(group: &str) -> String {
    format!("Added operation group {}", group)
}

pub fn operation_group_removed(group: &str) -> String {
    format!("Removed operation group {}", group)
}

pub fn operation_added(group: &str, function: &str) -> String {
    format!("Added operation {}.{}", group, function)
}

pub fn operation_removed(group: &str, function: &str) -> String {
    format!("Removed operation {}.{}", group, function)
}

pub fn operation_signature_changed(group: &str, function: &str) -> String {
    format!("Operation {}.{} has a new signature", group, function)
}

// Models
pub fn model_signature_changed(model: &str) -> String {
    format!("Model {} has a new signature", model)
}

pub fn model_parameter_added(model: &str, parameter: &str) -> String {
    format!("Model {} has a new parameter {}", model, parameter)
}

pub fn model_required_parameter_added(model: &str, parameter: &str) -> String {
    format!("Model {} has a new required parameter {}", model, parameter)
}

pub fn model_parameter_removed(model: &str, parameter: &str) -> String {
    format!("Model {} no longer has parameter {}", model, parameter)
}

pub fn model_parameter_now_required(parameter: &str, model: &str) -> String {
    format!("Parameter {} of model {} is now required", parameter, model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_pluralization() {
        assert_eq!(
            attributes_added(&["size".to_string()], "Widget", "shop"),
            "Attribute size of class Widget in module shop is new."
        );
        assert_eq!(
            attributes_added(&["a".to_string(), "b".to_string()], "Widget", "shop"),
            "Attributes a, b of class Widget in module shop is new."
        );
    }
}

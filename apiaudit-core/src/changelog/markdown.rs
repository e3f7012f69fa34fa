//! Markdown rendering of a changelog.

/// Render the two entry lists; an empty list omits its heading.
pub fn render(features: &[String], breaking_changes: &[String]) -> String {
    let mut lines = Vec::new();

    if !features.is_empty() {
        lines.push("**Features**".to_string());
        lines.push(String::new());
        for entry in features {
            lines.push(format!("- {}", entry));
        }
        lines.push(String::new());
    }

    if !breaking_changes.is_empty() {
        lines.push("**Breaking changes**".to_string());
        lines.push(String::new());
        for entry in breaking_changes {
            lines.push(format!("- {}", entry));
        }
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_both_sections() {
        let text = render(
            &["Function make in module shop is new.".to_string()],
            &["Removed operation group Widgets".to_string()],
        );
        assert_eq!(
            text,
            "**Features**\n\n- Function make in module shop is new.\n\n**Breaking changes**\n\n- Removed operation group Widgets"
        );
    }

    #[test]
    fn test_render_omits_empty_sections() {
        assert_eq!(render(&[], &[]), "");
        assert_eq!(render(&["x".to_string()], &[]), "**Features**\n\n- x");
        assert_eq!(
            render(&[], &["y".to_string()]),
            "**Breaking changes**\n\n- y"
        );
    }
}

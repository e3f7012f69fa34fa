//! Versions command - List published versions of a package

use apiaudit_core::versions::latest_and_stable;
use colored::Colorize;
use serde::Serialize;

use super::AuditSettings;
use crate::output::{Output, OutputConfig, Outputter};

#[derive(Debug, Serialize)]
pub struct VersionsResult {
    pub package: String,
    /// Ascending.
    pub versions: Vec<String>,
    pub latest: Option<String>,
    pub latest_stable: Option<String>,
}

impl Outputter for VersionsResult {
    fn to_text(&self, _config: &OutputConfig) -> String {
        let mut lines = Vec::new();
        lines.push(format!(
            "{} {} ({} releases)",
            "VERSIONS:".cyan().bold(),
            self.package.yellow(),
            self.versions.len()
        ));
        for version in &self.versions {
            lines.push(format!("  {}", version));
        }
        lines.push(String::new());
        lines.push(format!(
            "{} {}",
            "Latest:".bold(),
            self.latest.as_deref().unwrap_or("-")
        ));
        lines.push(format!(
            "{} {}",
            "Latest stable:".bold(),
            self.latest_stable.as_deref().unwrap_or("-").green()
        ));
        lines.join("\n")
    }
}

pub async fn run(package: &str, settings: &AuditSettings, output: OutputConfig) -> anyhow::Result<()> {
    let versions = settings.pypi().ordered_versions(package).await?;
    let (latest, stable) = latest_and_stable(&versions);

    let result = VersionsResult {
        package: package.to_string(),
        latest: latest.map(|v| v.as_str().to_string()),
        latest_stable: stable.map(|v| v.as_str().to_string()),
        versions: versions.iter().map(|v| v.as_str().to_string()).collect(),
    };
    Output::new(result, output).render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    #[test]
    fn test_text_output() {
        colored::control::set_override(false);
        let result = VersionsResult {
            package: "shop".to_string(),
            versions: vec!["1.0.0".to_string(), "2.0.0b1".to_string()],
            latest: Some("2.0.0b1".to_string()),
            latest_stable: Some("1.0.0".to_string()),
        };
        let text = result.render(&OutputConfig::new(OutputFormat::Text));
        assert!(text.starts_with("VERSIONS: shop (2 releases)"));
        assert!(text.contains("Latest: 2.0.0b1"));
        assert!(text.ends_with("Latest stable: 1.0.0"));
    }
}

//! Published versions from the PyPI JSON API.

use std::collections::BTreeMap;

use anyhow::{bail, Context};
use apiaudit_core::versions::{sort_versions, Version};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

/// Subset of `GET {host}/pypi/{project}/json`.
#[derive(Deserialize)]
struct ProjectResponse {
    releases: BTreeMap<String, serde_json::Value>,
}

pub struct PypiClient {
    host: String,
    client: Client,
}

impl PypiClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            client: Client::new(),
        }
    }

    pub fn project_url(&self, project: &str) -> String {
        format!("{}/pypi/{}/json", self.host.trim_end_matches('/'), project)
    }

    /// Every published version, ascending.
    pub async fn ordered_versions(&self, project: &str) -> anyhow::Result<Vec<Version>> {
        let url = self.project_url(project);
        info!("Fetching versions of {} from {}", project, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("PyPI request failed: {}", url))?;
        let status = response.status();
        if !status.is_success() {
            bail!("PyPI returned {} for {}", status.as_u16(), url);
        }
        let project_info: ProjectResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse PyPI response for {}", project))?;

        Ok(sort_versions(project_info.releases.keys()))
    }

    pub async fn latest_version(&self, project: &str) -> anyhow::Result<Version> {
        self.ordered_versions(project)
            .await?
            .pop()
            .with_context(|| format!("{} has no release on PyPI", project))
    }
}

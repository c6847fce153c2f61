use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::FarmConfig;
use crate::farm::types::{JobId, JobInfo, PluginInfo};

/// Connection timeout for farm API requests
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Client side of the farm's job submission API.
#[async_trait::async_trait]
pub trait FarmClient: Send + Sync {
    /// Submit one job; returns the farm-assigned job id.
    async fn submit(&self, job: &JobInfo, plugin: &PluginInfo) -> Result<JobId>;

    /// Test the connection to the farm.
    async fn ping(&self) -> Result<bool>;
}

/// HTTP client for the farm's REST API.
pub struct HttpFarmClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpFarmClient {
    pub fn new(config: &FarmConfig) -> Self {
        let client = Client::builder()
            .timeout(CONNECTION_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build HTTP client with timeout: {}", e);
                Client::new()
            });

        Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubmitBody<'a> {
    job_info: BTreeMap<String, String>,
    plugin_info: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct SubmitResponse {
    #[serde(rename = "_id")]
    id: String,
}

#[async_trait::async_trait]
impl FarmClient for HttpFarmClient {
    async fn submit(&self, job: &JobInfo, plugin: &PluginInfo) -> Result<JobId> {
        let body = SubmitBody {
            job_info: job.to_wire(),
            plugin_info: &plugin.0,
        };

        let response = self
            .client
            .post(self.url("/jobs"))
            .header("X-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to POST job to the farm")?;

        if !response.status().is_success() {
            let status = response.status();
            let error = response.text().await.unwrap_or_default();
            anyhow::bail!("Farm rejected job '{}': {} {}", job.name, status, error);
        }

        let parsed: SubmitResponse = response
            .json()
            .await
            .context("Failed to parse farm submit response")?;
        Ok(JobId(parsed.id))
    }

    async fn ping(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.url("/jobs"))
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("Failed to reach the farm")?;
        Ok(response.status().is_success())
    }
}

/// In-memory farm that records submissions instead of sending them.
///
/// Backs `--dry-run` and the submission tests.
#[derive(Default)]
pub struct RecordingFarm {
    submitted: parking_lot::Mutex<Vec<(JobInfo, PluginInfo)>>,
}

impl RecordingFarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything submitted so far, in submission order.
    pub fn submitted(&self) -> Vec<(JobInfo, PluginInfo)> {
        self.submitted.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.submitted.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.submitted.lock().is_empty()
    }
}

#[async_trait::async_trait]
impl FarmClient for RecordingFarm {
    async fn submit(&self, job: &JobInfo, plugin: &PluginInfo) -> Result<JobId> {
        self.submitted.lock().push((job.clone(), plugin.clone()));
        Ok(JobId(uuid::Uuid::new_v4().to_string()))
    }

    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }
}

//! Dataset loader.
//!
//! The pipeline document is a static JSON artifact produced offline; this
//! module fetches it once at startup (HTTP URL or local file) on a worker
//! task, the application's only asynchronous boundary. A failed load is
//! reported and left alone — no automatic retry, the session just stays
//! empty until the user asks for a reload.

use anyhow::{Context, Result};
use reqwest::Client;

use crate::models::Dataset;

/// Default dataset location, matching the offline producer's output path.
pub const DEFAULT_SOURCE: &str = "data/readouts.json";

/// Loader for the pipeline document.
#[derive(Debug, Clone)]
pub struct DataClient {
    client: Client,
    source: String,
}

impl DataClient {
    /// Create a loader for the given source (http(s) URL or file path).
    pub fn new(source: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            source: source.into(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Fetch and decode the whole document.
    pub async fn fetch_dataset(&self) -> Result<Dataset> {
        if self.source.starts_with("http://") || self.source.starts_with("https://") {
            self.fetch_remote().await
        } else {
            self.read_local().await
        }
    }

    async fn fetch_remote(&self) -> Result<Dataset> {
        let response = self
            .client
            .get(&self.source)
            .send()
            .await
            .context("Failed to request dataset")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "Dataset fetch failed: {} - {}",
                response.status(),
                response.text().await.unwrap_or_default()
            );
        }

        response
            .json()
            .await
            .context("Failed to parse dataset document")
    }

    async fn read_local(&self) -> Result<Dataset> {
        let raw = tokio::fs::read_to_string(&self.source)
            .await
            .with_context(|| format!("Failed to read dataset file {}", self.source))?;

        serde_json::from_str(&raw).context("Failed to parse dataset document")
    }
}

/// Messages sent from the loader worker to the UI thread.
#[derive(Debug, Clone)]
pub enum DataMessage {
    /// The document loaded and decoded successfully.
    DatasetLoaded(Dataset),
    /// The load failed; the session stays in its empty state.
    Error(String),
}

/// Commands sent from the UI thread to the loader worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCommand {
    /// Load (or manually re-load) the document.
    Reload,
    /// Shut down the worker.
    Shutdown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_scheme_detection() {
        let http = DataClient::new("https://example.org/data/readouts.json").unwrap();
        assert!(http.source().starts_with("https://"));

        let file = DataClient::new(DEFAULT_SOURCE).unwrap();
        assert_eq!(file.source(), "data/readouts.json");
    }

    #[tokio::test]
    async fn test_missing_file_reports_error() {
        let client = DataClient::new("definitely/not/here.json").unwrap();
        let err = client.fetch_dataset().await.unwrap_err();
        assert!(err.to_string().contains("definitely/not/here.json"));
    }

    #[tokio::test]
    async fn test_local_document_roundtrip() {
        let dir = std::env::temp_dir().join("trialscope-data-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("readouts.json");
        std::fs::write(
            &path,
            r#"{"metadata": {"company_map": {}, "cancer_groups": []}, "trials": []}"#,
        )
        .unwrap();

        let client = DataClient::new(path.to_string_lossy().to_string()).unwrap();
        let dataset = client.fetch_dataset().await.unwrap();
        assert!(dataset.trials.is_empty());
    }
}

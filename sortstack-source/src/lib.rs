//! Dataset sources for sortstack: local JSON files and HTTP endpoints.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use sortstack_core::{
    normalize::RawWasteRecord,
    ports::{DatasetSource, SourceError},
};
use tracing::debug;

/// Dataset stored as a JSON array on disk.
pub struct FileSource {
    path: PathBuf,
    label: String,
}

impl FileSource {
    /// Create a source reading `path` on every fetch.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    fn location(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<RawWasteRecord>, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.label, bytes = bytes.len(), "read dataset file");

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Dataset served as a JSON array over HTTP.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    /// Create a source bound to the given HTTP client.
    #[must_use]
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl DatasetSource for HttpSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<RawWasteRecord>, SourceError> {
        fetch_json(self.client.get(&self.url)).await
    }
}

/// Pick a source for `location`: HTTP for `http://` and `https://` URLs, a
/// local file otherwise.
#[must_use]
pub fn source_for(location: &str, client: Client) -> Arc<dyn DatasetSource> {
    if is_remote(location) {
        Arc::new(HttpSource::new(client, location))
    } else {
        Arc::new(FileSource::new(location))
    }
}

fn is_remote(location: &str) -> bool {
    let lowered = location.trim_start().to_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

// Small helper to fetch and decode JSON with status handling.
async fn fetch_json(req: RequestBuilder) -> Result<Vec<RawWasteRecord>, SourceError> {
    req.send()
        .await
        .map_err(SourceError::from)?
        .error_for_status()
        .map_err(SourceError::from)?
        .json()
        .await
        .map_err(SourceError::from)
}

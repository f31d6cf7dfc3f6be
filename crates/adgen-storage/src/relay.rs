//! Artifact relay: ephemeral URL to durable storage.
//!
//! Several stage outputs are URLs with an external expiry measured in
//! minutes. Before any later stage or the final record depends on them,
//! each artifact is downloaded and re-stored durably. A failed copy falls
//! back to the original URL for that position only; the pipeline carries
//! on and accepts that the unfixed item may expire before it is consumed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

/// Destination for relayed artifact bytes.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Persist bytes under `key` and return the durable URL.
    async fn persist_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String>;
}

/// Copies ephemeral external URLs into durable storage.
#[derive(Clone)]
pub struct ArtifactRelay {
    http: reqwest::Client,
    sink: Arc<dyn ArtifactSink>,
}

impl ArtifactRelay {
    /// Default per-download timeout. Replicate delivery URLs expire after
    /// minutes, so downloads must be bounded well below that.
    const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(sink: Arc<dyn ArtifactSink>) -> Self {
        Self {
            http: reqwest::Client::new(),
            sink,
        }
    }

    /// Copy a single ephemeral artifact into durable storage.
    ///
    /// Returns the durable URL, or an error if download or upload failed.
    pub async fn persist(
        &self,
        ephemeral_url: &str,
        key: &str,
        content_type: &str,
    ) -> StorageResult<String> {
        let response = self
            .http
            .get(ephemeral_url)
            .timeout(Self::DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(StorageError::download_failed(format!(
                "HTTP {} from {}",
                response.status(),
                ephemeral_url
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::download_failed(e.to_string()))?;

        debug!("Relaying {} bytes from {} to {}", data.len(), ephemeral_url, key);
        self.sink.persist_bytes(data.to_vec(), key, content_type).await
    }

    /// Copy an ordered list of ephemeral artifacts into durable storage.
    ///
    /// The returned list corresponds positionally to the input. On a
    /// per-item failure the original ephemeral URL is kept at that
    /// position and a warning is logged; other positions are unaffected.
    pub async fn persist_batch<F>(
        &self,
        ephemeral_urls: &[String],
        content_type: &str,
        key_for: F,
    ) -> Vec<String>
    where
        F: Fn(usize) -> String,
    {
        let mut durable_urls = Vec::with_capacity(ephemeral_urls.len());

        for (index, url) in ephemeral_urls.iter().enumerate() {
            let key = key_for(index);
            match self.persist(url, &key, content_type).await {
                Ok(durable) => durable_urls.push(durable),
                Err(e) => {
                    warn!(
                        "Failed to persist artifact {} durably, keeping ephemeral URL: {}",
                        index, e
                    );
                    durable_urls.push(url.clone());
                }
            }
        }

        durable_urls
    }
}

//! Source and sink implementations behind the image I/O contract.

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

/// Supplies raw source image bytes by image id.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, image_id: i64) -> Result<Vec<u8>>;
}

/// Persists rendered output bytes by image id.
#[async_trait]
pub trait ImageSink: Send + Sync {
    async fn persist(&self, image_id: i64, bytes: &[u8]) -> Result<()>;
}

/// Fetches source images over HTTP from `{base_url}/{image_id}.jpg`.
pub struct HttpImageSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpImageSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// GET with bounded retries and exponential backoff, to ride out
    /// transient blips in the image host.
    async fn get_with_retry(
        &self,
        url: String,
        timeout: Duration,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 150u64;

        for attempt in 0..attempts {
            let response = self.client.get(url.clone()).timeout(timeout).send().await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    // Simple jitter to prevent thundering herd
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(1200);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, image_id: i64) -> Result<Vec<u8>> {
        let url = format!("{}/{}.jpg", self.base_url, image_id);

        let response = self
            .get_with_retry(url, Duration::from_secs(10), 3)
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "Image fetch failed for {}: {}",
                image_id,
                response.status()
            ));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Writes rendered edge maps to `{output_dir}/{image_id}.png`.
pub struct FsImageSink {
    output_dir: PathBuf,
}

impl FsImageSink {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }
}

#[async_trait]
impl ImageSink for FsImageSink {
    async fn persist(&self, image_id: i64, bytes: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("{}.png", image_id));
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Persisted output image {}", path.display());
        Ok(())
    }
}

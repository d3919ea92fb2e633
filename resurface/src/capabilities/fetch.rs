//! Image download.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Images larger than this are not fingerprinted.
pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// reqwest-backed fetcher.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    #[instrument(skip(self, url))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        if let Some(len) = response.content_length() {
            if len as usize > MAX_IMAGE_BYTES {
                bail!("image too large: {} bytes", len);
            }
        }
        let bytes = response.bytes().await?;
        if bytes.len() > MAX_IMAGE_BYTES {
            bail!("image too large: {} bytes", bytes.len());
        }
        debug!(bytes = bytes.len(), "step: image fetched");
        Ok(bytes.to_vec())
    }
}

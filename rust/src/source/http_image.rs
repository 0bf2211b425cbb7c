use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::http_source::{resolve_url, HttpSource};
use super::traits::{ByteSource, ImageFetcher};
use crate::config::HttpBackendConfig;
use crate::detect::format::detect_format;

/// Downloads images over HTTP and rejects bodies that are not a known image format.
pub struct HttpImageFetcher {
    client: Client,
    config: HttpBackendConfig,
}

impl HttpImageFetcher {
    pub fn new(client: Client, config: HttpBackendConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, src: &str) -> Result<()> {
        let url = resolve_url(self.config.base_url.as_deref(), src)?;
        let source = HttpSource::new(self.client.clone(), url, self.config.headers.clone());

        let body = source.fetch_all().await?;
        let format = detect_format(&body);
        if !format.is_image() {
            return Err(anyhow!(
                "cannot decode image {}: unrecognized format ({} bytes)",
                source.url(),
                body.len()
            ));
        }

        debug!("image {} fetched format={:?} bytes={}", source.url(), format, body.len());
        Ok(())
    }
}

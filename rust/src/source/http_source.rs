use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use tracing::{debug, warn};

use super::traits::{ByteSource, SourceInfo};

/// Resolve `src` against an optional base URL. Absolute URLs pass through.
pub fn resolve_url(base_url: Option<&str>, src: &str) -> Result<Url> {
    if let Ok(url) = Url::parse(src) {
        return Ok(url);
    }
    let base = base_url.ok_or_else(|| anyhow!("relative src {} without a base url", src))?;
    let base = Url::parse(base).map_err(|e| anyhow!("invalid base url {}: {}", base, e))?;
    base.join(src)
        .map_err(|e| anyhow!("cannot resolve {} against {}: {}", src, base, e))
}

pub struct HttpSource {
    client: Client,
    url: Url,
    headers: HashMap<String, String>,
}

impl HttpSource {
    pub fn new(client: Client, url: Url, headers: HashMap<String, String>) -> Self {
        Self {
            client,
            url,
            headers,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Build a GET request with the custom headers and an optional Range header.
    fn build_request(&self, range_header: Option<&str>) -> RequestBuilder {
        let mut req = self.client.get(self.url.clone());
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        if let Some(range) = range_header {
            req = req.header("Range", range);
        }
        req
    }

    fn check_status(&self, status: StatusCode, what: &str) -> Result<()> {
        if status.is_success() {
            return Ok(());
        }
        warn!("http {} failed status={} url={}", what, status.as_u16(), self.url);
        Err(anyhow!("{} failed: HTTP {} for {}", what, status.as_u16(), self.url))
    }
}

#[async_trait]
impl ByteSource for HttpSource {
    async fn probe(&self) -> Result<SourceInfo> {
        let resp = self.build_request(Some("bytes=0-0")).send().await?;

        let status = resp.status();
        debug!("http probe status={} url={}", status.as_u16(), self.url);
        self.check_status(status, "probe")?;

        // Content-Range: bytes 0-0/<total>
        let supports_range = status == StatusCode::PARTIAL_CONTENT;
        let content_length = if supports_range {
            resp.headers()
                .get("content-range")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.rsplit('/').next())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
        } else {
            resp.headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(0)
        };

        let content_type = resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        Ok(SourceInfo {
            content_length,
            content_type,
            supports_range,
        })
    }

    async fn fetch_range(&self, start: u64, end: u64) -> Result<Bytes> {
        let range = format!("bytes={}-{}", start, end);
        let resp = self.build_request(Some(&range)).send().await?;
        self.check_status(resp.status(), "fetch_range")?;

        let full_body = resp.status() == StatusCode::OK;
        let bytes = resp.bytes().await?;
        if full_body {
            // Server ignored the Range header; slice the window out ourselves.
            let from = (start as usize).min(bytes.len());
            let to = (end as usize).saturating_add(1).min(bytes.len());
            return Ok(bytes.slice(from..to));
        }
        Ok(bytes)
    }

    async fn fetch_all(&self) -> Result<Bytes> {
        let resp = self.build_request(None).send().await?;
        self.check_status(resp.status(), "fetch")?;
        Ok(resp.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_absolute_passes_through() {
        let url = resolve_url(Some("http://cdn.local/"), "https://other.host/a.png").unwrap();
        assert_eq!(url.as_str(), "https://other.host/a.png");
    }

    #[test]
    fn test_resolve_relative_against_base() {
        let url = resolve_url(Some("http://cdn.local/assets/"), "img/a.png").unwrap();
        assert_eq!(url.as_str(), "http://cdn.local/assets/img/a.png");
    }

    #[test]
    fn test_resolve_relative_without_base_fails() {
        assert!(resolve_url(None, "img/a.png").is_err());
    }
}

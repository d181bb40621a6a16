use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use crate::fetch::FetchError;

/// Plain desktop user agent; the image CDNs refuse the default client one.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Seam for gallery downloads so the enrichment pipeline can run against
/// canned bytes in tests.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, FetchError>;
}

/// The real fetcher: one HTTP client with a browser user agent and a
/// bounded request timeout.
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(BROWSER_USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch_image(&self, url: &str) -> Result<FetchedImage, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(FetchError::BadStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Download {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .to_vec();

        Ok(FetchedImage {
            bytes,
            content_type,
        })
    }
}

/// Pick a file extension: the Content-Type wins, then the URL path, and
/// `jpg` when neither is usable.
pub fn extension_for(url: &str, content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if ct.contains("png") {
            return "png".to_string();
        }
        if ct.contains("jpeg") || ct.contains("jpg") {
            return "jpg".to_string();
        }
        if ct.contains("webp") {
            return "webp".to_string();
        }
        if ct.contains("gif") {
            return "gif".to_string();
        }
    }

    let path = url.split(&['?', '#'][..]).next().unwrap_or(url);
    if let Some((_, ext)) = path.rsplit_once('.') {
        if !ext.is_empty()
            && ext.len() <= 4
            && !ext.contains('/')
            && ext.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return ext.to_lowercase();
        }
    }
    "jpg".to_string()
}

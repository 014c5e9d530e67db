//! Image Loader Module
//!
//! The low-level image primitive: pulls bytes over HTTP and reads image headers.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use crate::cache::Dimensions;
use crate::error::{MediaError, Result};

/// Leading bytes read when only the image header is needed
const HEADER_BYTES: usize = 64 * 1024;
const HEADER_RANGE: &str = "bytes=0-65535";

// == Image Loader Trait ==
/// Platform image operations the fetch executor drives.
#[async_trait]
pub trait ImageLoader: Send + Sync {
    /// Pulls the resource's bytes so later renders are served warm.
    async fn prime(&self, url: &str) -> Result<()>;

    /// Resolves the resource's pixel dimensions.
    async fn resolve_dimensions(&self, url: &str) -> Result<Dimensions>;
}

// == HTTP Loader ==
/// reqwest-backed loader.
#[derive(Debug, Clone)]
pub struct HttpImageLoader {
    client: Client,
}

impl HttpImageLoader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a client whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("feed_prefetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::new(client))
    }
}

#[async_trait]
impl ImageLoader for HttpImageLoader {
    async fn prime(&self, url: &str) -> Result<()> {
        let mut response = self.client.get(url).send().await?.error_for_status()?;

        // Drain without buffering; only the transfer matters
        let mut total = 0usize;
        while let Some(chunk) = response.chunk().await? {
            total += chunk.len();
        }
        debug!(url = %url, bytes = total, "Primed image");
        Ok(())
    }

    async fn resolve_dimensions(&self, url: &str) -> Result<Dimensions> {
        let mut response = self
            .client
            .get(url)
            .header(header::RANGE, HEADER_RANGE)
            .send()
            .await?
            .error_for_status()?;

        // Servers without range support send the whole body; stop at the header
        let mut head = Vec::with_capacity(HEADER_BYTES);
        while head.len() < HEADER_BYTES {
            match response.chunk().await? {
                Some(chunk) => head.extend_from_slice(&chunk),
                None => break,
            }
        }
        head.truncate(HEADER_BYTES);
        decode_dimensions(&head)
    }
}

// == Header Decoding ==
/// Reads width and height from the start of an encoded image.
pub fn decode_dimensions(bytes: &[u8]) -> Result<Dimensions> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|err| MediaError::Decode(err.to_string()))?;

    if reader.format().is_none() {
        return Err(MediaError::Decode("unrecognized image format".to_string()));
    }

    let (width, height) = reader
        .into_dimensions()
        .map_err(|err| MediaError::Decode(err.to_string()))?;
    Ok(Dimensions::new(width, height))
}

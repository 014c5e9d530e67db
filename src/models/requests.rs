//! Request DTOs for the prefetch service API

use serde::Deserialize;

use crate::error::{MediaError, Result};
use crate::prefetch::FeedArticle;

/// Longest URL accepted from a client.
pub const MAX_URL_LEN: usize = 2048;

/// Request body for POST /feed/loaded
#[derive(Debug, Clone, Deserialize)]
pub struct FeedLoadedRequest {
    #[serde(default)]
    pub articles: Vec<FeedArticle>,
}

/// Request body for POST /feed/viewport
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportRequest {
    #[serde(default)]
    pub articles: Vec<FeedArticle>,
    pub current_index: usize,
}

/// Request body for POST /prefetch
#[derive(Debug, Clone, Deserialize)]
pub struct PrefetchRequest {
    pub urls: Vec<String>,
}

impl PrefetchRequest {
    /// Rejects oversized URLs. Blank entries are allowed and skipped downstream.
    pub fn validate(&self) -> Result<()> {
        match self.urls.iter().find(|url| url.len() > MAX_URL_LEN) {
            Some(_) => Err(MediaError::InvalidRequest(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LEN
            ))),
            None => Ok(()),
        }
    }
}

/// Query string for GET /cache
#[derive(Debug, Clone, Deserialize)]
pub struct CacheQuery {
    #[serde(default)]
    pub url: String,
}

impl CacheQuery {
    /// Returns the trimmed URL, or an error if it is blank or oversized.
    pub fn validate(&self) -> Result<&str> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(MediaError::InvalidKey("URL cannot be empty".to_string()));
        }
        if url.len() > MAX_URL_LEN {
            return Err(MediaError::InvalidKey(format!(
                "URL exceeds maximum length of {} characters",
                MAX_URL_LEN
            )));
        }
        Ok(url)
    }
}

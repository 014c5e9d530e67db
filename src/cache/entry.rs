//! Cache Entry Module
//!
//! Defines the metadata kept for each prefetched image.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::cache::CACHE_EXPIRY;

// == Dimensions ==
/// Pixel dimensions of a resolved image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Placeholder size used by consumers when dimensions were never resolved.
    pub const DEFAULT: Dimensions = Dimensions {
        width: 400,
        height: 300,
    };

    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, used to reserve layout space.
    ///
    /// A zero height falls back to the default ratio.
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            return Self::DEFAULT.aspect_ratio();
        }
        f64::from(self.width) / f64::from(self.height)
    }
}

// == Cache Entry ==
/// Represents a single prefetched resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Canonical resource key (the image URL)
    pub url: String,
    /// Insertion timestamp (Unix milliseconds)
    #[serde(rename = "timestamp")]
    pub inserted_at: u64,
    /// Resolved dimensions, None when resolution failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry stamped with the current time.
    pub fn new(url: impl Into<String>, dimensions: Option<Dimensions>) -> Self {
        Self::with_timestamp(url, current_timestamp_ms(), dimensions)
    }

    /// Creates an entry with an explicit insertion time.
    pub fn with_timestamp(
        url: impl Into<String>,
        inserted_at: u64,
        dimensions: Option<Dimensions>,
    ) -> Self {
        Self {
            url: url.into(),
            inserted_at,
            dimensions,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is at least `CACHE_EXPIRY` old at `now_ms`.
    ///
    /// Boundary condition: an entry exactly `CACHE_EXPIRY` old is expired.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.inserted_at) >= CACHE_EXPIRY.as_millis() as u64
    }

    /// Checks expiry against the current clock.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Dimensions with the placeholder substituted when absent.
    pub fn dimensions_or_default(&self) -> Dimensions {
        self.dimensions.unwrap_or(Dimensions::DEFAULT)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as zero.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: u64 = 60 * 60 * 1000;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("https://cdn.test/a.jpg", Some(Dimensions::new(800, 600)));

        assert_eq!(entry.url, "https://cdn.test/a.jpg");
        assert_eq!(entry.dimensions, Some(Dimensions::new(800, 600)));
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expiry_window() {
        let now = current_timestamp_ms();
        let fresh = CacheEntry::with_timestamp("a", now - HOUR_MS, None);
        let stale = CacheEntry::with_timestamp("b", now - 25 * HOUR_MS, None);

        assert!(!fresh.is_expired_at(now));
        assert!(stale.is_expired_at(now));
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = current_timestamp_ms();
        let entry = CacheEntry::with_timestamp("a", now - 24 * HOUR_MS, None);

        assert!(entry.is_expired_at(now), "Entry should be expired at boundary");
        assert!(!entry.is_expired_at(now - 1));
    }

    #[test]
    fn test_future_timestamp_not_expired() {
        let now = current_timestamp_ms();
        let entry = CacheEntry::with_timestamp("a", now + HOUR_MS, None);
        assert!(!entry.is_expired_at(now));
    }

    #[test]
    fn test_dimensions_default_fallback() {
        let entry = CacheEntry::new("a", None);
        assert_eq!(entry.dimensions_or_default(), Dimensions::DEFAULT);
        assert!((Dimensions::DEFAULT.aspect_ratio() - 4.0 / 3.0).abs() < 1e-9);
        assert!((Dimensions::new(10, 0).aspect_ratio() - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_snapshot_field_names() {
        let entry = CacheEntry::with_timestamp("a", 42, Some(Dimensions::new(2, 1)));
        let json = serde_json::to_value(&entry).unwrap();

        assert_eq!(json["url"], "a");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["dimensions"]["width"], 2);

        let bare: CacheEntry = serde_json::from_str(r#"{"url":"b","timestamp":7}"#).unwrap();
        assert!(bare.dimensions.is_none());
    }
}

//! Fetch Module
//!
//! The only layer that performs network I/O.

mod executor;
mod loader;

#[cfg(test)]
pub(crate) mod stub;

pub use executor::{FetchExecutor, Fetched, FETCH_TIMEOUT};
pub use loader::{decode_dimensions, HttpImageLoader, ImageLoader};

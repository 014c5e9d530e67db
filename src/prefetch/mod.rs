//! Prefetch Module
//!
//! Scheduling policy: what to fetch, when, and how many at once.

mod scheduler;
mod warmer;

pub use scheduler::{BatchOutcome, Prefetcher, MAX_CONCURRENT_PREFETCH};
pub use warmer::{
    FeedArticle, FeedWarmer, WarmupReport, WarmupState, AHEAD_WINDOW, BEHIND_WINDOW,
    VISIBLE_PASS_SIZE, WARMUP_PASS_SIZE,
};

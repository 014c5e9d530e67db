//! Warm-up Orchestrator Module
//!
//! Decides which feed images to prefetch and when: a blocking pass over the
//! first screenful, a one-time background warm-up, and a scroll-driven window
//! that follows the reader's position.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::prefetch::{BatchOutcome, Prefetcher};
use crate::tasks::BackgroundTasks;

/// Articles covered by the awaited first-paint pass
pub const VISIBLE_PASS_SIZE: usize = 5;

/// Articles covered by the one-time background warm-up
pub const WARMUP_PASS_SIZE: usize = 25;

/// Items prefetched ahead of the current index
pub const AHEAD_WINDOW: usize = 10;

/// Items prefetched behind the current index
pub const BEHIND_WINDOW: usize = 2;

// == Feed Article ==
/// The slice of an article the prefetcher cares about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedArticle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
}

impl FeedArticle {
    pub fn with_image(url: impl Into<String>) -> Self {
        Self {
            id: None,
            image_url: Some(url.into()),
        }
    }

    /// The image URL, if present and non-blank.
    pub fn image(&self) -> Option<&str> {
        self.image_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

// == Warm-up State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum WarmupState {
    Idle,
    WarmingUp,
    Steady,
}

impl WarmupState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WarmupState::Idle,
            1 => WarmupState::WarmingUp,
            _ => WarmupState::Steady,
        }
    }
}

/// What `on_feed_loaded` did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarmupReport {
    /// Outcome of the awaited first-paint pass
    pub visible: BatchOutcome,
    /// Keys handed to the background warm-up, zero after the first load
    pub warmup_scheduled: usize,
}

// == Feed Warmer ==
/// Translates feed events into prefetch batches. Never fails outward.
pub struct FeedWarmer {
    prefetcher: Arc<Prefetcher>,
    state: AtomicU8,
    tasks: BackgroundTasks,
}

impl FeedWarmer {
    pub fn new(prefetcher: Arc<Prefetcher>) -> Self {
        Self {
            prefetcher,
            state: AtomicU8::new(WarmupState::Idle as u8),
            tasks: BackgroundTasks::new(),
        }
    }

    pub fn prefetcher(&self) -> &Arc<Prefetcher> {
        &self.prefetcher
    }

    pub fn state(&self) -> WarmupState {
        WarmupState::from_u8(self.state.load(Ordering::Acquire))
    }

    // == Feed Loaded ==
    /// Runs the first-paint pass, then (once per process) the background warm-up.
    ///
    /// Returns after the first-paint pass settles; the warm-up is detached.
    pub async fn on_feed_loaded(&self, articles: &[FeedArticle]) -> WarmupReport {
        if articles.is_empty() {
            return WarmupReport::default();
        }

        let visible = self.uncached_images(articles.iter().take(VISIBLE_PASS_SIZE));
        let visible = if visible.is_empty() {
            BatchOutcome::default()
        } else {
            info!("High-priority preload of {} visible images", visible.len());
            self.prefetcher.request_batch(&visible).await
        };

        let warmup_scheduled = if self.enter_warm_up() {
            let critical = self.uncached_images(articles.iter().take(WARMUP_PASS_SIZE));
            let scheduled = critical.len();
            if scheduled > 0 {
                info!("Warming up cache with {} critical images", scheduled);
                self.spawn_batch("warm-up", critical);
            }
            self.state.store(WarmupState::Steady as u8, Ordering::Release);
            scheduled
        } else {
            0
        };

        WarmupReport {
            visible,
            warmup_scheduled,
        }
    }

    fn enter_warm_up(&self) -> bool {
        self.state
            .compare_exchange(
                WarmupState::Idle as u8,
                WarmupState::WarmingUp as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    // == Viewport Changed ==
    /// Re-centers the read-ahead / look-behind window on `current_index`.
    ///
    /// Returns the number of keys scheduled; zero means nothing was spawned.
    pub fn on_viewport_index_changed(&self, articles: &[FeedArticle], current_index: usize) -> usize {
        let candidates = self.window_candidates(articles, current_index);
        if candidates.is_empty() {
            return 0;
        }

        debug!(
            "Smart prefetch: {} images around index {}",
            candidates.len(),
            current_index
        );
        let scheduled = candidates.len();
        self.spawn_batch("smart prefetch", candidates);
        scheduled
    }

    /// Keys the window around `current_index` would request, forward window first.
    pub fn window_candidates(&self, articles: &[FeedArticle], current_index: usize) -> Vec<String> {
        let len = articles.len();
        let ahead_start = current_index.saturating_add(1).min(len);
        let ahead_end = current_index.saturating_add(1 + AHEAD_WINDOW).min(len);
        let behind_start = current_index.saturating_sub(BEHIND_WINDOW).min(len);
        let behind_end = current_index.min(len);

        let window = articles[ahead_start..ahead_end]
            .iter()
            .chain(&articles[behind_start..behind_end])
            .filter_map(FeedArticle::image);
        self.prefetcher.filter_pending(window)
    }

    fn uncached_images<'a>(&self, articles: impl Iterator<Item = &'a FeedArticle>) -> Vec<String> {
        let cache = self.prefetcher.cache();
        articles
            .filter_map(FeedArticle::image)
            .filter(|url| !cache.contains(url))
            .map(str::to_string)
            .collect()
    }

    fn spawn_batch(&self, pass: &'static str, keys: Vec<String>) {
        let prefetcher = Arc::clone(&self.prefetcher);
        self.tasks.spawn(pass, async move {
            let outcome = prefetcher.request_batch(&keys).await;
            debug!(
                "{} pass settled: {} of {} cached",
                pass, outcome.cached, outcome.submitted
            );
        });
    }

    // == Lifecycle ==
    /// Re-arms the one-time warm-up.
    pub fn reset_warm_up(&self) {
        self.state.store(WarmupState::Idle as u8, Ordering::Release);
    }

    /// Number of detached passes still tracked.
    pub fn pending_passes(&self) -> usize {
        self.tasks.len()
    }

    /// Waits for every detached pass to settle.
    pub async fn wait_idle(&self) {
        self.tasks.drain().await;
    }

    /// Waits up to `grace` for detached passes, then aborts the rest.
    pub async fn shutdown(&self, grace: Duration) -> bool {
        self.tasks.shutdown(grace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::fetch::stub::StubLoader;
    use crate::fetch::{FetchExecutor, FETCH_TIMEOUT};
    use crate::media::MediaCache;
    use crate::persistence::MemorySnapshotStorage;

    fn url(i: usize) -> String {
        format!("https://cdn.test/story/{i}.jpg")
    }

    fn feed(n: usize) -> Vec<FeedArticle> {
        (0..n).map(|i| FeedArticle::with_image(url(i))).collect()
    }

    async fn warmer(loader: &Arc<StubLoader>) -> FeedWarmer {
        let cache = Arc::new(MediaCache::open(Arc::new(MemorySnapshotStorage::new())).await);
        let executor = FetchExecutor::new(loader.clone(), FETCH_TIMEOUT);
        FeedWarmer::new(Arc::new(Prefetcher::new(cache, executor)))
    }

    #[test]
    fn test_article_image_accessor() {
        assert_eq!(FeedArticle::with_image(" a ").image(), Some("a"));
        assert_eq!(FeedArticle::with_image("").image(), None);
        assert_eq!(FeedArticle::default().image(), None);

        let parsed: FeedArticle =
            serde_json::from_str(r#"{"id":"x","imageUrl":"https://a/b.png","title":"t"}"#).unwrap();
        assert_eq!(parsed.image(), Some("https://a/b.png"));
        let legacy: FeedArticle = serde_json::from_str(r#"{"image":"https://a/c.png"}"#).unwrap();
        assert_eq!(legacy.image(), Some("https://a/c.png"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_loaded_awaits_visible_pass() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(100)));
        let warmer = warmer(&loader).await;
        let articles = feed(30);

        let report = warmer.on_feed_loaded(&articles).await;

        let cache = warmer.prefetcher().cache();
        assert_eq!(report.visible.cached, VISIBLE_PASS_SIZE);
        for i in 0..VISIBLE_PASS_SIZE {
            assert!(cache.contains(&url(i)), "visible image {i} not ready");
        }
        assert_eq!(report.warmup_scheduled, WARMUP_PASS_SIZE - VISIBLE_PASS_SIZE);
        assert_eq!(warmer.state(), WarmupState::Steady);

        warmer.wait_idle().await;
        assert_eq!(cache.len(), WARMUP_PASS_SIZE);
        assert!(!cache.contains(&url(WARMUP_PASS_SIZE)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_warm_up_runs_once() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(10)));
        let warmer = warmer(&loader).await;

        warmer.on_feed_loaded(&feed(30)).await;
        warmer.wait_idle().await;
        warmer.prefetcher().cache().clear().await;

        let report = warmer.on_feed_loaded(&feed(30)).await;
        warmer.wait_idle().await;

        assert_eq!(report.warmup_scheduled, 0);
        assert_eq!(warmer.prefetcher().cache().len(), VISIBLE_PASS_SIZE);

        warmer.reset_warm_up();
        assert_eq!(warmer.state(), WarmupState::Idle);
        let report = warmer.on_feed_loaded(&feed(30)).await;
        assert_eq!(report.warmup_scheduled, WARMUP_PASS_SIZE - VISIBLE_PASS_SIZE);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_feed_keeps_latch_armed() {
        let loader = Arc::new(StubLoader::new(Duration::ZERO));
        let warmer = warmer(&loader).await;

        let report = warmer.on_feed_loaded(&[]).await;

        assert_eq!(report, WarmupReport::default());
        assert_eq!(warmer.state(), WarmupState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_bounds() {
        let loader = Arc::new(StubLoader::new(Duration::ZERO));
        let warmer = warmer(&loader).await;
        let articles = feed(30);

        let expected: Vec<String> = (11..=20).chain(8..10).map(url).collect();
        assert_eq!(warmer.window_candidates(&articles, 10), expected);

        // Near the start, the backward window clamps at zero
        let expected: Vec<String> = (2..12).chain(0..1).map(url).collect();
        assert_eq!(warmer.window_candidates(&articles, 1), expected);

        // Near the end, the forward window clamps at the feed length
        let expected: Vec<String> = (28..30).chain(25..27).map(url).collect();
        assert_eq!(warmer.window_candidates(&articles, 27), expected);

        // Past the end the window is empty
        assert!(warmer.window_candidates(&articles, 40).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_viewport_skips_articles_without_images() {
        let loader = Arc::new(StubLoader::new(Duration::ZERO));
        let warmer = warmer(&loader).await;
        let mut articles = feed(5);
        articles[2].image_url = None;
        articles[3].image_url = Some("   ".into());

        assert_eq!(warmer.window_candidates(&articles, 0), vec![url(1), url(4)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_viewport_is_idempotent() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(100)));
        let warmer = warmer(&loader).await;
        let articles = feed(30);

        let first = warmer.on_viewport_index_changed(&articles, 10);
        tokio::task::yield_now().await;
        let second = warmer.on_viewport_index_changed(&articles, 10);
        warmer.wait_idle().await;
        let third = warmer.on_viewport_index_changed(&articles, 10);

        assert_eq!(first, 12);
        assert_eq!(second, 0, "all candidates are in flight");
        assert_eq!(third, 0, "all candidates are cached");
        assert_eq!(loader.calls().len(), 12);
        assert_eq!(warmer.pending_passes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_escape() {
        let loader = Arc::new(StubLoader::new(Duration::from_millis(10)));
        let warmer = warmer(&loader).await;
        let articles = feed(30);
        loader.fail(&url(0));
        loader.fail(&url(12));

        let report = warmer.on_feed_loaded(&articles).await;
        warmer.wait_idle().await;

        assert_eq!(report.visible.cached, VISIBLE_PASS_SIZE - 1);
        let cache = warmer.prefetcher().cache();
        assert!(!cache.contains(&url(0)));
        assert!(!cache.contains(&url(12)));
        assert_eq!(cache.len(), WARMUP_PASS_SIZE - 2);

        // The failed keys are eligible again on the next wave
        loader.recover(&url(12));
        assert_eq!(warmer.on_viewport_index_changed(&articles, 10), 1);
        warmer.wait_idle().await;
        assert!(cache.contains(&url(12)));
    }
}

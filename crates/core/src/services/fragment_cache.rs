//! Time-boxed cache for rendered page fragments.
//!
//! A cached fragment is served as-is until its TTL runs out, even if the
//! data it was rendered from has changed since. Only an explicit
//! invalidation forces an earlier recompute. Backend failures never fail
//! the request: they are logged and the fragment is rendered fresh.
//!
//! Every fragment name has a generation stored next to its entries and
//! folded into their keys. Dropping the generation orphans every variant
//! of the fragment at once; the orphans expire with their TTL.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use yatube_common::{AppResult, CacheStore, IdGenerator};

/// Name of the cached post list on the index page.
pub const INDEX_PAGE_FRAGMENT: &str = "index_page";

/// Default fragment lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(20);

/// Lifetime of a fragment generation marker.
const GENERATION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Generation used when the backend cannot be read.
const FALLBACK_GENERATION: &str = "0";

/// Build the cache key for a named fragment and its vary-on values.
///
/// `make_template_fragment_key("index_page", &["2"])` is
/// `template.cache.index_page.2`.
#[must_use]
pub fn make_template_fragment_key(fragment_name: &str, vary_on: &[&str]) -> String {
    let mut key = format!("template.cache.{fragment_name}");
    for value in vary_on {
        key.push('.');
        key.push_str(value);
    }
    key
}

/// Key holding the current generation of a fragment.
#[must_use]
pub fn generation_key(fragment_name: &str) -> String {
    format!("template.generation.{fragment_name}")
}

/// A freshly rendered fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    html: String,
    cacheable: bool,
}

impl Rendered {
    /// Output that may be stored.
    #[must_use]
    pub const fn cacheable(html: String) -> Self {
        Self {
            html,
            cacheable: true,
        }
    }

    /// Output served once and never stored, e.g. a page past the end.
    #[must_use]
    pub const fn transient(html: String) -> Self {
        Self {
            html,
            cacheable: false,
        }
    }
}

/// Fragment cache over a [`CacheStore`].
#[derive(Clone)]
pub struct FragmentCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
    id_gen: IdGenerator,
}

impl FragmentCache {
    /// Create a fragment cache.
    #[must_use]
    pub fn new(store: Arc<dyn CacheStore>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            id_gen: IdGenerator::new(),
        }
    }

    /// Fragment lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current storage key of one variant of a fragment.
    pub async fn key(&self, fragment_name: &str, vary_on: &[&str]) -> String {
        let generation = self.generation(fragment_name).await;
        let mut parts = Vec::with_capacity(vary_on.len() + 1);
        parts.push(generation.as_str());
        parts.extend_from_slice(vary_on);
        make_template_fragment_key(fragment_name, &parts)
    }

    /// Return the cached variant, or render it and store it if the render
    /// says it may be stored.
    ///
    /// Errors from `render` are propagated and nothing is stored.
    pub async fn get_or_render<F, Fut>(
        &self,
        fragment_name: &str,
        vary_on: &[&str],
        render: F,
    ) -> AppResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = AppResult<Rendered>>,
    {
        let key = self.key(fragment_name, vary_on).await;

        match self.store.get(&key).await {
            Ok(Some(fragment)) => {
                debug!(key = %key, "Fragment cache hit");
                return Ok(fragment);
            }
            Ok(None) => debug!(key = %key, "Fragment cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Fragment cache read failed, rendering fresh"),
        }

        let rendered = render().await?;
        if !rendered.cacheable {
            debug!(key = %key, "Fragment not cacheable, skipping store");
            return Ok(rendered.html);
        }

        if let Err(e) = self.store.set(&key, &rendered.html, self.ttl).await {
            warn!(key = %key, error = %e, "Fragment cache write failed");
        }

        Ok(rendered.html)
    }

    /// Drop one variant of a fragment so its next read recomputes it.
    pub async fn invalidate(&self, fragment_name: &str, vary_on: &[&str]) -> AppResult<()> {
        let key = self.key(fragment_name, vary_on).await;
        debug!(key = %key, "Invalidating fragment");
        self.store.delete(&key).await
    }

    /// Drop every variant of a fragment.
    pub async fn invalidate_fragment(&self, fragment_name: &str) -> AppResult<()> {
        debug!(fragment = %fragment_name, "Invalidating all fragment variants");
        self.store.delete(&generation_key(fragment_name)).await
    }

    async fn generation(&self, fragment_name: &str) -> String {
        let key = generation_key(fragment_name);
        match self.store.get(&key).await {
            Ok(Some(generation)) => return generation,
            Ok(None) => {}
            Err(e) => {
                warn!(key = %key, error = %e, "Fragment generation read failed");
                return FALLBACK_GENERATION.to_string();
            }
        }

        let generation = self.id_gen.generate_suffix();
        if let Err(e) = self.store.set(&key, &generation, GENERATION_TTL).await {
            warn!(key = %key, error = %e, "Fragment generation write failed");
        }
        generation
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yatube_common::{AppError, MemoryCacheStore};

    struct BrokenStore;

    #[async_trait::async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> AppResult<Option<String>> {
            Err(AppError::Redis("connection refused".to_string()))
        }

        async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> AppResult<()> {
            Err(AppError::Redis("connection refused".to_string()))
        }

        async fn delete(&self, _key: &str) -> AppResult<()> {
            Err(AppError::Redis("connection refused".to_string()))
        }
    }

    fn cached(html: &str) -> AppResult<Rendered> {
        Ok(Rendered::cacheable(html.to_string()))
    }

    #[test]
    fn test_fragment_keys() {
        assert_eq!(
            make_template_fragment_key("index_page", &[]),
            "template.cache.index_page"
        );
        assert_eq!(
            make_template_fragment_key("sidebar", &["a", "b"]),
            "template.cache.sidebar.a.b"
        );
        assert_eq!(generation_key("index_page"), "template.generation.index_page");
    }

    #[tokio::test]
    async fn test_key_is_stable_within_generation() {
        let cache = FragmentCache::new(Arc::new(MemoryCacheStore::new()), DEFAULT_TTL);

        let first = cache.key(INDEX_PAGE_FRAGMENT, &["2"]).await;
        assert_eq!(cache.key(INDEX_PAGE_FRAGMENT, &["2"]).await, first);
        assert!(first.starts_with("template.cache.index_page."));
        assert!(first.ends_with(".2"));

        cache.invalidate_fragment(INDEX_PAGE_FRAGMENT).await.unwrap();
        assert_ne!(cache.key(INDEX_PAGE_FRAGMENT, &["2"]).await, first);
    }

    #[tokio::test]
    async fn test_serves_stale_until_invalidated() {
        let cache = FragmentCache::new(Arc::new(MemoryCacheStore::new()), DEFAULT_TTL);

        let first = cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async { cached("before") })
            .await
            .unwrap();
        let second = cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async { cached("after") })
            .await
            .unwrap();
        assert_eq!(first, "before");
        assert_eq!(second, "before");

        cache.invalidate(INDEX_PAGE_FRAGMENT, &["1"]).await.unwrap();
        let third = cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async { cached("after") })
            .await
            .unwrap();
        assert_eq!(third, "after");
    }

    #[tokio::test]
    async fn test_invalidate_fragment_clears_every_page() {
        let cache = FragmentCache::new(Arc::new(MemoryCacheStore::new()), DEFAULT_TTL);

        for page in ["1", "2", "3"] {
            cache
                .get_or_render(INDEX_PAGE_FRAGMENT, &[page], || async { cached("before") })
                .await
                .unwrap();
        }

        cache.invalidate_fragment(INDEX_PAGE_FRAGMENT).await.unwrap();

        for page in ["1", "2", "3"] {
            let fresh = cache
                .get_or_render(INDEX_PAGE_FRAGMENT, &[page], || async { cached("after") })
                .await
                .unwrap();
            assert_eq!(fresh, "after", "page {page}");
        }
    }

    #[tokio::test]
    async fn test_transient_output_is_not_stored() {
        let store = MemoryCacheStore::new();
        let cache = FragmentCache::new(Arc::new(store.clone()), DEFAULT_TTL);

        for page in 1..=5000u32 {
            let page = page.to_string();
            cache
                .get_or_render(INDEX_PAGE_FRAGMENT, &[&page], || async {
                    Ok(Rendered::transient(String::new()))
                })
                .await
                .unwrap();
        }

        // Only the generation marker
        assert_eq!(store.len().await, 1);

        let fresh = cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async {
                Ok(Rendered::transient("second".to_string()))
            })
            .await
            .unwrap();
        assert_eq!(fresh, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_recomputes_after_ttl() {
        let cache = FragmentCache::new(Arc::new(MemoryCacheStore::new()), DEFAULT_TTL);

        cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async { cached("before") })
            .await
            .unwrap();

        tokio::time::advance(DEFAULT_TTL + Duration::from_secs(1)).await;

        let fresh = cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async { cached("after") })
            .await
            .unwrap();
        assert_eq!(fresh, "after");
    }

    #[tokio::test]
    async fn test_backend_failure_renders_fresh() {
        let cache = FragmentCache::new(Arc::new(BrokenStore), DEFAULT_TTL);

        let fragment = cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async { cached("fresh") })
            .await
            .unwrap();
        assert_eq!(fragment, "fresh");
        assert!(cache.invalidate_fragment(INDEX_PAGE_FRAGMENT).await.is_err());
    }

    #[tokio::test]
    async fn test_render_error_is_not_cached() {
        let store = MemoryCacheStore::new();
        let cache = FragmentCache::new(Arc::new(store.clone()), DEFAULT_TTL);

        let result = cache
            .get_or_render(INDEX_PAGE_FRAGMENT, &["1"], || async {
                Err(AppError::Internal("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        // Only the generation marker
        assert_eq!(store.len().await, 1);
    }
}

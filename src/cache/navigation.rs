//! Navigation link cache
//!
//! Holds the static-page links shown in the site navigation. Loaded on first
//! use, served from memory until the TTL lapses, and dropped on
//! [`NavigationCache::invalidate`] (explicit refresh or a page write).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::db::ContentStore;
use crate::types::Result;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NavLink {
    pub slug: String,
    pub title: String,
    pub href: String,
}

struct CachedLinks {
    links: Vec<NavLink>,
    expires_at: Instant,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationCacheStats {
    pub cached: bool,
    pub link_count: usize,
    pub ttl_secs: u64,
}

pub struct NavigationCache {
    ttl: Duration,
    entry: RwLock<Option<CachedLinks>>,
    /// Bumped by every invalidation; a load started under an older value
    /// must not be cached
    generation: AtomicU64,
}

impl NavigationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Cached links, loading from the store when empty or expired
    pub async fn get_or_load(&self, store: &dyn ContentStore) -> Result<Vec<NavLink>> {
        if let Some(links) = self.get_cached().await {
            debug!(count = links.len(), "Navigation served from cache");
            return Ok(links);
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let links: Vec<NavLink> = store
            .list_pages()
            .await?
            .into_iter()
            .map(|p| NavLink {
                href: format!("/pages/{}", p.slug),
                slug: p.slug,
                title: p.title,
            })
            .collect();

        self.store_if_current(generation, links.clone()).await;
        debug!(count = links.len(), "Navigation loaded");
        Ok(links)
    }

    /// Cache `links` unless an invalidation happened since `generation`
    async fn store_if_current(&self, generation: u64, links: Vec<NavLink>) -> bool {
        let mut entry = self.entry.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("Navigation invalidated during load, not caching");
            return false;
        }
        let Some(expires_at) = Instant::now().checked_add(self.ttl) else {
            warn!(ttl_secs = self.ttl.as_secs(), "Navigation TTL out of range, not caching");
            return false;
        };
        *entry = Some(CachedLinks { links, expires_at });
        true
    }

    async fn get_cached(&self) -> Option<Vec<NavLink>> {
        let entry = self.entry.read().await;
        entry.as_ref().and_then(|cached| {
            if cached.expires_at > Instant::now() {
                Some(cached.links.clone())
            } else {
                None
            }
        })
    }

    /// Drop the cached links; the next read reloads
    pub async fn invalidate(&self) {
        let mut entry = self.entry.write().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        *entry = None;
    }

    pub async fn stats(&self) -> NavigationCacheStats {
        let entry = self.entry.read().await;
        let live = entry.as_ref().filter(|c| c.expires_at > Instant::now());
        NavigationCacheStats {
            cached: live.is_some(),
            link_count: live.map(|c| c.links.len()).unwrap_or(0),
            ttl_secs: self.ttl.as_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::NewPage;
    use crate::db::MemoryStore;

    fn page(title: &str) -> NewPage {
        NewPage {
            title: title.to_string(),
            content: String::new(),
        }
    }

    #[test]
    fn test_empty_cache_reports_nothing_cached() {
        let cache = NavigationCache::new(Duration::from_secs(60));
        let stats = tokio_test::block_on(cache.stats());
        assert!(!stats.cached);
        assert_eq!(stats.link_count, 0);
        assert_eq!(stats.ttl_secs, 60);
    }

    #[tokio::test]
    async fn test_serves_cached_links_until_invalidated() {
        let store = MemoryStore::new();
        store.upsert_page("about", page("About")).await.unwrap();
        let cache = NavigationCache::new(Duration::from_secs(300));

        let first = cache.get_or_load(&store).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].href, "/pages/about");

        store.upsert_page("terms", page("Terms")).await.unwrap();
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 1);

        cache.invalidate().await;
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_load_overtaken_by_invalidate_is_not_cached() {
        let cache = NavigationCache::new(Duration::from_secs(300));
        let stale = vec![NavLink {
            slug: "about".into(),
            title: "About".into(),
            href: "/pages/about".into(),
        }];

        let generation = cache.generation.load(Ordering::SeqCst);
        cache.invalidate().await;
        assert!(!cache.store_if_current(generation, stale.clone()).await);
        assert!(!cache.stats().await.cached);

        let generation = cache.generation.load(Ordering::SeqCst);
        assert!(cache.store_if_current(generation, stale).await);
        assert_eq!(cache.stats().await.link_count, 1);
    }

    #[tokio::test]
    async fn test_oversized_ttl_skips_caching() {
        let store = MemoryStore::new();
        store.upsert_page("about", page("About")).await.unwrap();
        let cache = NavigationCache::new(Duration::MAX);

        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 1);
        assert!(!cache.stats().await.cached);
    }

    #[tokio::test]
    async fn test_expired_entry_reloads() {
        let store = MemoryStore::new();
        let cache = NavigationCache::new(Duration::ZERO);

        assert!(cache.get_or_load(&store).await.unwrap().is_empty());
        store.upsert_page("privacy", page("Privacy")).await.unwrap();
        assert_eq!(cache.get_or_load(&store).await.unwrap().len(), 1);
        assert!(!cache.stats().await.cached);
    }
}

//! Entity cache bootstrap.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::cache::{CacheAside, CacheTtl, EntityCache, MemoryCache, RedisCache};
use crate::config::{CacheBackend, CacheSettings};

const SOURCE: &str = "blogo::cache";
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the cache selected by `settings`. An unreachable Redis server
/// leaves the service running without a cache.
pub async fn build_cache(settings: &CacheSettings) -> CacheAside {
    build_cache_with_timeout(settings, REDIS_CONNECT_TIMEOUT).await
}

async fn build_cache_with_timeout(settings: &CacheSettings, timeout: Duration) -> CacheAside {
    if !settings.enabled {
        info!(target = SOURCE, "entity cache disabled");
        return CacheAside::disabled();
    }

    let ttl = CacheTtl::from(settings);
    let store: Arc<dyn EntityCache> = match &settings.backend {
        CacheBackend::Memory => {
            info!(
                target = SOURCE,
                backend = "memory",
                capacity = settings.capacity.get(),
                "entity cache enabled"
            );
            Arc::new(MemoryCache::new(settings.capacity))
        }
        CacheBackend::Redis { url } => match RedisCache::connect(url, timeout).await {
            Ok(cache) => {
                info!(target = SOURCE, backend = "redis", "entity cache enabled");
                Arc::new(cache)
            }
            Err(err) => {
                warn!(
                    target = SOURCE,
                    backend = "redis",
                    error = %err,
                    "redis unreachable; continuing without cache"
                );
                return CacheAside::disabled();
            }
        },
    };

    info!(
        target = SOURCE,
        user_ttl_seconds = ttl.user.as_secs(),
        blog_ttl_seconds = ttl.blog.as_secs(),
        "entity cache lifetimes"
    );
    CacheAside::new(Some(store), ttl)
}

//! Read-through and invalidation protocol.
//!
//! Every method is infallible from the caller's point of view: a missing
//! cache behaves as a permanent miss and a failing one is logged and
//! counted, never surfaced. The store stays authoritative.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{debug, warn};

use crate::config::CacheSettings;
use crate::domain::entities::{Blog, BlogId, User, UserId};

use super::keys::{BLOG_LIST_NAMESPACE, CacheKey};
use super::{CacheError, EntityCache};

const SOURCE: &str = "cache::aside";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtl {
    pub user: Duration,
    pub blog: Duration,
}

impl Default for CacheTtl {
    fn default() -> Self {
        Self::from(&CacheSettings::default())
    }
}

impl From<&CacheSettings> for CacheTtl {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            user: settings.user_ttl,
            blog: settings.blog_ttl,
        }
    }
}

#[derive(Clone, Default)]
pub struct CacheAside {
    cache: Option<Arc<dyn EntityCache>>,
    ttl: CacheTtl,
}

impl CacheAside {
    pub fn new(cache: Option<Arc<dyn EntityCache>>, ttl: CacheTtl) -> Self {
        Self { cache, ttl }
    }

    /// No backing cache: every lookup misses and every write is dropped.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.cache.is_some()
    }

    pub fn ttl(&self) -> CacheTtl {
        self.ttl
    }

    pub async fn cached_user(&self, id: UserId) -> Option<User> {
        let cache = self.cache.as_ref()?;
        let outcome = cache.get_user(id).await;
        record_lookup(CacheKey::User(id), outcome)
    }

    pub async fn store_user(&self, user: &User) {
        if let Some(cache) = &self.cache
            && let Err(err) = cache.set_user(user, self.ttl.user).await
        {
            record_failure(CacheKey::User(user.id), "set", &err);
        }
    }

    pub async fn invalidate_user(&self, id: UserId) {
        if let Some(cache) = &self.cache {
            let result = cache.delete_user(id).await;
            record_invalidation(CacheKey::User(id), result);
        }
    }

    pub async fn cached_blog(&self, id: BlogId) -> Option<Blog> {
        let cache = self.cache.as_ref()?;
        let outcome = cache.get_blog(id).await;
        record_lookup(CacheKey::Blog(id), outcome)
    }

    pub async fn store_blog(&self, blog: &Blog) {
        if let Some(cache) = &self.cache
            && let Err(err) = cache.set_blog(blog, self.ttl.blog).await
        {
            record_failure(CacheKey::Blog(blog.id), "set", &err);
        }
    }

    pub async fn invalidate_blog(&self, id: BlogId) {
        if let Some(cache) = &self.cache {
            let result = cache.delete_blog(id).await;
            record_invalidation(CacheKey::Blog(id), result);
        }
    }

    /// Drop every entry under the blog-list namespace.
    pub async fn invalidate_blog_lists(&self) {
        let Some(cache) = &self.cache else {
            return;
        };
        match cache.delete_by_prefix(BLOG_LIST_NAMESPACE).await {
            Ok(removed) => {
                counter!("blogo_cache_invalidate_total", "kind" => "blog_list").increment(1);
                debug!(
                    target = SOURCE,
                    prefix = BLOG_LIST_NAMESPACE,
                    removed,
                    "blog list namespace invalidated"
                );
            }
            Err(err) => {
                counter!("blogo_cache_error_total", "kind" => "blog_list").increment(1);
                warn!(
                    target = SOURCE,
                    op = "delete_by_prefix",
                    prefix = BLOG_LIST_NAMESPACE,
                    error = %err,
                    "cache invalidation failed"
                );
            }
        }
    }
}

fn record_lookup<T>(key: CacheKey, outcome: Result<Option<T>, CacheError>) -> Option<T> {
    let kind = key.kind();
    match outcome {
        Ok(Some(value)) => {
            counter!("blogo_cache_hit_total", "kind" => kind).increment(1);
            Some(value)
        }
        Ok(None) => {
            counter!("blogo_cache_miss_total", "kind" => kind).increment(1);
            None
        }
        Err(err) => {
            counter!("blogo_cache_miss_total", "kind" => kind).increment(1);
            record_failure(key, "get", &err);
            None
        }
    }
}

fn record_invalidation(key: CacheKey, result: Result<(), CacheError>) {
    match result {
        Ok(()) => {
            counter!("blogo_cache_invalidate_total", "kind" => key.kind()).increment(1);
        }
        Err(err) => record_failure(key, "delete", &err),
    }
}

fn record_failure(key: CacheKey, op: &'static str, err: &CacheError) {
    counter!("blogo_cache_error_total", "kind" => key.kind()).increment(1);
    warn!(
        target = SOURCE,
        op,
        key = %key,
        error = %err,
        "cache operation failed; continuing without cache"
    );
}

//! Entity cache
//!
//! An optional, failure-transparent cache in front of the relational store:
//!
//! - [`EntityCache`]: port over a keyed byte store with per-entry TTL and
//!   prefix deletion. Typed user/blog accessors are provided on top of the
//!   raw operations and encode entities as JSON.
//! - [`MemoryCache`]: in-process implementation (LRU bounded, lazily expired).
//! - [`RedisCache`]: shared implementation over a Redis server, so every
//!   instance sees the same entries and invalidations.
//! - [`CacheAside`]: the read-through / invalidate-on-write protocol used by
//!   the use-cases. It owns the `Option` for "no cache configured" and
//!   swallows every cache failure.
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enabled = true
//! backend = "memory"      # or "redis"
//! redis_url = "redis://127.0.0.1:6379"
//! capacity = 10000        # memory backend only
//! user_ttl_seconds = 900
//! blog_ttl_seconds = 600
//! ```

mod aside;
mod keys;
mod lock;
mod remote;
mod store;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::domain::entities::{Blog, BlogId, User, UserId};

pub use aside::{CacheAside, CacheTtl};
pub use keys::{BLOG_LIST_NAMESPACE, CacheKey};
pub use remote::RedisCache;
pub use store::MemoryCache;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),
    #[error("failed to encode cache entry `{key}`: {message}")]
    Encode { key: String, message: String },
    #[error("failed to decode cache entry `{key}`: {message}")]
    Decode { key: String, message: String },
    #[error("ttl of {seconds}s for `{key}` is out of range")]
    TtlOutOfRange { key: String, seconds: u64 },
}

#[async_trait]
pub trait EntityCache: Send + Sync {
    /// Raw lookup. Expired entries read as absent.
    async fn get_raw(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set_raw(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key starting with `prefix`; returns how many were removed.
    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>, CacheError> {
        let key = CacheKey::User(id).to_string();
        match self.get_raw(&key).await? {
            Some(bytes) => decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn set_user(&self, user: &User, ttl: Duration) -> Result<(), CacheError> {
        let key = CacheKey::User(user.id).to_string();
        let bytes = encode(&key, user)?;
        self.set_raw(&key, bytes, ttl).await
    }

    async fn delete_user(&self, id: UserId) -> Result<(), CacheError> {
        self.delete(&CacheKey::User(id).to_string()).await
    }

    async fn get_blog(&self, id: BlogId) -> Result<Option<Blog>, CacheError> {
        let key = CacheKey::Blog(id).to_string();
        match self.get_raw(&key).await? {
            Some(bytes) => decode(&key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    async fn set_blog(&self, blog: &Blog, ttl: Duration) -> Result<(), CacheError> {
        let key = CacheKey::Blog(blog.id).to_string();
        let bytes = encode(&key, blog)?;
        self.set_raw(&key, bytes, ttl).await
    }

    async fn delete_blog(&self, id: BlogId) -> Result<(), CacheError> {
        self.delete(&CacheKey::Blog(id).to_string()).await
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<Bytes, CacheError> {
    serde_json::to_vec(value)
        .map(Bytes::from)
        .map_err(|err| CacheError::Encode {
            key: key.to_string(),
            message: err.to_string(),
        })
}

fn decode<T: DeserializeOwned>(key: &str, bytes: &[u8]) -> Result<T, CacheError> {
    serde_json::from_slice(bytes).map_err(|err| CacheError::Decode {
        key: key.to_string(),
        message: err.to_string(),
    })
}

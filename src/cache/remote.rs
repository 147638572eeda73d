//! Redis-backed cache storage.
//!
//! Entries are written with `SET .. EX`, so expiry is enforced by the server.
//! Prefix deletion walks the keyspace with `SCAN MATCH` and deletes in
//! batches; it never blocks the server the way `KEYS` would.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::{AsyncCommands, RedisError, aio::ConnectionManager};
use tracing::info;

use super::{CacheError, EntityCache};

const SOURCE: &str = "cache::remote";
const SCAN_BATCH: usize = 200;

/// Shared cache over one multiplexed, auto-reconnecting Redis connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Open a connection and verify it with `PING`. Fails when the server
    /// cannot be reached within `timeout`.
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url).map_err(unavailable)?;

        let connection = tokio::time::timeout(timeout, async {
            let mut connection = ConnectionManager::new(client).await?;
            let _: String = redis::cmd("PING").query_async(&mut connection).await?;
            Ok::<_, RedisError>(connection)
        })
        .await
        .map_err(|_| {
            CacheError::Unavailable(format!("no answer within {}ms", timeout.as_millis()))
        })?
        .map_err(unavailable)?;

        info!(target = SOURCE, "redis cache connected");
        Ok(Self { connection })
    }
}

#[async_trait]
impl EntityCache for RedisCache {
    async fn get_raw(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut connection = self.connection.clone();
        let value: Option<Vec<u8>> = connection.get(key).await.map_err(unavailable)?;
        Ok(value.map(Bytes::from))
    }

    async fn set_raw(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        // EX takes whole seconds and rejects zero
        let seconds = ttl.as_secs().max(1);
        let mut connection = self.connection.clone();
        let _: () = connection
            .set_ex(key, value.to_vec(), seconds)
            .await
            .map_err(unavailable)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut connection = self.connection.clone();
        let _: u64 = connection.del(key).await.map_err(unavailable)?;
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let pattern = format!("{}*", escape_glob(prefix));
        let mut connection = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut connection)
                .await
                .map_err(unavailable)?;

            if !keys.is_empty() {
                let deleted: u64 = connection.del(&keys).await.map_err(unavailable)?;
                removed += deleted;
            }

            if next == 0 {
                return Ok(removed);
            }
            cursor = next;
        }
    }
}

fn unavailable(err: RedisError) -> CacheError {
    CacheError::Unavailable(err.to_string())
}

/// Escape glob metacharacters so the prefix matches literally.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_metacharacters_are_escaped() {
        assert_eq!(escape_glob("blogs:"), "blogs:");
        assert_eq!(escape_glob("a*b?[c]"), "a\\*b\\?\\[c\\]");
    }

    #[tokio::test]
    async fn malformed_url_is_unavailable() {
        let err = RedisCache::connect("not a url", Duration::from_millis(200))
            .await
            .err()
            .expect("connect should fail");
        assert!(matches!(err, CacheError::Unavailable(_)));
    }

    #[tokio::test]
    async fn unreachable_server_fails_within_timeout() {
        let started = std::time::Instant::now();
        let err = RedisCache::connect("redis://127.0.0.1:1/", Duration::from_millis(300))
            .await
            .err()
            .expect("nothing listens on port 1");
        assert!(matches!(err, CacheError::Unavailable(_)));
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}

//! Resilient Read
//!
//! The one fallback strategy shared by every remote-backed read:
//! 1. try the remote service (skipped in offline mode)
//! 2. on success, mirror the result into the cache before returning
//! 3. on failure, use the cached value if it is usable
//! 4. otherwise use the built-in default
//!
//! Environment failures are logged and absorbed; a read always yields a value.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::cache::{self, CacheStore};
use crate::error::RemoteError;

/// Where a resolved value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadSource {
    Remote,
    Cache,
    Default,
}

/// A value together with its source
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ReadSource,
}

/// The read was abandoned before the remote call finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadCancelled;

#[derive(Clone)]
pub struct ResilientRead {
    cache: Arc<dyn CacheStore>,
}

impl std::fmt::Debug for ResilientRead {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientRead").finish_non_exhaustive()
    }
}

impl ResilientRead {
    pub fn new(cache: Arc<dyn CacheStore>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Read with every cached value considered usable
    pub async fn read<T, Fut, D>(&self, key: &str, remote: Fut, default: D) -> Resolved<T>
    where
        T: Serialize + DeserializeOwned + Sync,
        Fut: Future<Output = Result<T, RemoteError>>,
        D: FnOnce() -> T,
    {
        self.read_with(key, remote, |_| true, default).await
    }

    /// Read where `usable` decides whether a value may be returned as is.
    ///
    /// An unusable remote value is still mirrored, then the default is returned.
    pub async fn read_with<T, Fut, U, D>(
        &self,
        key: &str,
        remote: Fut,
        usable: U,
        default: D,
    ) -> Resolved<T>
    where
        T: Serialize + DeserializeOwned + Sync,
        Fut: Future<Output = Result<T, RemoteError>>,
        U: Fn(&T) -> bool,
        D: FnOnce() -> T,
    {
        let outcome = remote.await;
        self.settle(key, outcome, usable, default).await
    }

    /// Like [`read_with`](Self::read_with), abandoning the remote call when
    /// `cancel` fires. A cancelled read never touches the cache.
    pub async fn read_cancellable<T, Fut, U, D>(
        &self,
        key: &str,
        remote: Fut,
        usable: U,
        default: D,
        cancel: &CancellationToken,
    ) -> Result<Resolved<T>, ReadCancelled>
    where
        T: Serialize + DeserializeOwned + Sync,
        Fut: Future<Output = Result<T, RemoteError>>,
        U: Fn(&T) -> bool,
        D: FnOnce() -> T,
    {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(key = key, "Remote read cancelled");
                return Err(ReadCancelled);
            }
            outcome = remote => outcome,
        };
        if cancel.is_cancelled() {
            tracing::debug!(key = key, "Remote read cancelled before mirroring");
            return Err(ReadCancelled);
        }
        Ok(self.settle(key, outcome, usable, default).await)
    }

    async fn settle<T, U, D>(
        &self,
        key: &str,
        outcome: Result<T, RemoteError>,
        usable: U,
        default: D,
    ) -> Resolved<T>
    where
        T: Serialize + DeserializeOwned + Sync,
        U: Fn(&T) -> bool,
        D: FnOnce() -> T,
    {
        match outcome {
            Ok(value) => {
                if let Err(e) = cache::store(self.cache.as_ref(), key, &value).await {
                    tracing::warn!(
                        key = key,
                        error = %e,
                        "Failed to mirror remote read into cache"
                    );
                }
                if usable(&value) {
                    return Resolved {
                        value,
                        source: ReadSource::Remote,
                    };
                }
                tracing::debug!(key = key, "Remote value empty, using default");
                Resolved {
                    value: default(),
                    source: ReadSource::Default,
                }
            }
            Err(e) => {
                match &e {
                    RemoteError::Offline => tracing::debug!(key = key, "Offline, reading cache"),
                    _ => tracing::warn!(key = key, error = %e, "Remote read failed, reading cache"),
                }
                self.fallback(key, usable, default).await
            }
        }
    }

    /// Cache, then default; never contacts the remote service
    pub async fn fallback<T, U, D>(&self, key: &str, usable: U, default: D) -> Resolved<T>
    where
        T: DeserializeOwned,
        U: Fn(&T) -> bool,
        D: FnOnce() -> T,
    {
        match cache::load::<T>(self.cache.as_ref(), key).await {
            Ok(Some(value)) if usable(&value) => {
                return Resolved {
                    value,
                    source: ReadSource::Cache,
                };
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(key = key, error = %e, "Cache read failed, using default"),
        }
        Resolved {
            value: default(),
            source: ReadSource::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use serde_json::json;

    fn reader() -> (ResilientRead, Arc<MemoryCache>) {
        let cache = Arc::new(MemoryCache::new());
        (ResilientRead::new(cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_remote_success_is_mirrored() {
        let (reader, cache) = reader();
        let resolved = reader
            .read("k", async { Ok(vec![1, 2]) }, Vec::new)
            .await;
        assert_eq!(resolved.value, vec![1, 2]);
        assert_eq!(resolved.source, ReadSource::Remote);
        assert_eq!(cache.get("k").await.unwrap(), Some(json!([1, 2])));
    }

    #[tokio::test]
    async fn test_remote_failure_uses_cache_then_default() {
        let (reader, cache) = reader();
        let failing = || async { Err::<Vec<i32>, _>(RemoteError::Unavailable("down".into())) };

        let resolved = reader.read("k", failing(), || vec![9]).await;
        assert_eq!(resolved, Resolved { value: vec![9], source: ReadSource::Default });

        cache.set("k", json!([3])).await.unwrap();
        let resolved = reader.read("k", failing(), || vec![9]).await;
        assert_eq!(resolved, Resolved { value: vec![3], source: ReadSource::Cache });
    }

    #[tokio::test]
    async fn test_unusable_cache_falls_to_default() {
        let (reader, cache) = reader();
        cache.set("k", json!([])).await.unwrap();
        let resolved = reader
            .read_with(
                "k",
                async { Err(RemoteError::Offline) },
                |v: &Vec<i32>| !v.is_empty(),
                || vec![7],
            )
            .await;
        assert_eq!(resolved.source, ReadSource::Default);
        assert_eq!(resolved.value, vec![7]);
    }

    #[tokio::test]
    async fn test_corrupted_cache_falls_to_default() {
        let (reader, cache) = reader();
        cache.set("k", json!({"oops": true})).await.unwrap();
        let resolved = reader
            .read("k", async { Err(RemoteError::Offline) }, || vec![1])
            .await;
        assert_eq!(resolved.value, vec![1]);
    }

    #[tokio::test]
    async fn test_cancelled_read_leaves_cache_untouched() {
        let (reader, cache) = reader();
        cache.set("k", json!([5])).await.unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = reader
            .read_cancellable("k", async { Ok(vec![1]) }, |_| true, Vec::new, &cancel)
            .await;
        assert_eq!(result, Err(ReadCancelled));
        assert_eq!(cache.get("k").await.unwrap(), Some(json!([5])));
    }

    #[tokio::test]
    async fn test_cancellation_during_slow_remote() {
        let (reader, cache) = reader();
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            trigger.cancel();
        });

        let slow = async {
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            Ok(vec![1])
        };
        let result = reader
            .read_cancellable("k", slow, |_: &Vec<i32>| true, Vec::new, &cancel)
            .await;
        assert_eq!(result, Err(ReadCancelled));
        assert!(cache.get("k").await.unwrap().is_none());
    }
}

//! Cache-or-default policy for read paths.
//!
//! Transport and backend failures stay visible in [`DataSource`] rather than
//! turning into a fake empty success.

use dashmap::DashMap;
use sb_core::{ForumError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Distinct reads remembered before the oldest is evicted.
pub const DEFAULT_CACHE_LIMIT: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Errors reach the caller.
    #[default]
    Propagate,
    /// Failures yield `T::default()`.
    EmptyOnFailure,
    /// Failures yield the last good result for the same key, else the default.
    CacheOrEmpty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Live,
    Cached { reason: String },
    Fallback { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Degradable<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Degradable<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source != DataSource::Live
    }

    pub fn into_inner(self) -> T {
        self.data
    }
}

#[derive(Debug)]
struct CachedRead {
    value: Value,
    stamp: u64,
}

/// Last good responses, keyed by endpoint and bounded by `limit`.
///
/// Every successful read is remembered whatever its policy, so a later
/// degraded read of the same endpoint has something to fall back on.
#[derive(Debug)]
pub struct ReadFallback {
    cache: DashMap<String, CachedRead>,
    clock: AtomicU64,
    limit: usize,
}

impl Default for ReadFallback {
    fn default() -> Self {
        Self::with_limit(DEFAULT_CACHE_LIMIT)
    }
}

impl ReadFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// A limit of zero disables caching.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            cache: DashMap::new(),
            clock: AtomicU64::new(0),
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    fn remember(&self, key: &str, value: Value) {
        if self.limit == 0 {
            return;
        }
        let stamp = self.clock.fetch_add(1, Ordering::Relaxed);
        self.cache.insert(key.to_string(), CachedRead { value, stamp });
        while self.cache.len() > self.limit {
            let oldest = self
                .cache
                .iter()
                .min_by_key(|entry| entry.value().stamp)
                .map(|entry| entry.key().clone());
            match oldest {
                Some(oldest) => {
                    debug!(key = %oldest, "evicting cached read");
                    self.cache.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub async fn read<T, F>(&self, key: &str, policy: ReadPolicy, fetch: F) -> Result<Degradable<T>>
    where
        T: Serialize + DeserializeOwned + Default,
        F: Future<Output = Result<T>>,
    {
        let err = match fetch.await {
            Ok(data) => {
                match serde_json::to_value(&data) {
                    Ok(value) => self.remember(key, value),
                    Err(e) => debug!(key, error = %e, "not caching unserializable read"),
                }
                return Ok(Degradable::live(data));
            }
            Err(err) => err,
        };

        match policy {
            ReadPolicy::Propagate => Err(err),
            ReadPolicy::EmptyOnFailure => Ok(Self::empty(key, &err)),
            ReadPolicy::CacheOrEmpty => {
                let cached = self
                    .cache
                    .get(key)
                    .and_then(|entry| serde_json::from_value::<T>(entry.value().value.clone()).ok());
                match cached {
                    Some(data) => {
                        warn!(key, error = %err, "read failed, serving cached data");
                        Ok(Degradable {
                            data,
                            source: DataSource::Cached {
                                reason: err.to_string(),
                            },
                        })
                    }
                    None => Ok(Self::empty(key, &err)),
                }
            }
        }
    }

    fn empty<T: Default>(key: &str, err: &ForumError) -> Degradable<T> {
        warn!(key, error = %err, "read failed, serving empty fallback");
        Degradable {
            data: T::default(),
            source: DataSource::Fallback {
                reason: err.to_string(),
            },
        }
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

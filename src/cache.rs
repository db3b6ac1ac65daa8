//! Caching rendered pages.
//!
//! The cache is purely an optimization: a [`RenderCache`] without a store, or with a store that
//! cannot be reached, answers every lookup with a miss and drops every write.

use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::log::*;

use crate::ViewOptions;

mod memcached;
mod memory;

pub use memcached::{Memcached, DEFAULT_MEMCACHED_ADDR};
pub use memory::MemoryStore;

/// Longest key the memcached protocol accepts.
const MAX_KEY_LEN: usize = 250;

/// Errors talking to a [`CacheStore`].
#[derive(Debug, Error)]
pub enum CacheError {
    /// The store could not be reached or the connection broke.
    #[error("cache store unreachable: {0}")]
    Io(#[from] io::Error),

    /// The store did not answer in time.
    #[error("cache store timed out")]
    Timeout,

    /// The store answered with something unexpected.
    #[error("unexpected reply from cache store: {0:?}")]
    Protocol(String),
}

/// A string key/value store.
#[async_trait]
pub trait CacheStore: Send + Sync + fmt::Debug {
    /// Looks up `key`.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Cache key for a rendered page: the file path, unchanged, followed by the canonical view
/// options with whitespace removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// The key for `path` rendered with `options`.
    pub fn new(path: &Path, options: &ViewOptions) -> CacheKey {
        let options = options
            .to_string()
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();

        CacheKey(format!("{}{}", path.display(), options))
    }

    /// The key as sent to the store.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the key can be sent to a memcached-style store, which splits commands on
    /// whitespace.
    fn is_storable(&self) -> bool {
        !self.0.is_empty()
            && self.0.len() <= MAX_KEY_LEN
            && !self.0.chars().any(|c| c.is_control() || c.is_whitespace())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendered-page cache with an optional backing store.
#[derive(Debug, Clone, Default)]
pub struct RenderCache {
    store: Option<Arc<dyn CacheStore>>,
}

impl RenderCache {
    /// A cache backed by `store`.
    pub fn new<S>(store: S) -> RenderCache
    where
        S: CacheStore + 'static,
    {
        RenderCache {
            store: Some(Arc::new(store)),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> RenderCache {
        RenderCache { store: None }
    }

    /// Whether a store is configured.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Returns the cached page for `key`, if there is one and the store is reachable.
    pub async fn get(&self, key: &CacheKey) -> Option<String> {
        let store = self.store.as_ref()?;

        if !key.is_storable() {
            debug!("cache key not storable: {}", key);
            return None;
        }

        match store.get(key.as_str()).await {
            Ok(Some(html)) => {
                debug!("cache hit: {}", key);
                Some(html)
            }
            Ok(None) => {
                debug!("cache miss: {}", key);
                None
            }
            Err(e) => {
                warn!("cache lookup failed, rendering without cache: {}", e);
                None
            }
        }
    }

    /// Stores `html` under `key`. Failures are logged and otherwise ignored.
    pub async fn set(&self, key: &CacheKey, html: &str) {
        let store = match &self.store {
            Some(store) => store,
            None => return,
        };

        if !key.is_storable() {
            return;
        }

        if let Err(e) = store.set(key.as_str(), html).await {
            warn!("could not cache {}: {}", key, e);
        }
    }
}

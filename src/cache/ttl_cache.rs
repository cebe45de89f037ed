use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::error::Result;

/// Single-value cache with a time-to-live.
///
/// Holds the last loaded value for `ttl`; after that the next read reloads.
/// Owners must call [`TtlCache::invalidate`] after every write to the
/// underlying data so readers never see a value older than the last mutation.
pub struct TtlCache<T> {
    ttl: Duration,
    inner: Mutex<Option<Entry<T>>>,
}

struct Entry<T> {
    loaded_at: Instant,
    value: Arc<T>,
}

impl<T> TtlCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the cached value, or load and cache a fresh one when the cache
    /// is cold or expired. Load errors are returned and leave the cache cold.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = guard.as_ref() {
            if entry.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&entry.value));
            }
        }

        let value = Arc::new(load()?);
        *guard = Some(Entry {
            loaded_at: Instant::now(),
            value: Arc::clone(&value),
        });
        log::debug!("Registry cache refreshed");
        Ok(value)
    }

    /// Drop the cached value.
    pub fn invalidate(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// True when a value is cached and still fresh.
    pub fn is_warm(&self) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map_or(false, |entry| entry.loaded_at.elapsed() < self.ttl)
    }
}

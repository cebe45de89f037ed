//! Recent search queries, most recent first.

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::db::KvBackend;
use crate::error::{LexgraphError, Result};
use crate::store::{keys, Store};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHistoryItem {
    pub word: String,
    pub timestamp: DateTime<Utc>,
}

/// Bounded search history persisted next to the working set.
///
/// Held as an LRU keyed by query: recording a query again moves it to the
/// front, and the oldest entry falls off once `max_items` is reached.
pub struct SearchHistory {
    capacity: NonZeroUsize,
}

impl SearchHistory {
    pub fn new(max_items: usize) -> Result<Self> {
        let capacity = NonZeroUsize::new(max_items)
            .ok_or_else(|| LexgraphError::Config("history.max_items must be greater than 0".to_string()))?;
        Ok(Self { capacity })
    }

    pub fn max_items(&self) -> usize {
        self.capacity.get()
    }

    fn load<B: KvBackend>(&self, store: &Store<B>) -> Result<LruCache<String, DateTime<Utc>>> {
        // An unreadable history is not worth failing a search over.
        let items: Vec<SearchHistoryItem> = match store.load_value(keys::SEARCH_HISTORY) {
            Ok(items) => items.unwrap_or_default(),
            Err(LexgraphError::CorruptState { source, .. }) => {
                log::warn!("Discarding unreadable search history: {}", source);
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let mut cache = LruCache::new(self.capacity);
        for item in items.into_iter().rev() {
            cache.put(item.word, item.timestamp);
        }
        Ok(cache)
    }

    fn save<B: KvBackend>(&self, store: &Store<B>, cache: &LruCache<String, DateTime<Utc>>) -> Result<()> {
        let items: Vec<SearchHistoryItem> = cache
            .iter()
            .map(|(word, timestamp)| SearchHistoryItem {
                word: word.clone(),
                timestamp: *timestamp,
            })
            .collect();
        store.save_value(keys::SEARCH_HISTORY, &items)
    }

    /// Entries, most recent first.
    pub fn entries<B: KvBackend>(&self, store: &Store<B>) -> Result<Vec<SearchHistoryItem>> {
        Ok(self
            .load(store)?
            .iter()
            .map(|(word, timestamp)| SearchHistoryItem {
                word: word.clone(),
                timestamp: *timestamp,
            })
            .collect())
    }

    /// Record a query. Empty and wildcard queries are ignored.
    pub fn record<B: KvBackend>(&self, store: &Store<B>, query: &str) -> Result<bool> {
        let word = query.trim();
        if word.is_empty() || word == "*" {
            return Ok(false);
        }
        let mut cache = self.load(store)?;
        cache.put(word.to_string(), Utc::now());
        self.save(store, &cache)?;
        Ok(true)
    }

    pub fn remove<B: KvBackend>(&self, store: &Store<B>, word: &str) -> Result<bool> {
        let mut cache = self.load(store)?;
        if cache.pop(word).is_none() {
            return Ok(false);
        }
        self.save(store, &cache)?;
        Ok(true)
    }

    pub fn clear<B: KvBackend>(&self, store: &Store<B>) -> Result<()> {
        store.remove_value(keys::SEARCH_HISTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKv;

    fn words(history: &SearchHistory, store: &Store<MemoryKv>) -> Vec<String> {
        history.entries(store).unwrap().into_iter().map(|i| i.word).collect()
    }

    #[test]
    fn test_most_recent_first_with_moves() {
        let store = Store::new(MemoryKv::new());
        let history = SearchHistory::new(10).unwrap();
        for q in ["dog", "cat", " bird "] {
            assert!(history.record(&store, q).unwrap());
        }
        history.record(&store, "dog").unwrap();
        assert_eq!(words(&history, &store), vec!["dog", "bird", "cat"]);
    }

    #[test]
    fn test_empty_and_wildcard_not_recorded() {
        let store = Store::new(MemoryKv::new());
        let history = SearchHistory::new(10).unwrap();
        assert!(!history.record(&store, "").unwrap());
        assert!(!history.record(&store, "   ").unwrap());
        assert!(!history.record(&store, "*").unwrap());
        assert!(history.entries(&store).unwrap().is_empty());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let store = Store::new(MemoryKv::new());
        let history = SearchHistory::new(3).unwrap();
        for q in ["a", "b", "c", "d"] {
            history.record(&store, q).unwrap();
        }
        assert_eq!(words(&history, &store), vec!["d", "c", "b"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let store = Store::new(MemoryKv::new());
        let history = SearchHistory::new(10).unwrap();
        history.record(&store, "dog").unwrap();
        history.record(&store, "cat").unwrap();
        assert!(history.remove(&store, "dog").unwrap());
        assert!(!history.remove(&store, "dog").unwrap());
        assert_eq!(words(&history, &store), vec!["cat"]);
        history.clear(&store).unwrap();
        assert!(history.entries(&store).unwrap().is_empty());
    }

    #[test]
    fn test_unreadable_history_is_discarded() {
        let store = Store::new(MemoryKv::new());
        store.backend().set(keys::SEARCH_HISTORY, b"not json").unwrap();
        let history = SearchHistory::new(10).unwrap();
        assert!(history.entries(&store).unwrap().is_empty());
        history.record(&store, "dog").unwrap();
        assert_eq!(words(&history, &store), vec!["dog"]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(SearchHistory::new(0).is_err());
    }
}

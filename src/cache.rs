//! Time-bounded memoization for analyzer lookups
//!
//! In-process replacement for the Redis layer the data services use:
//! same get/set-with-TTL contract, lazy expiry on read. Key
//! cardinality is a handful of logical subjects per analyzer, so
//! unbounded growth is a non-issue for a single-process lifetime.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Keyed store of values with explicit expiry
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: HashMap<String, (V, Instant)>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Cached value if present and not yet expired
    pub fn get(&self, key: &str) -> Option<V> {
        match self.entries.get(key) {
            Some((value, expiry)) if Instant::now() < *expiry => Some(value.clone()),
            _ => None,
        }
    }

    /// Store a value, overwriting any prior entry for the key
    pub fn put(&mut self, key: &str, value: V, ttl: Duration) {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

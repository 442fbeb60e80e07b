//! Bounded cache of decoded Level III products.

use chrono::{DateTime, Utc};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use wsr88d::Level3File;

/// Level III products keyed by (product code, volume scan time). The least
/// recently used product is evicted when the cache is full.
#[derive(Debug)]
pub struct Level3Cache {
    products: LruCache<(i16, DateTime<Utc>), Arc<Level3File>>,
}

impl Level3Cache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            products: LruCache::new(capacity),
        }
    }

    /// Insert a product; returns true when another product was evicted.
    pub fn insert(&mut self, time: DateTime<Utc>, file: Arc<Level3File>) -> bool {
        let key = (file.product_code(), time);
        match self.products.push(key, file) {
            Some((evicted, _)) => evicted != key,
            None => false,
        }
    }

    /// Latest `product_code` product at or before `time` (the latest overall
    /// when `time` is `None`).
    pub fn find(
        &mut self,
        product_code: i16,
        time: Option<DateTime<Utc>>,
    ) -> Option<(DateTime<Utc>, Arc<Level3File>)> {
        let key = self
            .products
            .iter()
            .map(|(key, _)| *key)
            .filter(|(code, t)| *code == product_code && time.map_or(true, |limit| *t <= limit))
            .max_by_key(|(_, t)| *t)?;
        self.products.get(&key).map(|file| (key.1, Arc::clone(file)))
    }

    /// Distinct cached product codes, sorted.
    pub fn product_codes(&self) -> Vec<i16> {
        let mut codes: Vec<i16> = self.products.iter().map(|((code, _), _)| *code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn clear(&mut self) {
        self.products.clear();
    }
}

use serde::Serialize;

/// Counters for one cache. Snapshots always satisfy
/// `requests == hits + misses`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub requests: u64,
    pub hits: u64,
    pub misses: u64,
}

impl CacheMetrics {
    pub(crate) fn record_hit(&mut self) {
        self.requests += 1;
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.requests += 1;
        self.misses += 1;
    }

    /// Fraction of requests served from the cache, `0.0` before any request.
    pub fn hit_ratio(&self) -> f64 {
        if self.requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.requests as f64
        }
    }
}

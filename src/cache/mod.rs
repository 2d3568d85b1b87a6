//! # Plan cache
//!
//! A thread-safe map from fingerprint text to [`PlanRecord`]. The planner
//! keeps two of them, one for whole statements and one for leaf
//! subqueries.
//!
//! All state (entries, in-flight keys and counters) lives under a single
//! `parking_lot::Mutex`, so a metrics snapshot can never observe a request
//! without its hit or miss. Plan generation runs outside the lock;
//! [`PlanCache::get_or_generate`] makes concurrent callers on the same key
//! wait for the first one instead of generating twice.

pub mod metrics;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::config::CacheConfig;
use crate::plan::PlanRecord;

pub use metrics::CacheMetrics;

/// How a [`PlanCache::get_or_generate`] call was served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(Arc<PlanRecord>),
    Generated(Arc<PlanRecord>),
}

impl Lookup {
    pub fn record(&self) -> &Arc<PlanRecord> {
        match self {
            Lookup::Hit(record) | Lookup::Generated(record) => record,
        }
    }

    pub fn into_record(self) -> Arc<PlanRecord> {
        match self {
            Lookup::Hit(record) | Lookup::Generated(record) => record,
        }
    }

    pub fn is_hit(&self) -> bool {
        matches!(self, Lookup::Hit(_))
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Arc<PlanRecord>>,
    in_flight: HashSet<String>,
    metrics: CacheMetrics,
}

pub struct PlanCache {
    label: &'static str,
    config: CacheConfig,
    state: Mutex<CacheState>,
    /// Signalled whenever an in-flight key completes or fails.
    settled: Condvar,
}

impl PlanCache {
    pub fn new(config: CacheConfig) -> Self {
        PlanCache {
            label: "plan",
            config,
            state: Mutex::new(CacheState::default()),
            settled: Condvar::new(),
        }
    }

    /// Name used in log events, e.g. `"query"` or `"subquery"`.
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    /// Counted lookup. Always a miss when caching is disabled.
    pub fn lookup(&self, key: &str) -> Option<Arc<PlanRecord>> {
        let mut state = self.state.lock();
        let found = if self.config.enabled {
            state.entries.get(key).cloned()
        } else {
            None
        };
        match found {
            Some(record) => {
                state.metrics.record_hit();
                debug!(cache = self.label, key, "cache hit");
                Some(record)
            }
            None => {
                state.metrics.record_miss();
                debug!(cache = self.label, key, "cache miss");
                None
            }
        }
    }

    /// Insert or replace the record for `key`. Last write wins.
    pub fn store(&self, key: impl Into<String>, record: PlanRecord) -> Arc<PlanRecord> {
        let record = Arc::new(record);
        self.state.lock().entries.insert(key.into(), Arc::clone(&record));
        record
    }

    /// Return the cached record for `key`, or generate, store and return
    /// one. Counts exactly one request per call.
    ///
    /// Only one caller generates a given key at a time; others block until
    /// it finishes and then count as hits. If `generate` fails (or panics)
    /// nothing is stored and one of the waiters takes over.
    pub fn get_or_generate<E, F>(&self, key: &str, generate: F) -> Result<Lookup, E>
    where
        F: FnOnce(&str) -> Result<PlanRecord, E>,
    {
        let mut state = self.state.lock();
        if self.config.enabled {
            loop {
                if let Some(record) = state.entries.get(key) {
                    let record = Arc::clone(record);
                    state.metrics.record_hit();
                    debug!(cache = self.label, key, "cache hit");
                    return Ok(Lookup::Hit(record));
                }
                if !state.in_flight.contains(key) {
                    break;
                }
                self.settled.wait(&mut state);
            }
        }
        state.metrics.record_miss();
        state.in_flight.insert(key.to_string());
        drop(state);
        debug!(cache = self.label, key, "cache miss");

        let guard = InFlight {
            cache: self,
            key,
            done: false,
        };
        let record = Arc::new(generate(key)?);
        guard.complete(Arc::clone(&record));
        Ok(Lookup::Generated(record))
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.state.lock().metrics
    }

    /// Whether `key` has a stored record. Not counted as a request.
    pub fn contains(&self, key: &str) -> bool {
        self.state.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Clears a key's in-flight mark when generation ends, however it ends.
struct InFlight<'a> {
    cache: &'a PlanCache,
    key: &'a str,
    done: bool,
}

impl InFlight<'_> {
    fn complete(mut self, record: Arc<PlanRecord>) {
        {
            let mut state = self.cache.state.lock();
            state.entries.insert(self.key.to_string(), record);
            state.in_flight.remove(self.key);
        }
        self.done = true;
        self.cache.settled.notify_all();
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        self.cache.state.lock().in_flight.remove(self.key);
        self.cache.settled.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShapeError;
    use crate::plan::PlanType;
    use std::collections::BTreeSet;
    use std::panic::{self, AssertUnwindSafe};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    fn record(id: &str) -> PlanRecord {
        PlanRecord {
            plan_id: id.to_string(),
            plan_type: PlanType::FullTableScan,
            tables: BTreeSet::from(["t".to_string()]),
        }
    }

    fn enabled() -> PlanCache {
        PlanCache::new(CacheConfig::default())
    }

    fn disabled() -> PlanCache {
        PlanCache::new(CacheConfig { enabled: false })
    }

    #[test]
    fn lookup_counts_hits_and_misses() {
        let cache = enabled();
        assert!(cache.lookup("k").is_none());
        cache.store("k", record("PLN_1"));
        assert_eq!(cache.lookup("k").unwrap().plan_id, "PLN_1");
        assert_eq!(cache.metrics(), CacheMetrics { requests: 2, hits: 1, misses: 1 });
    }

    #[test]
    fn store_overwrites() {
        let cache = enabled();
        cache.store("k", record("PLN_1"));
        cache.store("k", record("PLN_2"));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.lookup("k").unwrap().plan_id, "PLN_2");
    }

    #[test]
    fn contains_has_no_metric_side_effects() {
        let cache = enabled();
        assert!(cache.is_empty());
        cache.store("k", record("PLN_1"));
        assert!(cache.contains("k"));
        assert!(!cache.contains("other"));
        assert_eq!(cache.metrics(), CacheMetrics::default());
    }

    #[test]
    fn get_or_generate_generates_once() {
        let cache = enabled();
        let calls = AtomicUsize::new(0);
        let generate = |_: &str| -> Result<PlanRecord, ShapeError> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(record("PLN_1"))
        };
        assert!(!cache.get_or_generate("k", generate).unwrap().is_hit());
        assert!(cache.get_or_generate("k", generate).unwrap().is_hit());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.metrics(), CacheMetrics { requests: 2, hits: 1, misses: 1 });
    }

    #[test]
    fn disabled_cache_always_misses() {
        let cache = disabled();
        cache.store("k", record("PLN_1"));
        assert!(cache.lookup("k").is_none());
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let lookup = cache
                .get_or_generate("k", |_| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ShapeError>(record("PLN_2"))
                })
                .unwrap();
            assert!(!lookup.is_hit());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.metrics(), CacheMetrics { requests: 4, hits: 0, misses: 4 });
        assert!(cache.contains("k"));
    }

    #[test]
    fn failed_generation_stores_nothing() {
        let cache = enabled();
        let err = cache
            .get_or_generate("k", |_| Err(ShapeError::plan_generation("down")))
            .unwrap_err();
        assert!(matches!(err, ShapeError::PlanGeneration(_)));
        assert!(!cache.contains("k"));

        let retry = cache
            .get_or_generate("k", |_| Ok::<_, ShapeError>(record("PLN_1")))
            .unwrap();
        assert!(!retry.is_hit());
        assert_eq!(cache.metrics(), CacheMetrics { requests: 2, hits: 0, misses: 2 });
    }

    #[test]
    fn panicking_generator_releases_the_key() {
        let cache = enabled();
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = cache.get_or_generate("k", |_| -> Result<PlanRecord, ShapeError> {
                panic!("generator crashed")
            });
        }));
        assert!(result.is_err());
        let lookup = cache
            .get_or_generate("k", |_| Ok::<_, ShapeError>(record("PLN_1")))
            .unwrap();
        assert!(!lookup.is_hit());
    }

    #[test]
    fn concurrent_misses_generate_once() {
        const THREADS: usize = 8;
        let cache = enabled();
        let calls = AtomicUsize::new(0);
        let barrier = Barrier::new(THREADS);

        let hits: usize = thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        let lookup = cache
                            .get_or_generate("k", |_| {
                                calls.fetch_add(1, Ordering::SeqCst);
                                thread::sleep(Duration::from_millis(20));
                                Ok::<_, ShapeError>(record("PLN_1"))
                            })
                            .unwrap();
                        assert_eq!(lookup.record().plan_id, "PLN_1");
                        usize::from(lookup.is_hit())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(hits, THREADS - 1);
        let metrics = cache.metrics();
        assert_eq!(metrics.requests, THREADS as u64);
        assert_eq!(metrics.misses, 1);
    }
}

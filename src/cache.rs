/*!
 * Memoized scope summaries
 *
 * At most one computation runs per key. A key names the scope, the quarter
 * pair, the dataset build and the summary-affecting configuration, so engines
 * over different datasets or settings can share one cache. A request for a
 * key whose computation is in flight waits on that key's slot and then reads
 * the stored result.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::data_types::{QuarterPair, Scope};
use crate::normalize::resolve_identifier;
use crate::summary::{ScopeSummary, WrappedEngine};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub scope: Scope,
    pub quarters: QuarterPair,
    /// [`WrappedDataset::id`](crate::dataset::WrappedDataset::id)
    pub dataset: u64,
    /// [`WrappedConfig::fingerprint`](crate::config::WrappedConfig::fingerprint)
    pub config: u64,
}

impl CacheKey {
    pub fn new(engine: &WrappedEngine<'_>, scope: Scope) -> Self {
        let dataset = engine.dataset();
        Self {
            scope,
            quarters: dataset.quarters,
            dataset: dataset.id(),
            config: engine.config().fingerprint(),
        }
    }
}

type Slot = Arc<Mutex<Option<Arc<ScopeSummary>>>>;

/// Single-flight summary cache
#[derive(Debug, Default)]
pub struct SummaryCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    computations: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SummaryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached summary of `scope`, computing it with `engine` on a miss
    ///
    /// Failures are returned to the caller holding the slot and the slot is
    /// dropped, so a later request computes again.
    pub fn get_or_compute(&self, engine: &WrappedEngine<'_>, scope: Scope) -> Result<Arc<ScopeSummary>> {
        let key = CacheKey::new(engine, scope);
        let slot = {
            let mut slots = lock(&self.slots);
            Arc::clone(slots.entry(key).or_default())
        };

        // Holding the slot lock across the computation is what makes it single-flight
        let mut entry = lock(&slot);
        if let Some(summary) = entry.as_ref() {
            tracing::trace!(scope = %scope, "summary cache hit");
            return Ok(Arc::clone(summary));
        }

        self.computations.fetch_add(1, Ordering::SeqCst);
        match engine.summarize_scope(scope) {
            Ok(summary) => {
                let summary = Arc::new(summary);
                *entry = Some(Arc::clone(&summary));
                Ok(summary)
            }
            Err(err) => {
                drop(entry);
                let mut slots = lock(&self.slots);
                // waiters may have installed a fresh slot meanwhile
                if slots.get(&key).is_some_and(|current| Arc::ptr_eq(current, &slot)) {
                    slots.remove(&key);
                }
                Err(err)
            }
        }
    }

    /// Resolve `identifier` and return its cached summary
    pub fn summarize(&self, engine: &WrappedEngine<'_>, identifier: &str) -> Result<Arc<ScopeSummary>> {
        self.get_or_compute(engine, resolve_identifier(identifier)?)
    }

    /// Completed summary `engine` would return for `scope`, without computing
    pub fn get(&self, engine: &WrappedEngine<'_>, scope: Scope) -> Option<Arc<ScopeSummary>> {
        let slot = lock(&self.slots).get(&CacheKey::new(engine, scope)).cloned()?;
        let entry = lock(&slot);
        entry.as_ref().map(Arc::clone)
    }

    /// Number of computations started since creation
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    /// Number of keys with a slot, in flight or completed
    pub fn len(&self) -> usize {
        lock(&self.slots).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        lock(&self.slots).clear();
    }
}

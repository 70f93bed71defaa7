use std::collections::HashMap;
use std::sync::Mutex;

use chrono::NaiveDate;

use crate::indicators::Fips;
use crate::stress::CompositeStressResult;

/// Cache key for one county and request window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StressCacheKey {
    pub fips: Fips,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

/// Optional memo of composite results owned by the caller. Entries belong to
/// one indicator store generation and are dropped when the generation moves.
pub trait StressCache: Send + Sync {
    fn generation(&self) -> u64;
    fn get(&self, key: &StressCacheKey) -> Option<CompositeStressResult>;
    /// Ignored unless `generation` matches the cache's current generation.
    fn put(&self, key: StressCacheKey, generation: u64, result: CompositeStressResult);
    /// Drop every entry and start accepting results for `generation`.
    /// Generations only move forward; an older value is ignored.
    fn invalidate(&self, generation: u64);
}

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    entries: HashMap<StressCacheKey, CompositeStressResult>,
}

#[derive(Debug, Default)]
pub struct InMemoryStressCache {
    state: Mutex<CacheState>,
}

impl InMemoryStressCache {
    pub fn len(&self) -> usize {
        self.state.lock().map(|state| state.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StressCache for InMemoryStressCache {
    fn generation(&self) -> u64 {
        self.state.lock().map(|state| state.generation).unwrap_or(0)
    }

    fn get(&self, key: &StressCacheKey) -> Option<CompositeStressResult> {
        self.state.lock().ok()?.entries.get(key).cloned()
    }

    fn put(&self, key: StressCacheKey, generation: u64, result: CompositeStressResult) {
        if let Ok(mut state) = self.state.lock() {
            if state.generation == generation {
                state.entries.insert(key, result);
            }
        }
    }

    fn invalidate(&self, generation: u64) {
        if let Ok(mut state) = self.state.lock() {
            if generation > state.generation {
                state.entries.clear();
                state.generation = generation;
            }
        }
    }
}

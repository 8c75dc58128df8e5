//! # Keyed Barrier Dispenser
//!
//! Process-wide registry mapping keys to barrier instances, created on first
//! request. Consumers bracket their lifetime with [`start_use`] /
//! [`finish_use`]; when the last active consumer finishes, unreferenced
//! barriers are purged so the map only ever holds keys touched by scopes that
//! are still open.
//!
//! Per-key lookups go through a sharded [`DashMap`] and never contend with the
//! dispenser-wide lock. The lock guards only the active-scope counter and the
//! purge, so a new scope cannot register while a purge is in progress.
//!
//! [`start_use`]: KeyedBarrierDispenser::start_use
//! [`finish_use`]: KeyedBarrierDispenser::finish_use

use crate::barrier::{Barrier, CountingBarrier};
use crate::config::BarrierConfig;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, warn};

/// Value-typed identifier of one keyed critical section.
///
/// Implemented for every type with the required bounds, e.g. `u64`,
/// `String`, or a tuple of IDs.
pub trait BarrierKey: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

impl<T> BarrierKey for T where T: Eq + Hash + Clone + fmt::Debug + Send + Sync + 'static {}

pub struct KeyedBarrierDispenser<K: BarrierKey, B: Barrier = CountingBarrier> {
    barriers: DashMap<K, Arc<B>>,
    active_scopes: Mutex<usize>,
    config: BarrierConfig,
}

impl<K: BarrierKey, B: Barrier> KeyedBarrierDispenser<K, B> {
    pub fn new() -> Self {
        Self::with_config(BarrierConfig::default())
    }

    pub fn with_config(config: BarrierConfig) -> Self {
        Self {
            barriers: DashMap::new(),
            active_scopes: Mutex::new(0),
            config,
        }
    }

    pub fn config(&self) -> &BarrierConfig {
        &self.config
    }

    /// Returns the barrier for `key`, installing one built by `factory` if
    /// absent. Concurrent callers with the same key all observe the single
    /// installed instance.
    pub fn get_or_add<F>(&self, key: K, factory: F) -> Arc<B>
    where
        F: FnOnce() -> B,
    {
        let entry = self
            .barriers
            .entry(key)
            .or_insert_with(|| Arc::new(factory()));
        Arc::clone(entry.value())
    }

    pub fn try_get(&self, key: &K) -> Option<Arc<B>> {
        self.barriers.get(key).map(|entry| Arc::clone(entry.value()))
    }

    /// Registers one active consumer scope.
    pub fn start_use(&self) {
        let mut active = self.active_scopes.lock();
        *active += 1;
    }

    /// Deregisters one active consumer scope, purging when none remain.
    pub fn finish_use(&self) {
        let mut active = self.active_scopes.lock();

        if *active == 0 {
            warn!("finish_use called with no active scopes");
        }
        *active = active.saturating_sub(1);

        if *active == 0 && self.config.purge_when_idle {
            let purged = self.purge_unreferenced();
            if purged > 0 {
                debug!(purged, remaining = self.barriers.len(), "purged idle barriers");
            }
        }
    }

    /// Drops every entry whose barrier is referenced only by the map.
    ///
    /// A barrier still referenced elsewhere stays, so a later `get_or_add`
    /// for its key cannot mint a second instance alongside it.
    fn purge_unreferenced(&self) -> usize {
        let mut purged = 0;
        self.barriers.retain(|_, barrier| {
            let referenced = Arc::strong_count(barrier) > 1;
            if !referenced {
                purged += 1;
            }
            referenced
        });
        purged
    }

    pub fn active_scopes(&self) -> usize {
        *self.active_scopes.lock()
    }

    /// Number of keys currently holding a barrier instance.
    pub fn len(&self) -> usize {
        self.barriers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barriers.is_empty()
    }

    /// Advisory: whether the barrier for `key` exists and is held.
    pub fn is_in_use(&self, key: &K) -> bool {
        self.barriers
            .get(key)
            .is_some_and(|entry| entry.value().in_use())
    }
}

impl<K: BarrierKey, B: Barrier> Default for KeyedBarrierDispenser<K, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: BarrierKey, B: Barrier> fmt::Debug for KeyedBarrierDispenser<K, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedBarrierDispenser")
            .field("keys", &self.barriers.len())
            .field("active_scopes", &self.active_scopes())
            .field("config", &self.config)
            .finish()
    }
}

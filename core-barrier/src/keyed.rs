//! # Keyed Scope Guard
//!
//! [`KeyedScopedGuard`] is the per-scope façade over a shared
//! [`KeyedBarrierDispenser`]. It registers with the dispenser when created,
//! tracks every key this scope has entered, and on teardown releases them all
//! before deregistering, which may let the dispenser purge.
//!
//! The typical use is provisioning against one of several equivalent
//! resources: try the candidates in turn and take the first one that admits
//! entry within a short timeout instead of blocking on a single key.
//!
//! ```
//! use core_barrier::{KeyedBarrierDispenser, KeyedScopedGuard};
//! use core_async::time::Duration;
//! use std::sync::Arc;
//!
//! # core_async::runtime::block_on(async {
//! let dispenser = Arc::new(KeyedBarrierDispenser::<&'static str>::new());
//!
//! let mut busy = KeyedScopedGuard::new(Arc::clone(&dispenser));
//! assert!(busy.try_enter("bin-a", Duration::ZERO).await);
//!
//! let mut scope = KeyedScopedGuard::new(Arc::clone(&dispenser));
//! let taken = scope
//!     .try_enter_any(["bin-a", "bin-b", "bin-c"], Duration::from_millis(10))
//!     .await;
//! assert_eq!(taken, Some("bin-b"));
//! # });
//! ```

use crate::barrier::{Barrier, CountingBarrier, EnterOutcome};
use crate::dispenser::{BarrierKey, KeyedBarrierDispenser};
use crate::error::{BarrierError, Result};
use core_async::sync::CancellationToken;
use core_async::time::{self, Duration, Instant};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Per-scope handle over a shared keyed dispenser.
///
/// Teardown runs from [`dispose`](KeyedScopedGuard::dispose) or `Drop`,
/// whichever comes first; the second is a no-op.
pub struct KeyedScopedGuard<K: BarrierKey, B: Barrier = CountingBarrier> {
    dispenser: Arc<KeyedBarrierDispenser<K, B>>,
    // The exact instance entered per key, so release never depends on the
    // dispenser still mapping the key to it.
    entered: HashMap<K, Arc<B>>,
    disposed: bool,
}

impl<K: BarrierKey, B: Barrier> KeyedScopedGuard<K, B> {
    /// Creates the guard and registers one active scope with `dispenser`.
    pub fn new(dispenser: Arc<KeyedBarrierDispenser<K, B>>) -> Self {
        dispenser.start_use();
        Self {
            dispenser,
            entered: HashMap::new(),
            disposed: false,
        }
    }

    pub fn dispenser(&self) -> &Arc<KeyedBarrierDispenser<K, B>> {
        &self.dispenser
    }

    /// Releases `key` early if this scope holds it; otherwise a no-op.
    pub fn try_leave(&mut self, key: &K) {
        if let Some(barrier) = self.entered.remove(key) {
            barrier.leave();
            trace!(?key, "keyed barrier released");
        }
    }

    /// Advisory: `true` if this scope holds `key` or its barrier looks free.
    pub fn is_enterable(&self, key: &K) -> bool {
        if self.disposed {
            return false;
        }
        self.entered.contains_key(key) || !self.dispenser.is_in_use(key)
    }

    pub fn is_entered(&self, key: &K) -> bool {
        self.entered.contains_key(key)
    }

    pub fn entered_keys(&self) -> impl Iterator<Item = &K> {
        self.entered.keys()
    }

    pub fn entered_count(&self) -> usize {
        self.entered.len()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Scope teardown hook: releases every held key, then deregisters from
    /// the dispenser.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        let released = self.entered.len();
        // Handles are dropped here so the dispenser sees them as unreferenced.
        for (key, barrier) in self.entered.drain() {
            barrier.leave();
            trace!(?key, "keyed barrier released on teardown");
        }

        self.dispenser.finish_use();
        debug!(released, "keyed scope torn down");
    }
}

impl<K: BarrierKey, B: Barrier + Default> KeyedScopedGuard<K, B> {
    /// Tries to enter the barrier for `key` within `timeout`.
    ///
    /// Returns `true` immediately if this scope already holds `key`, and
    /// `false` after teardown.
    pub async fn try_enter(&mut self, key: K, timeout: Duration) -> bool {
        self.attempt(key, timeout, None).await.is_ok()
    }

    /// [`try_enter`](Self::try_enter) with the dispenser's default timeout.
    pub async fn try_enter_default(&mut self, key: K) -> bool {
        let timeout = self.dispenser.config().default_enter_timeout();
        self.try_enter(key, timeout).await
    }

    /// Tries to enter `key`, giving up early when `cancel` fires.
    ///
    /// A disposed guard reports [`EnterOutcome::Cancelled`].
    pub async fn try_enter_until(
        &mut self,
        key: K,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> EnterOutcome {
        match self.attempt(key, timeout, Some(cancel)).await {
            Ok(()) => EnterOutcome::Entered,
            Err(BarrierError::Timeout { .. }) => EnterOutcome::TimedOut,
            Err(_) => EnterOutcome::Cancelled,
        }
    }

    /// Like [`try_enter`](Self::try_enter) but reports why entry failed.
    pub async fn enter(&mut self, key: K, timeout: Duration) -> Result<()> {
        self.attempt(key, timeout, None).await
    }

    pub async fn enter_until(
        &mut self,
        key: K,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.attempt(key, timeout, Some(cancel)).await
    }

    /// Tries each key in order with `timeout_per_key` and returns the first
    /// one entered, skipping keys that deny entry.
    pub async fn try_enter_any<I>(&mut self, keys: I, timeout_per_key: Duration) -> Option<K>
    where
        I: IntoIterator<Item = K>,
    {
        for key in keys {
            if self.try_enter(key.clone(), timeout_per_key).await {
                return Some(key);
            }
            if self.disposed {
                return None;
            }
            debug!(?key, "key denied entry, trying next");
        }
        None
    }

    async fn attempt(
        &mut self,
        key: K,
        timeout: Duration,
        cancel: Option<CancellationToken>,
    ) -> Result<()> {
        if self.disposed {
            debug!(?key, "entry attempted on a disposed keyed guard");
            return Err(BarrierError::Disposed);
        }
        if self.entered.contains_key(&key) {
            return Ok(());
        }

        let barrier = self.dispenser.get_or_add(key.clone(), B::default);
        let started = Instant::now();
        let outcome = match cancel {
            Some(token) => barrier.enter_until(timeout, token).await,
            None => {
                if barrier.enter(timeout).await {
                    EnterOutcome::Entered
                } else {
                    EnterOutcome::TimedOut
                }
            }
        };

        match outcome {
            EnterOutcome::Entered => {
                let waited = started.elapsed();
                if self.dispenser.config().is_slow(waited) {
                    warn!(?key, waited_ms = time::as_millis_u64(waited), "slow keyed barrier entry");
                }
                trace!(?key, "keyed barrier entered");
                self.entered.insert(key, barrier);
                Ok(())
            }
            EnterOutcome::TimedOut => Err(BarrierError::Timeout {
                timeout_ms: time::as_millis_u64(timeout),
            }),
            EnterOutcome::Cancelled => Err(BarrierError::Cancelled),
        }
    }
}

impl<K: BarrierKey, B: Barrier> Drop for KeyedScopedGuard<K, B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<K: BarrierKey, B: Barrier> fmt::Debug for KeyedScopedGuard<K, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyedScopedGuard")
            .field("entered", &self.entered.keys().collect::<Vec<_>>())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

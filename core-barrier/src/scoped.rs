//! # Scope-Bound Guard
//!
//! [`ScopedGuard`] ties one barrier to one execution scope (typically one
//! request). It remembers whether *this scope* has entered, which is what
//! makes repeated `try_enter` calls idempotent and lets teardown release the
//! barrier exactly once on every exit path.
//!
//! ```
//! use core_barrier::{CountingBarrier, ScopedGuard};
//! use core_async::time::Duration;
//! use std::sync::Arc;
//!
//! # core_async::runtime::block_on(async {
//! let barrier = Arc::new(CountingBarrier::named("ledger"));
//!
//! {
//!     let mut guard = ScopedGuard::new(Arc::clone(&barrier));
//!     assert!(guard.try_enter(Duration::from_millis(100)).await);
//!     assert!(guard.try_enter(Duration::from_millis(100)).await);
//!     // ... protected work ...
//! } // dropped: released
//!
//! assert!(!core_barrier::Barrier::in_use(&*barrier));
//! # });
//! ```

use crate::barrier::{Barrier, EnterOutcome};
use crate::config::BarrierConfig;
use crate::error::{BarrierError, Result};
use core_async::sync::CancellationToken;
use core_async::time::{self, Duration, Instant};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-scope handle over one shared barrier.
///
/// Teardown runs from [`dispose`](ScopedGuard::dispose) or `Drop`, whichever
/// comes first; the second is a no-op.
pub struct ScopedGuard<B: Barrier + ?Sized> {
    barrier: Arc<B>,
    config: BarrierConfig,
    entered: bool,
    disposed: bool,
}

impl<B: Barrier + ?Sized> ScopedGuard<B> {
    pub fn new(barrier: Arc<B>) -> Self {
        Self::with_config(barrier, BarrierConfig::default())
    }

    pub fn with_config(barrier: Arc<B>, config: BarrierConfig) -> Self {
        Self {
            barrier,
            config,
            entered: false,
            disposed: false,
        }
    }

    pub fn barrier(&self) -> &Arc<B> {
        &self.barrier
    }

    pub fn config(&self) -> &BarrierConfig {
        &self.config
    }

    /// Tries to enter within `timeout`.
    ///
    /// Returns `true` immediately if this scope already entered. Returns
    /// `false` after teardown.
    pub async fn try_enter(&mut self, timeout: Duration) -> bool {
        self.attempt(timeout, None).await.is_ok()
    }

    /// [`try_enter`](Self::try_enter) with the configured default timeout.
    pub async fn try_enter_default(&mut self) -> bool {
        let timeout = self.config.default_enter_timeout();
        self.try_enter(timeout).await
    }

    /// Tries to enter, giving up early when `cancel` fires.
    ///
    /// A disposed guard reports [`EnterOutcome::Cancelled`].
    pub async fn try_enter_until(
        &mut self,
        timeout: Duration,
        cancel: CancellationToken,
    ) -> EnterOutcome {
        match self.attempt(timeout, Some(cancel)).await {
            Ok(()) => EnterOutcome::Entered,
            Err(BarrierError::Timeout { .. }) => EnterOutcome::TimedOut,
            Err(_) => EnterOutcome::Cancelled,
        }
    }

    /// Like [`try_enter`](Self::try_enter) but reports why entry failed.
    pub async fn enter(&mut self, timeout: Duration) -> Result<()> {
        self.attempt(timeout, None).await
    }

    pub async fn enter_until(&mut self, timeout: Duration, cancel: CancellationToken) -> Result<()> {
        self.attempt(timeout, Some(cancel)).await
    }

    async fn attempt(&mut self, timeout: Duration, cancel: Option<CancellationToken>) -> Result<()> {
        if self.disposed {
            debug!("entry attempted on a disposed scoped guard");
            return Err(BarrierError::Disposed);
        }
        if self.entered {
            return Ok(());
        }

        let started = Instant::now();
        let outcome = match cancel {
            Some(token) => self.barrier.enter_until(timeout, token).await,
            None => {
                if self.barrier.enter(timeout).await {
                    EnterOutcome::Entered
                } else {
                    EnterOutcome::TimedOut
                }
            }
        };

        match outcome {
            EnterOutcome::Entered => {
                self.entered = true;
                let waited = started.elapsed();
                if self.config.is_slow(waited) {
                    warn!(waited_ms = time::as_millis_u64(waited), "slow barrier entry");
                }
                Ok(())
            }
            EnterOutcome::TimedOut => Err(BarrierError::Timeout {
                timeout_ms: time::as_millis_u64(timeout),
            }),
            EnterOutcome::Cancelled => Err(BarrierError::Cancelled),
        }
    }

    /// Releases the barrier early if this scope holds it; otherwise a no-op.
    pub fn try_leave(&mut self) {
        if self.entered {
            self.entered = false;
            self.barrier.leave();
        }
    }

    /// Advisory: `true` if this scope holds the barrier or it looks free.
    pub fn is_enterable(&self) -> bool {
        !self.disposed && (self.entered || !self.barrier.in_use())
    }

    pub fn is_entered(&self) -> bool {
        self.entered
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Scope teardown hook. Releases the barrier if still entered.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;

        if self.entered {
            self.entered = false;
            self.barrier.leave();
            debug!("scoped guard released barrier on teardown");
        }
    }
}

impl<B: Barrier + ?Sized> Drop for ScopedGuard<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<B: Barrier + ?Sized> fmt::Debug for ScopedGuard<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedGuard")
            .field("entered", &self.entered)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

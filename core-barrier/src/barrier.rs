//! # Counting Barrier
//!
//! A barrier is a capacity-1 counting primitive whose release is not tied to
//! the thread (or task) that entered it. Under a multi-threaded runtime a task
//! can suspend on one worker and resume on another, so a thread-affine lock
//! released after an `.await` may be released from the "wrong" thread. A
//! semaphore permit carries no such identity: `leave()` is valid from any
//! execution context.
//!
//! The barrier itself has no notion of who entered it. Scope-level ownership
//! ("have *I* entered?") lives in [`ScopedGuard`](crate::ScopedGuard) and
//! [`KeyedScopedGuard`](crate::KeyedScopedGuard).
//!
//! ```
//! use core_barrier::{Barrier, CountingBarrier};
//! use core_async::time::Duration;
//!
//! # core_async::runtime::block_on(async {
//! let barrier = CountingBarrier::named("inventory");
//! assert!(barrier.enter(Duration::from_millis(10)).await);
//! assert!(barrier.in_use());
//! assert!(!barrier.enter(Duration::from_millis(10)).await);
//!
//! barrier.leave();
//! assert!(!barrier.in_use());
//! # });
//! ```

use async_trait::async_trait;
use core_async::sync::{CancellationToken, Semaphore};
use core_async::time::{self, Duration};
use std::borrow::Cow;
use tracing::{error, trace, warn};

/// Result of an entry attempt that may also be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnterOutcome {
    /// The barrier was acquired.
    Entered,
    /// The timeout elapsed before the barrier became free.
    TimedOut,
    /// The cancellation signal fired first.
    Cancelled,
}

impl EnterOutcome {
    pub fn is_entered(self) -> bool {
        matches!(self, EnterOutcome::Entered)
    }
}

/// The enter/leave/in-use capability shared by every barrier type.
///
/// Implementations must allow `leave` from any execution context.
#[async_trait]
pub trait Barrier: Send + Sync + 'static {
    /// Waits up to `timeout` for the barrier. Returns `true` iff acquired.
    ///
    /// A zero timeout makes a single non-blocking attempt.
    async fn enter(&self, timeout: Duration) -> bool;

    /// Like [`enter`](Barrier::enter), but also gives up without acquiring
    /// as soon as `cancel` fires.
    async fn enter_until(&self, timeout: Duration, cancel: CancellationToken) -> EnterOutcome;

    /// Returns the barrier to the free state.
    ///
    /// Must only follow a successful entry; the guards enforce this.
    fn leave(&self);

    /// Advisory snapshot of whether the barrier is currently held.
    ///
    /// The answer may be stale by the time the caller looks at it.
    fn in_use(&self) -> bool;
}

/// Capacity-1 semaphore barrier.
#[derive(Debug)]
pub struct CountingBarrier {
    permits: Semaphore,
    label: Cow<'static, str>,
}

impl CountingBarrier {
    pub fn new() -> Self {
        Self::named("barrier")
    }

    /// Creates a free barrier whose `label` is attached to its log events.
    pub fn named(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            permits: Semaphore::new(1),
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    async fn acquire(&self, timeout: Duration, cancel: Option<&CancellationToken>) -> EnterOutcome {
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            return EnterOutcome::Cancelled;
        }

        if let Ok(permit) = self.permits.try_acquire() {
            permit.forget();
            trace!(barrier = %self.label, "entered without waiting");
            return EnterOutcome::Entered;
        }

        if timeout.is_zero() {
            return EnterOutcome::TimedOut;
        }

        let wait = time::timeout(timeout, self.permits.acquire());
        let acquired = match cancel {
            Some(token) => core_async::select! {
                biased;
                _ = token.cancelled() => None,
                acquired = wait => Some(acquired),
            },
            None => Some(wait.await),
        };

        match acquired {
            Some(Ok(Ok(permit))) => {
                permit.forget();
                trace!(barrier = %self.label, "entered after waiting");
                EnterOutcome::Entered
            }
            Some(Ok(Err(_))) => {
                // The semaphore is never closed, so this is not expected.
                error!(barrier = %self.label, "barrier semaphore closed while waiting");
                EnterOutcome::Cancelled
            }
            Some(Err(_)) => {
                trace!(barrier = %self.label, timeout_ms = %time::as_millis_u64(timeout), "entry timed out");
                EnterOutcome::TimedOut
            }
            None => {
                trace!(barrier = %self.label, "entry cancelled");
                EnterOutcome::Cancelled
            }
        }
    }
}

impl Default for CountingBarrier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Barrier for CountingBarrier {
    async fn enter(&self, timeout: Duration) -> bool {
        self.acquire(timeout, None).await.is_entered()
    }

    async fn enter_until(&self, timeout: Duration, cancel: CancellationToken) -> EnterOutcome {
        self.acquire(timeout, Some(&cancel)).await
    }

    fn leave(&self) {
        if self.permits.available_permits() > 0 {
            warn!(barrier = %self.label, "leave called on a barrier that is not held");
        }
        self.permits.add_permits(1);
        trace!(barrier = %self.label, "left");
    }

    fn in_use(&self) -> bool {
        self.permits.available_permits() == 0
    }
}

/// Declares a nominal barrier type, one per independent critical section.
///
/// The generated type wraps a [`CountingBarrier`] labelled with the type name
/// and implements [`Barrier`] and `Default`, so it can be handed to
/// [`ScopedGuard`](crate::ScopedGuard) or resolved through
/// [`registry::shared_barrier`](crate::registry::shared_barrier).
///
/// ```
/// use core_barrier::{declare_barrier, Barrier};
///
/// declare_barrier! {
///     /// Serialises writes to the pick list.
///     pub PickListBarrier
/// }
///
/// let barrier = PickListBarrier::default();
/// assert!(!barrier.in_use());
/// assert_eq!(barrier.inner().label(), "PickListBarrier");
/// ```
#[macro_export]
macro_rules! declare_barrier {
    ($(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $name($crate::CountingBarrier);

        impl $name {
            pub fn new() -> Self {
                Self($crate::CountingBarrier::named(::core::stringify!($name)))
            }

            pub fn inner(&self) -> &$crate::CountingBarrier {
                &self.0
            }
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        #[$crate::__private::async_trait]
        impl $crate::Barrier for $name {
            async fn enter(&self, timeout: $crate::__private::Duration) -> bool {
                $crate::Barrier::enter(&self.0, timeout).await
            }

            async fn enter_until(
                &self,
                timeout: $crate::__private::Duration,
                cancel: $crate::__private::CancellationToken,
            ) -> $crate::EnterOutcome {
                $crate::Barrier::enter_until(&self.0, timeout, cancel).await
            }

            fn leave(&self) {
                $crate::Barrier::leave(&self.0)
            }

            fn in_use(&self) -> bool {
                $crate::Barrier::in_use(&self.0)
            }
        }
    };
}

//! # Core Barrier
//!
//! Task-safe mutual exclusion for async code whose tasks may resume on a
//! different worker thread after every `.await`.
//!
//! ## Overview
//!
//! - [`CountingBarrier`]: a capacity-1 counting primitive that any execution
//!   context may release. Implements the [`Barrier`] capability.
//! - [`ScopedGuard`]: binds one barrier to one scope; idempotent entry and
//!   exactly-once release on teardown.
//! - [`KeyedBarrierDispenser`]: concurrent key → barrier registry that purges
//!   idle barriers once no scope is using it.
//! - [`KeyedScopedGuard`]: per-scope façade over a dispenser that tracks and
//!   releases every key the scope entered.
//! - [`registry`]: process-wide instances per barrier type or (key, barrier)
//!   type pair.
//!
//! Failing to enter within the time budget is a normal outcome reported as
//! `false` (or [`BarrierError::Timeout`] from the `Result` variants), never a
//! panic.
//!
//! ## Usage
//!
//! ```
//! use core_barrier::{KeyedBarrierDispenser, KeyedScopedGuard};
//! use core_async::time::Duration;
//! use std::sync::Arc;
//!
//! # core_async::runtime::block_on(async {
//! let dispenser = Arc::new(KeyedBarrierDispenser::<u64>::new());
//!
//! let mut scope = KeyedScopedGuard::new(Arc::clone(&dispenser));
//! if scope.try_enter(17, Duration::from_millis(500)).await {
//!     // exclusive access to resource 17
//! }
//! drop(scope);
//!
//! assert!(dispenser.is_empty());
//! # });
//! ```

pub mod barrier;
pub mod config;
pub mod dispenser;
pub mod error;
pub mod keyed;
pub mod registry;
pub mod scoped;

pub use barrier::{Barrier, CountingBarrier, EnterOutcome};
pub use config::BarrierConfig;
pub use core_async::sync::CancellationToken;
pub use dispenser::{BarrierKey, KeyedBarrierDispenser};
pub use error::{BarrierError, Result};
pub use keyed::KeyedScopedGuard;
pub use scoped::ScopedGuard;

#[doc(hidden)]
pub mod __private {
    pub use async_trait::async_trait;
    pub use core_async::sync::CancellationToken;
    pub use core_async::time::Duration;
}

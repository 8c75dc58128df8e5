//! Runtime seam for the barrier workspace.
//!
//! Every other crate in the workspace reaches the async runtime through this
//! crate instead of depending on Tokio directly. Keeping the dependency in one
//! place means the barrier primitives only ever see a small, stable surface:
//!
//! - `runtime`: building runtimes and driving futures to completion
//! - `sync`: the counting semaphore and cancellation token barriers build on
//! - `task`: spawning work onto the runtime
//! - `time`: timeouts, sleeping, and instants
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::Semaphore;
//! use core_async::time::{timeout, Duration};
//!
//! # core_async::runtime::block_on(async {
//! let semaphore = Semaphore::new(1);
//! let permit = timeout(Duration::from_millis(10), semaphore.acquire()).await;
//! assert!(permit.is_ok());
//! # });
//! ```

// Re-export the async entry-point/test macros so downstream crates never need
// direct Tokio dependencies.
pub use core_async_macros::{main, test};

pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

/// Waits on multiple concurrent branches, returning when the first completes.
///
/// Re-exported from Tokio so callers keep depending on `core-async` only.
pub use tokio::select;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};

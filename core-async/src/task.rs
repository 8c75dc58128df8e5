//! Task spawning.
//!
//! Tasks spawned with [`spawn`] may be moved between worker threads at any
//! `.await` when running on a multi-threaded runtime.
//!
//! # Examples
//!
//! ```rust
//! use core_async::task;
//!
//! # core_async::runtime::block_on(async {
//! let handle = task::spawn(async { 42 });
//! assert_eq!(handle.await.unwrap(), 42);
//! # });
//! ```

pub use tokio::task::{spawn_blocking, yield_now, JoinError, JoinHandle};

/// Spawns a new asynchronous task on the current runtime.
///
/// # Panics
///
/// Panics when called outside of a runtime context.
pub fn spawn<F>(future: F) -> JoinHandle<F::Output>
where
    F: std::future::Future + Send + 'static,
    F::Output: Send + 'static,
{
    tokio::task::spawn(future)
}

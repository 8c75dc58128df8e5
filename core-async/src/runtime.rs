//! Runtime utilities that abstract over the underlying async executor.
//!
//! Tests and binaries drive their futures through these helpers so that
//! downstream crates never construct a Tokio runtime themselves.

pub use tokio::runtime::{Builder, Handle, Runtime};

/// Runs the provided future to completion on a current-thread runtime.
///
/// All tasks spawned from `future` share the calling thread.
pub fn block_on<F>(future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on: failed to build Tokio runtime")
        .block_on(future)
}

/// Runs the provided future to completion on a multi-threaded runtime.
///
/// Spawned tasks are scheduled across `worker_threads` workers and may resume
/// on a different worker after every suspension point, which is what
/// exercising task-safe (rather than thread-safe) primitives requires.
pub fn block_on_multi_thread<F>(worker_threads: usize, future: F) -> F::Output
where
    F: std::future::Future,
{
    Builder::new_multi_thread()
        .worker_threads(worker_threads.max(1))
        .enable_all()
        .build()
        .expect("core_async::runtime::block_on_multi_thread: failed to build Tokio runtime")
        .block_on(future)
}

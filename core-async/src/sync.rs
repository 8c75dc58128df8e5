//! Synchronization primitives.
//!
//! The barrier crates build on exactly two things from here:
//!
//! - [`Semaphore`]: a counting semaphore whose permits are not tied to the
//!   thread or task that acquired them. Forgetting a permit and later calling
//!   [`Semaphore::add_permits`] from any context is how a barrier is released.
//! - [`CancellationToken`]: the external signal an entry attempt can be
//!   cancelled by while it waits.
//!
//! `oneshot` is re-exported for tests that hand a signal between tasks.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{CancellationToken, Semaphore};
//!
//! # core_async::runtime::block_on(async {
//! let semaphore = Semaphore::new(1);
//! semaphore.acquire().await.unwrap().forget();
//! assert_eq!(semaphore.available_permits(), 0);
//!
//! // Released without a permit guard, possibly from another task.
//! semaphore.add_permits(1);
//! assert_eq!(semaphore.available_permits(), 1);
//!
//! let token = CancellationToken::new();
//! token.cancel();
//! assert!(token.is_cancelled());
//! # });
//! ```

pub use tokio::sync::{oneshot, AcquireError, Semaphore, SemaphorePermit, TryAcquireError};

pub use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

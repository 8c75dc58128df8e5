//! Time-related abstractions.
//!
//! Entry attempts on a barrier are bounded with [`timeout`]; everything else
//! here exists for callers and tests measuring those bounds.
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, timeout, Duration, Instant};
//!
//! # core_async::runtime::block_on(async {
//! let start = Instant::now();
//! let result = timeout(Duration::from_millis(10), sleep(Duration::from_secs(5))).await;
//! assert!(result.is_err());
//! assert!(start.elapsed() >= Duration::from_millis(10));
//! # });
//! ```

pub use tokio::time::{error::Elapsed, sleep, timeout, Timeout};

pub use std::time::{Duration, Instant};

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
pub fn as_millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

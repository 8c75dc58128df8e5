//! # Barrier Configuration
//!
//! Defaults shared by guards and dispensers. The struct is serde-friendly so
//! hosts can embed it in their own configuration files, and validated before
//! use:
//!
//! ```
//! use core_barrier::BarrierConfig;
//!
//! let config = BarrierConfig::default()
//!     .with_default_enter_timeout_ms(250)
//!     .with_slow_enter_warn_ms(100);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{BarrierError, Result};
use core_async::time::Duration;
use serde::{Deserialize, Serialize};

/// Upper bound for the default entry timeout (one hour).
pub const MAX_ENTER_TIMEOUT_MS: u64 = 3_600_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarrierConfig {
    /// Timeout used by the `try_enter_default` family of guard methods.
    ///
    /// Default: 1000ms
    pub default_enter_timeout_ms: u64,

    /// Entries that waited longer than this are logged at `warn`.
    /// Zero disables the warning.
    ///
    /// Default: 500ms
    pub slow_enter_warn_ms: u64,

    /// Whether a dispenser drops its unreferenced barriers once the last
    /// active scope finishes.
    ///
    /// Default: true
    pub purge_when_idle: bool,
}

impl Default for BarrierConfig {
    fn default() -> Self {
        Self {
            default_enter_timeout_ms: 1000,
            slow_enter_warn_ms: 500,
            purge_when_idle: true,
        }
    }
}

impl BarrierConfig {
    pub fn with_default_enter_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.default_enter_timeout_ms = timeout_ms;
        self
    }

    pub fn with_slow_enter_warn_ms(mut self, warn_ms: u64) -> Self {
        self.slow_enter_warn_ms = warn_ms;
        self
    }

    pub fn with_purge_when_idle(mut self, purge: bool) -> Self {
        self.purge_when_idle = purge;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_enter_timeout_ms > MAX_ENTER_TIMEOUT_MS {
            return Err(BarrierError::Config(format!(
                "Default enter timeout exceeds maximum of {}ms",
                MAX_ENTER_TIMEOUT_MS
            )));
        }

        if self.slow_enter_warn_ms > 0
            && self.default_enter_timeout_ms > 0
            && self.slow_enter_warn_ms > self.default_enter_timeout_ms
        {
            return Err(BarrierError::Config(
                "Slow entry warning threshold must not exceed the default enter timeout"
                    .to_string(),
            ));
        }

        Ok(())
    }

    pub fn default_enter_timeout(&self) -> Duration {
        Duration::from_millis(self.default_enter_timeout_ms)
    }

    pub(crate) fn is_slow(&self, waited: Duration) -> bool {
        self.slow_enter_warn_ms > 0 && waited > Duration::from_millis(self.slow_enter_warn_ms)
    }
}

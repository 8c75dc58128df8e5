//! Workspace facade crate.
//!
//! Host applications can depend on `barrier-workspace` alone: the barrier
//! primitives are re-exported at the root, and enabling the `logging`
//! feature adds the `tracing-subscriber` set-up from `core-runtime`.

pub use core_barrier::*;

#[cfg(feature = "logging")]
pub use core_runtime::logging;

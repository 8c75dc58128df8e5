//! # Core Runtime Module
//!
//! Ambient runtime infrastructure shared by the barrier workspace:
//! - Logging and tracing set-up
//! - The runtime error type
//!
//! The barrier crates only emit `tracing` events; hosts decide whether and how
//! those events are rendered by calling [`logging::init_logging`] once at
//! start-up.

pub mod error;
pub mod logging;

pub use error::{Error, Result};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarrierError {
    #[error("Barrier not entered within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Barrier entry cancelled while waiting")]
    Cancelled,

    #[error("Guard already disposed")]
    Disposed,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BarrierError>;

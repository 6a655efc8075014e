use thiserror::Error;

/// Error taxonomy for the mining engine, per the host-boundary error
/// contract: invalid input, resource exhaustion, and cooperative abort.
/// `NoFrequentItems` is deliberately absent here -- it is not an error,
/// it surfaces as an empty result (see `crate::reporter`).
#[derive(Debug, Error)]
pub enum FimError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("out of memory: {0}")]
    OutOfMemory(String),

    #[error("mining aborted by host")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, FimError>;

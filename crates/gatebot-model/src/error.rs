//! Error types for the platform model.

use thiserror::Error;

/// Errors raised while parsing model values from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A capability name that the platform does not define.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A snowflake id that is not an unsigned integer.
    #[error("invalid id: {0:?}")]
    InvalidId(String),
}

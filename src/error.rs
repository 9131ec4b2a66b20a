//! Error types for record framing and the sorted-stream algorithms

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MarcError>;

#[derive(Error, Debug)]
pub enum MarcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Framing failed and no record terminator could be found to recover from.
    #[error("Malformed record: {context}")]
    MalformedRecord { context: String },

    /// A decode accessor was used on a buffer whose leader or directory cannot be decoded.
    #[error("Invalid record state: {context}")]
    InvalidState { context: String },

    #[error("Records out of order at record {position}: {previous:?} sorts after {current:?}")]
    OrderViolation {
        previous: String,
        current: String,
        position: u64,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MarcError {
    pub(crate) fn invalid_state(context: impl Into<String>) -> Self {
        Self::InvalidState {
            context: context.into(),
        }
    }

    pub fn is_order_violation(&self) -> bool {
        matches!(self, Self::OrderViolation { .. })
    }
}

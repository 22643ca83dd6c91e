//! Outgoing message validation errors.

use thiserror::Error;

/// Reasons an outgoing message is refused before it reaches the transport.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ComposeError {
    /// Prepared text exceeds the service limit.
    #[error("Messages must be {limit} characters or less to send")]
    MessageTooLong {
        /// Length of the prepared text in characters.
        length: usize,
        /// Maximum accepted length.
        limit: usize,
    },
}

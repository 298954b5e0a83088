//! Client error taxonomy.
//!
//! Only synchronous validation failures surface here. Everything past the
//! validation boundary (connect failures, transport writes, shutdown) is
//! fire-and-forget and observable through `is_connected()` and the logs only.

use lighthouse_core::FRAME_LEN;
use thiserror::Error;

/// Errors raised to callers before any transport interaction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Operation attempted on a connection past `close()` (or after the
    /// transport went away).
    #[error("the connection was already closed")]
    ConnectionClosed,

    /// An empty string was passed to a credential setter.
    #[error("the {field} must be a non-empty string")]
    EmptyCredential { field: &'static str },

    /// A send or subscribe was attempted before both credentials were set.
    #[error("the {field} must be set before talking to the display")]
    MissingCredential { field: &'static str },

    /// The frame byte length is not exactly [`FRAME_LEN`].
    #[error("frame data must be exactly {expected} bytes, got {actual}")]
    FrameLength { expected: usize, actual: usize },
}

impl ClientError {
    /// Convenience constructor for the frame length error.
    pub(crate) fn frame_length(actual: usize) -> Self {
        ClientError::FrameLength {
            expected: FRAME_LEN,
            actual,
        }
    }
}

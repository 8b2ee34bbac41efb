//! Error types for the client layer.

use std::time::Duration;

use serde_json::Value;

use crosstable_protocol::ProtocolError;

/// Errors a client call can fail with.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// The handshake or the correlated response did not arrive within the
    /// configured budget. No call suspends forever.
    #[error("timed out after {after:?} waiting for the host")]
    Timeout { after: Duration },

    /// The boundary was torn down with this call still in flight.
    #[error("boundary closed with the call in flight")]
    ChannelClosed,

    /// The host executed the query and it failed; this is the host's error
    /// message, round-tripped.
    #[error("host error: {message}")]
    Remote { message: String },

    /// The host answered with a value this call cannot interpret.
    #[error("unexpected response shape: {value}")]
    UnexpectedShape { value: Value },

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

//! Error types for store implementations.

use serde_json::Value;

/// Errors raised while executing a bound query against a table.
///
/// Whatever a store raises is captured by the host dispatcher and shipped
/// back to the client as the failure payload of the matching response.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// A key operand was not usable as a primary key.
    #[error("invalid key: {key}")]
    InvalidKey { key: Value },

    /// An operand that must be a JSON object was something else.
    #[error("{what} must be a JSON object, got: {value}")]
    NotAnObject { what: &'static str, value: Value },

    /// Implementation-specific failure.
    #[error("{message}")]
    Other { message: String },
}

//! Error types for the protocol layer.

/// Errors raised while encoding, decoding, or binding protocol data.
///
/// Note that *inbound* wire noise (foreign or malformed messages) never
/// surfaces as an error: [`Envelope::decode`](crate::Envelope::decode)
/// returns `None` for traffic that is not ours. These errors cover the
/// cases where our own data is inconsistent.
#[derive(thiserror::Error, Debug)]
pub enum ProtocolError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid query body: {message}")]
    InvalidBody { message: String },

    #[error("query body references unknown argument: {name}")]
    UnknownArgument { name: String },

    #[error("boundary closed")]
    BoundaryClosed,
}

//! Wire envelopes exchanged between the client and host contexts.
//!
//! Every message on the boundary is a single JSON object carrying a
//! protocol discriminant (`"type": "crosstable"`) and an `event` tag
//! selecting the variant. The boundary is shared, so decoding must be
//! tolerant: anything that is not valid JSON, does not carry our
//! discriminant, or names an event we do not know decodes to `None` and is
//! dropped by the listener without comment.
//!
//! ## Wire format
//!
//! ```json
//! { "type": "crosstable", "event": "client-handshake" }
//! { "type": "crosstable", "event": "host-handshake" }
//! { "type": "crosstable", "event": "query",
//!   "id": "c1-7", "table": "todos",
//!   "args": {"item": {"title": "a"}}, "body": "<descriptor text>" }
//! { "type": "crosstable", "event": "response",
//!   "id": "c1-7", "table": "todos", "data": {"ok": 3} }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// Protocol discriminant carried by every envelope.
///
/// Unrelated traffic on the same boundary will not carry this tag and is
/// ignored by [`Envelope::decode`].
pub const PROTOCOL_TAG: &str = "crosstable";

/// The event taxonomy.
///
/// `query` and `response` carry a correlation id linking each response back
/// to the call that requested it. Ids must be unique for the life of a
/// connection; at most one response is ever produced per query id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum Event {
    /// Client announces itself; the host answers with `host-handshake`.
    ClientHandshake,
    /// Host acknowledges; the client side is connected on receipt.
    HostHandshake,
    /// A query against a named table.
    Query {
        id: String,
        table: String,
        /// Named arguments referenced by the body. Data only, never code.
        #[serde(default)]
        args: Map<String, Value>,
        /// Text encoding of a [`QueryBody`](crate::QueryBody).
        body: String,
    },
    /// The correlated result of an earlier query.
    Response {
        id: String,
        table: String,
        data: QueryOutcome,
    },
}

/// Result payload of a `response` envelope.
///
/// Host-side execution failures are always round-tripped: a store error or
/// a rejected query body arrives here as `Err` and fails the client's
/// pending call rather than leaving it suspended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum QueryOutcome {
    #[serde(rename = "ok")]
    Ok(Value),
    #[serde(rename = "err")]
    Err(String),
}

impl QueryOutcome {
    pub fn is_err(&self) -> bool {
        matches!(self, QueryOutcome::Err(_))
    }

    /// Get the result value, or the host's error message.
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            QueryOutcome::Ok(value) => Ok(value),
            QueryOutcome::Err(message) => Err(message),
        }
    }
}

/// A single message on the boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// Always [`PROTOCOL_TAG`] for our traffic.
    #[serde(rename = "type")]
    pub tag: String,

    #[serde(flatten)]
    pub event: Event,
}

impl Envelope {
    pub fn new(event: Event) -> Self {
        Self {
            tag: PROTOCOL_TAG.to_string(),
            event,
        }
    }

    pub fn client_handshake() -> Self {
        Self::new(Event::ClientHandshake)
    }

    pub fn host_handshake() -> Self {
        Self::new(Event::HostHandshake)
    }

    pub fn query(
        id: impl Into<String>,
        table: impl Into<String>,
        args: Map<String, Value>,
        body: impl Into<String>,
    ) -> Self {
        Self::new(Event::Query {
            id: id.into(),
            table: table.into(),
            args,
            body: body.into(),
        })
    }

    pub fn response(id: impl Into<String>, table: impl Into<String>, data: QueryOutcome) -> Self {
        Self::new(Event::Response {
            id: id.into(),
            table: table.into(),
            data,
        })
    }

    /// Encode for transport as a single line of JSON text.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode a message received from the boundary.
    ///
    /// Returns `None` for anything that is not ours: malformed JSON, a
    /// missing or foreign `type` discriminant, or an unknown `event`.
    /// Never propagates a parse failure.
    pub fn decode(text: &str) -> Option<Self> {
        let envelope: Envelope = serde_json::from_str(text).ok()?;
        if envelope.tag == PROTOCOL_TAG {
            Some(envelope)
        } else {
            None
        }
    }
}

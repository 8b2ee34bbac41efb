//! # crosstable-protocol
//!
//! The wire layer of Crosstable: everything both sides of the boundary
//! must agree on, and nothing either side keeps to itself.
//!
//! - [`envelope`]: the JSON message taxonomy (handshakes, queries,
//!   responses) and its tolerant decoder — foreign or malformed traffic on
//!   the shared boundary decodes to `None` and is dropped, never raised.
//! - [`query`]: the closed query grammar, its text codec, and binding of
//!   argument placeholders into executable form. Queries are data; the
//!   host never evaluates foreign text as code.
//! - [`connection`]: the per-side `Disconnected → Connected` state machine
//!   with ordered, fire-exactly-once ready-waiters.
//! - [`boundary`]: the in-memory message channel pair the two contexts
//!   communicate over. Explicit, caller-owned, one per pairing.

pub mod boundary;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod query;

pub use boundary::{Boundary, BoundaryReceiver, BoundarySender};
pub use connection::{Connection, ConnectionState, SharedConnection};
pub use envelope::{Envelope, Event, QueryOutcome, PROTOCOL_TAG};
pub use error::ProtocolError;
pub use query::{ArgRef, BoundQuery, QueryBody, QueryDescriptor};

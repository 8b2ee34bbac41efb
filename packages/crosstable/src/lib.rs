//! Crosstable: transparent table-store access across an isolated execution
//! boundary.
//!
//! A client context issues store-like operations against tables that
//! physically live in a separate host context. The two sides exchange JSON
//! envelopes over an asynchronous message boundary: the client encodes each
//! operation as a data-only query descriptor, the host decodes, validates,
//! and executes it against its store, and a correlation id routes the
//! result back to the exact call that asked.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use crosstable::{Boundary, Client, Host, MemoryStore, TableStore};
//! use serde_json::json;
//!
//! let store = Arc::new(MemoryStore::new());
//! store.table("todos");
//!
//! let (client_side, host_side) = Boundary::pair();
//! let _host = Host::serve(host_side, store as Arc<dyn TableStore>);
//!
//! let client = Client::connect(client_side)?;
//! let todos = client.table("todos");
//! let key = todos.add(json!({"title": "a", "completed": false})).await?;
//! let rows = todos.to_array().await?;
//! ```

pub use crosstable_client::{Client, ClientConfig, ClientError, RequestRegistry, TableProxy};
pub use crosstable_host::Host;
pub use crosstable_protocol::{
    ArgRef, BoundQuery, Boundary, BoundaryReceiver, BoundarySender, Connection, ConnectionState,
    Envelope, Event, ProtocolError, QueryBody, QueryDescriptor, QueryOutcome, SharedConnection,
    PROTOCOL_TAG,
};
pub use crosstable_store::{MemoryStore, MemoryTable, StoreError, Table, TableStore};

//! The host dispatcher.
//!
//! A [`Host`] owns the store-side endpoint of a boundary pair. Its
//! listener answers every `client-handshake` with a `host-handshake`
//! (announcements are idempotent; answering each one lets a client that
//! re-acknowledges converge), and dispatches each `query` on its own task:
//! resolve the table, decode and bind the body, execute, post the
//! correlated response.
//!
//! Queries are not serialized per table — concurrent dispatch is the
//! store's problem to make safe. Every failure along the way (unknown
//! table, rejected body, dangling argument, store error) is captured into
//! the response payload so the client's pending call rejects instead of
//! hanging.

use std::sync::Arc;

use serde_json::{Map, Value};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crosstable_protocol::{
    Boundary, BoundaryReceiver, BoundarySender, Envelope, Event, QueryBody, QueryOutcome,
    SharedConnection,
};
use crosstable_store::TableStore;

/// A running host over one boundary endpoint.
///
/// Dropping the host aborts its listener and tears the pairing down.
///
/// ## Example
///
/// ```ignore
/// use crosstable_host::Host;
/// use crosstable_store::MemoryStore;
/// use crosstable_protocol::Boundary;
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryStore::new());
/// store.table("todos");
///
/// let (client_side, host_side) = Boundary::pair();
/// let _host = Host::serve(host_side, store);
/// // ... hand client_side to a Client ...
/// ```
pub struct Host {
    connection: SharedConnection,
    listener: JoinHandle<()>,
}

impl Host {
    /// Start serving a store over a boundary endpoint.
    pub fn serve(boundary: Boundary, store: Arc<dyn TableStore>) -> Self {
        let (sender, receiver) = boundary.split();
        let connection = SharedConnection::new();

        let listener = tokio::spawn(dispatch(receiver, sender, store, connection.clone()));

        Self {
            connection,
            listener,
        }
    }

    /// Whether a client has completed the handshake.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

/// The dispatch loop: sole consumer of inbound traffic on the host side.
async fn dispatch(
    mut receiver: BoundaryReceiver,
    sender: BoundarySender,
    store: Arc<dyn TableStore>,
    connection: SharedConnection,
) {
    while let Some(text) = receiver.recv().await {
        let Some(envelope) = Envelope::decode(&text) else {
            trace!("ignoring non-protocol message");
            continue;
        };

        match envelope.event {
            Event::ClientHandshake => {
                if connection.mark_connected() {
                    debug!("client connected");
                }
                match Envelope::host_handshake().encode() {
                    Ok(ack) => {
                        if sender.post(ack).is_err() {
                            warn!("boundary closed while answering handshake");
                            return;
                        }
                    }
                    Err(e) => warn!("failed to encode handshake answer: {}", e),
                }
            }
            Event::Query {
                id,
                table,
                args,
                body,
            } => {
                let store = Arc::clone(&store);
                let sender = sender.clone();
                tokio::spawn(async move {
                    let outcome = execute(store, &table, &args, &body).await;
                    respond(&sender, id, table, outcome);
                });
            }
            Event::HostHandshake | Event::Response { .. } => {
                trace!("ignoring client-bound event on the host side");
            }
        }
    }
}

/// Run one query against the store, capturing every failure as the
/// response payload.
async fn execute(
    store: Arc<dyn TableStore>,
    table: &str,
    args: &Map<String, Value>,
    body: &str,
) -> QueryOutcome {
    let Some(handle) = store.get(table) else {
        return QueryOutcome::Err(format!("no such table: {}", table));
    };

    let parsed = match QueryBody::decode(body) {
        Ok(parsed) => parsed,
        Err(e) => return QueryOutcome::Err(e.to_string()),
    };
    let bound = match parsed.bind(args) {
        Ok(bound) => bound,
        Err(e) => return QueryOutcome::Err(e.to_string()),
    };

    match handle.execute(bound).await {
        Ok(value) => QueryOutcome::Ok(value),
        Err(e) => QueryOutcome::Err(e.to_string()),
    }
}

fn respond(sender: &BoundarySender, id: String, table: String, outcome: QueryOutcome) {
    let response = Envelope::response(id, table, outcome);
    match response.encode() {
        Ok(text) => {
            if sender.post(text).is_err() {
                warn!("boundary closed before the response could be posted");
            }
        }
        Err(e) => warn!("failed to encode response: {}", e),
    }
}

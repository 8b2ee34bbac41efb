//! The client handle and its listener task.
//!
//! A [`Client`] owns one side of a boundary pair. Construction splits the
//! endpoint, spawns the listener over the inbound half, and posts the
//! opening `client-handshake`. Queries issued before the host answers park
//! behind the connection's ready gate and go out once the handshake
//! completes — they are never dropped.
//!
//! The listener is the only place inbound traffic is interpreted. It
//! ignores anything that is not ours, flips the connection on
//! `host-handshake`, and routes `response` payloads through the registry.
//! A malformed message can therefore never kill the listener or disturb
//! protocol state.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crosstable_protocol::{
    Boundary, BoundaryReceiver, BoundarySender, Envelope, Event, QueryDescriptor, QueryOutcome,
    SharedConnection,
};

use crate::error::ClientError;
use crate::registry::RequestRegistry;
use crate::table::TableProxy;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Budget for one whole call: handshake wait plus response wait.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A connected (or connecting) client over one boundary endpoint.
///
/// ## Example
///
/// ```ignore
/// use crosstable_client::Client;
/// use crosstable_protocol::Boundary;
/// use serde_json::json;
///
/// let (client_side, host_side) = Boundary::pair();
/// // ... hand host_side to a Host ...
///
/// let client = Client::connect(client_side)?;
/// let todos = client.table("todos");
/// let key = todos.add(json!({"title": "a", "completed": false})).await?;
/// ```
pub struct Client {
    sender: BoundarySender,
    connection: SharedConnection,
    registry: Arc<RequestRegistry>,
    config: ClientConfig,
    listener: JoinHandle<()>,
}

impl Client {
    /// Connect over a boundary endpoint with the default timeout.
    pub fn connect(boundary: Boundary) -> Result<Self, ClientError> {
        Self::with_config(boundary, ClientConfig::default())
    }

    /// Connect with explicit configuration.
    pub fn with_config(boundary: Boundary, config: ClientConfig) -> Result<Self, ClientError> {
        let (sender, receiver) = boundary.split();
        let connection = SharedConnection::new();

        let registry = Arc::new(RequestRegistry::new());

        let listener = tokio::spawn(listen(
            receiver,
            connection.clone(),
            Arc::clone(&registry),
            sender.clone(),
        ));

        // Announce ourselves. The host answers with `host-handshake`; if it
        // is not up yet the boundary buffers the announcement.
        sender.post(Envelope::client_handshake().encode()?)?;

        Ok(Self {
            sender,
            connection,
            registry,
            config,
            listener,
        })
    }

    /// A proxy for one named table on the host's store.
    pub fn table(&self, name: impl Into<String>) -> TableProxy<'_> {
        TableProxy::new(self, name.into())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Number of calls currently awaiting responses.
    pub fn in_flight(&self) -> usize {
        self.registry.in_flight()
    }

    /// Wait for the handshake, bounded by the configured timeout.
    pub async fn ready(&self) -> Result<(), ClientError> {
        tokio::time::timeout(self.config.timeout, self.connection.ready())
            .await
            .map_err(|_| ClientError::Timeout {
                after: self.config.timeout,
            })
    }

    /// Issue one query: wait for the connection, send, await the
    /// correlated response. The whole exchange shares one timeout budget.
    ///
    /// The correlation id is registered out here, before the timeout
    /// wrapper, so every failure path can unregister it: a call that times
    /// out or errors leaves nothing behind in the pending map, and a
    /// response that arrives later is dropped as unknown.
    pub(crate) async fn call(&self, descriptor: QueryDescriptor) -> Result<Value, ClientError> {
        let (id, rx) = self.registry.register();

        let result =
            tokio::time::timeout(self.config.timeout, self.call_inner(&id, descriptor, rx)).await;
        match result {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                self.registry.discard(&id);
                Err(e)
            }
            Err(_) => {
                self.registry.discard(&id);
                Err(ClientError::Timeout {
                    after: self.config.timeout,
                })
            }
        }
    }

    async fn call_inner(
        &self,
        id: &str,
        descriptor: QueryDescriptor,
        rx: oneshot::Receiver<QueryOutcome>,
    ) -> Result<Value, ClientError> {
        self.connection.ready().await;

        let body = descriptor.body.encode()?;
        let envelope = Envelope::query(id, descriptor.table, descriptor.args, body);
        let text = envelope.encode()?;

        if self.sender.post(text).is_err() {
            return Err(ClientError::ChannelClosed);
        }

        match rx.await {
            Ok(outcome) => outcome
                .into_result()
                .map_err(|message| ClientError::Remote { message }),
            Err(_) => Err(ClientError::ChannelClosed),
        }
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        self.listener.abort();
        self.registry.fail_all();
    }
}

/// The listener loop: sole consumer of inbound traffic.
async fn listen(
    mut receiver: BoundaryReceiver,
    connection: SharedConnection,
    registry: Arc<RequestRegistry>,
    sender: BoundarySender,
) {
    while let Some(text) = receiver.recv().await {
        let Some(envelope) = Envelope::decode(&text) else {
            trace!("ignoring non-protocol message");
            continue;
        };

        match envelope.event {
            Event::HostHandshake => {
                if connection.mark_connected() {
                    debug!("connected to host");
                    // Re-acknowledge so a host that came up on its own
                    // converges too. Once connected, further handshakes hit
                    // the idempotent path above and the exchange stops.
                    match Envelope::client_handshake().encode() {
                        Ok(ack) => {
                            if sender.post(ack).is_err() {
                                warn!("boundary closed while acknowledging handshake");
                            }
                        }
                        Err(e) => warn!("failed to encode handshake ack: {}", e),
                    }
                }
            }
            Event::Response { id, data, .. } => {
                registry.complete(&id, data);
            }
            Event::ClientHandshake | Event::Query { .. } => {
                trace!("ignoring host-bound event on the client side");
            }
        }
    }

    // Boundary gone: nothing pending can ever complete.
    registry.fail_all();
}

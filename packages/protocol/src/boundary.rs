//! The in-memory message boundary between the two contexts.
//!
//! A [`Boundary`] is one endpoint of a cross-wired pair of unbounded tokio
//! channels carrying opaque `String` messages. It models the constraints
//! the protocol is designed around: asynchronous delivery, no ordering
//! contract between sender and receiver beyond per-message integrity, and
//! shared use (anything can post text; the protocol layer filters).
//!
//! Each pairing is an explicit object owned by its creator — there is no
//! process-wide channel slot. Dropping an endpoint tears the pairing down;
//! the peer observes end-of-stream.
//!
//! ## Example
//!
//! ```ignore
//! use crosstable_protocol::Boundary;
//!
//! let (client_side, host_side) = Boundary::pair();
//! client_side.post("hello".to_string())?;
//! // host_side.recv().await == Some("hello".to_string())
//! ```

use tokio::sync::mpsc;

use crate::error::ProtocolError;

/// One endpoint of a boundary pair.
#[derive(Debug)]
pub struct Boundary {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl Boundary {
    /// Create a cross-wired endpoint pair: messages posted on one side
    /// arrive on the other.
    pub fn pair() -> (Boundary, Boundary) {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();

        let side_a = Boundary { tx: tx1, rx: rx2 };
        let side_b = Boundary { tx: tx2, rx: rx1 };
        (side_a, side_b)
    }

    /// Post opaque text to the peer.
    pub fn post(&self, message: String) -> Result<(), ProtocolError> {
        self.tx
            .send(message)
            .map_err(|_| ProtocolError::BoundaryClosed)
    }

    /// Receive the next message, `None` once the peer is gone and the
    /// buffer is drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Split into a cloneable posting half and a receiving half, so call
    /// sites can post while a listener task owns the inbound stream.
    pub fn split(self) -> (BoundarySender, BoundaryReceiver) {
        (BoundarySender { tx: self.tx }, BoundaryReceiver { rx: self.rx })
    }
}

/// Posting half of a split endpoint.
#[derive(Debug, Clone)]
pub struct BoundarySender {
    tx: mpsc::UnboundedSender<String>,
}

impl BoundarySender {
    pub fn post(&self, message: String) -> Result<(), ProtocolError> {
        self.tx
            .send(message)
            .map_err(|_| ProtocolError::BoundaryClosed)
    }
}

/// Receiving half of a split endpoint.
#[derive(Debug)]
pub struct BoundaryReceiver {
    rx: mpsc::UnboundedReceiver<String>,
}

impl BoundaryReceiver {
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }
}

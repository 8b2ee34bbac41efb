//! Per-side connection tracking.
//!
//! Each side of the boundary holds one connection tracker. It starts
//! `Disconnected` and transitions to `Connected` exactly once, when the
//! side's half of the handshake arrives; there is no reverse transition for
//! the life of the channel. Callers that need the connection gate on
//! [`SharedConnection::ready`], which resolves immediately once connected
//! and otherwise parks the caller on a oneshot that fires at the
//! transition. Waiters fire exactly once, in the order they queued.
//!
//! "Connected" is signalled, not polled: a waiter holds a receiver that
//! either has fired or has not, so repeated handshakes cannot wake anyone
//! twice.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

/// Connection lifecycle. `Connected` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// The state machine proper. Usually accessed through [`SharedConnection`].
#[derive(Debug)]
pub struct Connection {
    state: ConnectionState,
    waiters: Vec<oneshot::Sender<()>>,
}

impl Connection {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            waiters: Vec::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Register interest in the transition.
    ///
    /// Returns `None` when already connected (nothing to wait for),
    /// otherwise a receiver that fires on [`Connection::mark_connected`].
    pub fn subscribe(&mut self) -> Option<oneshot::Receiver<()>> {
        if self.is_connected() {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        self.waiters.push(tx);
        Some(rx)
    }

    /// Transition to `Connected`, draining waiters in enqueue order.
    ///
    /// Idempotent: returns `true` only for the transition itself. Repeated
    /// handshakes hit the early return and wake nobody.
    pub fn mark_connected(&mut self) -> bool {
        if self.is_connected() {
            return false;
        }
        self.state = ConnectionState::Connected;
        for waiter in self.waiters.drain(..) {
            // A waiter that gave up (dropped receiver) is fine to skip.
            let _ = waiter.send(());
        }
        true
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

/// Cloneable handle shared between a listener task and its call-sites.
///
/// The mutex is held only for state flips and waiter registration, never
/// across an await point.
#[derive(Debug, Clone)]
pub struct SharedConnection {
    inner: Arc<Mutex<Connection>>,
}

impl SharedConnection {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Connection::new())),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.lock().is_connected()
    }

    /// See [`Connection::mark_connected`].
    pub fn mark_connected(&self) -> bool {
        self.lock().mark_connected()
    }

    /// Resolve once the connection is established.
    ///
    /// Returns immediately when already connected. There is no timeout at
    /// this level; callers bound the wait themselves.
    pub async fn ready(&self) {
        let waiter = self.lock().subscribe();
        if let Some(rx) = waiter {
            // The sender is only dropped when the whole connection goes
            // away, at which point nothing meaningful follows the wait.
            let _ = rx.await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for SharedConnection {
    fn default() -> Self {
        Self::new()
    }
}

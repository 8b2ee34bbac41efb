//! The pending-request registry.
//!
//! Every outstanding call is a correlation id mapped to the oneshot that
//! will wake the caller. Ids come from a strictly monotonic per-registry
//! counter rendered with the client's instance prefix (`"c1-7"`), so two
//! calls issued in the same instant can never collide the way
//! timestamp-derived ids can.
//!
//! A response whose id is not in the map is dropped without error: the
//! entry was already consumed (at most one response per query) or the id
//! was never ours.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tokio::sync::oneshot;
use tracing::trace;

use crosstable_protocol::QueryOutcome;

/// Distinguishes id prefixes between registries in the same process, so
/// two clients sharing a boundary can never mint colliding ids.
static NEXT_REGISTRY: AtomicU64 = AtomicU64::new(1);

/// Correlates outstanding calls to inbound responses.
#[derive(Debug)]
pub struct RequestRegistry {
    prefix: String,
    next: AtomicU64,
    pending: Mutex<HashMap<String, oneshot::Sender<QueryOutcome>>>,
}

impl RequestRegistry {
    /// Create a registry with a process-unique id prefix.
    pub fn new() -> Self {
        let instance = NEXT_REGISTRY.fetch_add(1, Ordering::Relaxed);
        Self::with_prefix(format!("c{}", instance))
    }

    /// Create a registry with an explicit prefix, for deterministic ids.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a fresh correlation id and register its continuation.
    pub fn register(&self) -> (String, oneshot::Receiver<QueryOutcome>) {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        let id = format!("{}-{}", self.prefix, n);

        let (tx, rx) = oneshot::channel();
        self.lock().insert(id.clone(), tx);
        (id, rx)
    }

    /// Route a response payload to its continuation, consuming the entry.
    ///
    /// Returns `false` for an unknown id; the payload is dropped and
    /// nothing else happens.
    pub fn complete(&self, id: &str, outcome: QueryOutcome) -> bool {
        let entry = self.lock().remove(id);
        match entry {
            Some(tx) => {
                // A caller that gave up (timeout) has dropped its receiver;
                // the send result does not matter.
                let _ = tx.send(outcome);
                true
            }
            None => {
                trace!(id, "dropping response for unknown correlation id");
                false
            }
        }
    }

    /// Forget an entry whose query was never actually sent.
    pub fn discard(&self, id: &str) {
        self.lock().remove(id);
    }

    /// Fail every residual entry by dropping its sender; parked callers
    /// observe a closed channel.
    pub fn fail_all(&self) {
        self.lock().clear();
    }

    /// Number of calls currently in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, oneshot::Sender<QueryOutcome>>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RequestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

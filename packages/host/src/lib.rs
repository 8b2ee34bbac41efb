//! # crosstable-host
//!
//! The host side of Crosstable: [`Host`] owns the store-side endpoint of a
//! boundary pair, answers handshakes, and dispatches decoded queries
//! concurrently against a [`TableStore`](crosstable_store::TableStore).
//! Execution failures are round-tripped to the client as failure payloads,
//! never swallowed.

pub mod host;

pub use host::Host;

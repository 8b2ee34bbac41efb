//! # crosstable-client
//!
//! The client side of Crosstable: a [`Client`] owns one endpoint of a
//! boundary pair, tracks the handshake, correlates outstanding calls
//! through its [`RequestRegistry`], and exposes store-like verbs per table
//! through [`TableProxy`].
//!
//! Calls issued before the host comes online wait for the handshake
//! instead of failing; every call is bounded by the configured timeout so
//! a lost response fails instead of suspending forever.

pub mod client;
pub mod error;
pub mod registry;
pub mod table;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
pub use registry::RequestRegistry;
pub use table::TableProxy;

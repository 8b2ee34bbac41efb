//! # crosstable-store
//!
//! The store side of Crosstable: the small capability surface the host
//! dispatcher executes queries through ([`Table`] / [`TableStore`]), and an
//! in-memory reference implementation ([`MemoryStore`]) with
//! auto-increment keys and the full query grammar.
//!
//! The protocol deliberately knows nothing about storage. Anything that
//! can resolve a table by name and execute a
//! [`BoundQuery`](crosstable_protocol::BoundQuery) can sit behind a host.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::StoreError;
pub use memory::{MemoryStore, MemoryTable};
pub use traits::{Table, TableStore};

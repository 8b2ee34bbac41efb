//! The capability surface the host dispatcher consumes.
//!
//! The dispatcher does not know how tables are stored. It asks a
//! [`TableStore`] for a table by name and hands the resolved [`Table`] a
//! [`BoundQuery`] to execute. Execution is asynchronous and may run
//! concurrently with other queries against the same table; a store is
//! responsible for its own interior synchronization.
//!
//! # Object Safety
//!
//! Both traits are object-safe: the dispatcher works with
//! `Arc<dyn TableStore>` and `Arc<dyn Table>`.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crosstable_protocol::BoundQuery;

use crate::error::StoreError;

/// One named table.
#[async_trait]
pub trait Table: Send + Sync {
    /// Execute a bound query and return its result value.
    ///
    /// # Returns
    ///
    /// * `Ok(value)` - The operation's result (rows, a generated key, a
    ///   touched-row count, depending on the query).
    /// * `Err(StoreError)` - The operation failed; the error is
    ///   round-tripped to the client.
    async fn execute(&self, query: BoundQuery) -> Result<Value, StoreError>;
}

/// A collection of named tables.
pub trait TableStore: Send + Sync {
    /// Look up a table by name. `None` means the table does not exist;
    /// the dispatcher reports that to the client as a failed query.
    fn get(&self, table: &str) -> Option<Arc<dyn Table>>;
}

#[async_trait]
impl<T: Table + ?Sized> Table for Arc<T> {
    async fn execute(&self, query: BoundQuery) -> Result<Value, StoreError> {
        self.as_ref().execute(query).await
    }
}

impl<T: TableStore + ?Sized> TableStore for Arc<T> {
    fn get(&self, table: &str) -> Option<Arc<dyn Table>> {
        self.as_ref().get(table)
    }
}

//! The table proxy façade.
//!
//! A [`TableProxy`] presents store-like verbs against a named table on the
//! host's store. Each verb is a thin wrapper with the same shape: wait for
//! the connection, build a query descriptor, send it, await the correlated
//! response, decode. Calls are independent; two concurrent calls are
//! ordered only by their own correlation ids.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crosstable_protocol::{QueryBody, QueryDescriptor};

use crate::client::Client;
use crate::error::ClientError;

/// A proxy for one named table. Cheap to create; borrow it from
/// [`Client::table`].
pub struct TableProxy<'a> {
    client: &'a Client,
    name: String,
}

impl<'a> TableProxy<'a> {
    pub(crate) fn new(client: &'a Client, name: String) -> Self {
        Self { client, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fetch every row.
    pub async fn to_array(&self) -> Result<Vec<Value>, ClientError> {
        let result = self
            .call(QueryDescriptor::new(&self.name, QueryBody::ToArray))
            .await?;
        match result {
            Value::Array(rows) => Ok(rows),
            other => Err(ClientError::UnexpectedShape { value: other }),
        }
    }

    /// Fetch every row, deserialized into a typed record.
    pub async fn to_array_of<T: DeserializeOwned>(&self) -> Result<Vec<T>, ClientError> {
        let rows = self.to_array().await?;
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(ClientError::from))
            .collect()
    }

    /// Fetch one row by primary key.
    pub async fn get(&self, key: u64) -> Result<Option<Value>, ClientError> {
        let descriptor = QueryDescriptor::new(&self.name, QueryBody::get("key"))
            .arg("key", Value::from(key));
        let result = self.call(descriptor).await?;
        match result {
            Value::Null => Ok(None),
            row => Ok(Some(row)),
        }
    }

    /// Insert a row; the host generates and returns its primary key.
    pub async fn add(&self, item: Value) -> Result<u64, ClientError> {
        let descriptor =
            QueryDescriptor::new(&self.name, QueryBody::add("item")).arg("item", item);
        self.call_for_number(descriptor).await
    }

    /// Insert a typed record.
    pub async fn add_value<T: Serialize>(&self, item: &T) -> Result<u64, ClientError> {
        self.add(serde_json::to_value(item)?).await
    }

    /// Insert or replace a row carrying its own key.
    pub async fn put(&self, item: Value) -> Result<u64, ClientError> {
        let descriptor =
            QueryDescriptor::new(&self.name, QueryBody::put("item")).arg("item", item);
        self.call_for_number(descriptor).await
    }

    /// Merge `changes` into one row by key; returns the touched-row count
    /// (0 or 1).
    pub async fn update(&self, key: u64, changes: Value) -> Result<u64, ClientError> {
        let descriptor = QueryDescriptor::new(&self.name, QueryBody::update("key", "changes"))
            .arg("key", Value::from(key))
            .arg("changes", changes);
        self.call_for_number(descriptor).await
    }

    /// Merge `changes` into every row whose `field` equals `equals`;
    /// returns the touched-row count.
    pub async fn modify(
        &self,
        field: impl Into<String>,
        equals: Value,
        changes: Value,
    ) -> Result<u64, ClientError> {
        let descriptor =
            QueryDescriptor::new(&self.name, QueryBody::modify(field, "equals", "changes"))
                .arg("equals", equals)
                .arg("changes", changes);
        self.call_for_number(descriptor).await
    }

    /// Delete one row by key; returns the removed-row count (0 or 1).
    pub async fn delete(&self, key: u64) -> Result<u64, ClientError> {
        let descriptor = QueryDescriptor::new(&self.name, QueryBody::delete("key"))
            .arg("key", Value::from(key));
        self.call_for_number(descriptor).await
    }

    /// Delete every row; returns how many were removed.
    pub async fn clear(&self) -> Result<u64, ClientError> {
        self.call_for_number(QueryDescriptor::new(&self.name, QueryBody::Clear))
            .await
    }

    /// Count the rows.
    pub async fn count(&self) -> Result<u64, ClientError> {
        self.call_for_number(QueryDescriptor::new(&self.name, QueryBody::Count))
            .await
    }

    async fn call(&self, descriptor: QueryDescriptor) -> Result<Value, ClientError> {
        self.client.call(descriptor).await
    }

    async fn call_for_number(&self, descriptor: QueryDescriptor) -> Result<u64, ClientError> {
        let result = self.call(descriptor).await?;
        result
            .as_u64()
            .ok_or(ClientError::UnexpectedShape { value: result })
    }
}

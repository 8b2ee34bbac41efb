//! In-memory reference store.
//!
//! `MemoryStore` keeps named tables of JSON object rows keyed by an
//! auto-incrementing `u64` primary key. Inserting a row injects the
//! generated key into the row under the store's key field (`"id"` by
//! default), so the rows a client reads back carry their keys.
//!
//! Tables are declared up front with [`MemoryStore::table`]; the
//! [`TableStore`] lookup the dispatcher uses only resolves tables that
//! exist, so a query against an undeclared table fails cleanly.
//!
//! Interior synchronization is a mutex around each table's rows; the
//! dispatcher may execute queries against the same table concurrently.
//!
//! ## Example
//!
//! ```ignore
//! use crosstable_store::MemoryStore;
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! let todos = store.table("todos");
//! todos.seed([json!({"title": "a", "completed": false})])?;
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crosstable_protocol::BoundQuery;

use crate::error::StoreError;
use crate::traits::{Table, TableStore};

const DEFAULT_KEY_FIELD: &str = "id";

/// A named collection of in-memory tables.
pub struct MemoryStore {
    key_field: String,
    tables: Mutex<HashMap<String, Arc<MemoryTable>>>,
}

impl MemoryStore {
    /// Create a store whose rows are keyed under `"id"`.
    pub fn new() -> Self {
        Self::with_key_field(DEFAULT_KEY_FIELD)
    }

    /// Create a store that injects generated keys under a custom field.
    pub fn with_key_field(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            tables: Mutex::new(HashMap::new()),
        }
    }

    /// Declare (or fetch) a table, returning its handle.
    pub fn table(&self, name: impl Into<String>) -> Arc<MemoryTable> {
        let name = name.into();
        let mut tables = lock(&self.tables);
        tables
            .entry(name)
            .or_insert_with(|| Arc::new(MemoryTable::new(self.key_field.clone())))
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TableStore for MemoryStore {
    fn get(&self, table: &str) -> Option<Arc<dyn Table>> {
        let tables = lock(&self.tables);
        tables.get(table).cloned().map(|t| t as Arc<dyn Table>)
    }
}

/// One in-memory table of JSON object rows.
pub struct MemoryTable {
    key_field: String,
    inner: Mutex<TableInner>,
}

struct TableInner {
    rows: BTreeMap<u64, Value>,
    next_key: u64,
}

impl MemoryTable {
    fn new(key_field: String) -> Self {
        Self {
            key_field,
            inner: Mutex::new(TableInner {
                rows: BTreeMap::new(),
                next_key: 1,
            }),
        }
    }

    /// Insert fixture rows directly (host-side setup and tests), returning
    /// the generated keys.
    pub fn seed<I>(&self, items: I) -> Result<Vec<u64>, StoreError>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut keys = Vec::new();
        let mut inner = lock_inner(&self.inner);
        for item in items {
            keys.push(insert_row(&mut inner, &self.key_field, item, false)?);
        }
        Ok(keys)
    }

    /// Current number of rows.
    pub fn len(&self) -> usize {
        lock_inner(&self.inner).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Table for MemoryTable {
    async fn execute(&self, query: BoundQuery) -> Result<Value, StoreError> {
        let mut inner = lock_inner(&self.inner);
        match query {
            BoundQuery::ToArray => {
                Ok(Value::Array(inner.rows.values().cloned().collect()))
            }
            BoundQuery::Get { key } => {
                let key = key_of(&key)?;
                Ok(inner.rows.get(&key).cloned().unwrap_or(Value::Null))
            }
            BoundQuery::Add { item } => {
                let key = insert_row(&mut inner, &self.key_field, item, false)?;
                Ok(Value::from(key))
            }
            BoundQuery::Put { item } => {
                let key = insert_row(&mut inner, &self.key_field, item, true)?;
                Ok(Value::from(key))
            }
            BoundQuery::Update { key, changes } => {
                let key = key_of(&key)?;
                let changes = as_object("changes", changes)?;
                reject_key_change(&self.key_field, &changes)?;
                let touched = match inner.rows.get_mut(&key) {
                    Some(row) => {
                        merge_into(row, &changes)?;
                        1
                    }
                    None => 0,
                };
                Ok(Value::from(touched))
            }
            BoundQuery::Modify {
                field,
                equals,
                changes,
            } => {
                let changes = as_object("changes", changes)?;
                reject_key_change(&self.key_field, &changes)?;
                let mut touched = 0u64;
                for row in inner.rows.values_mut() {
                    let matches = row.get(&field) == Some(&equals);
                    if matches {
                        merge_into(row, &changes)?;
                        touched += 1;
                    }
                }
                Ok(Value::from(touched))
            }
            BoundQuery::Delete { key } => {
                let key = key_of(&key)?;
                let removed = inner.rows.remove(&key).map(|_| 1u64).unwrap_or(0);
                Ok(Value::from(removed))
            }
            BoundQuery::Clear => {
                let removed = inner.rows.len() as u64;
                inner.rows.clear();
                Ok(Value::from(removed))
            }
            BoundQuery::Count => Ok(Value::from(inner.rows.len() as u64)),
        }
    }
}

/// Insert an object row, generating a key unless the row carries one.
///
/// With `replace` false an existing key is a duplicate-key error (insert
/// semantics); with `replace` true the row is overwritten (put semantics).
fn insert_row(
    inner: &mut TableInner,
    key_field: &str,
    item: Value,
    replace: bool,
) -> Result<u64, StoreError> {
    let mut row = as_object("row", item)?;

    let key = match row.get(key_field) {
        Some(value) => key_of(value)?,
        None => {
            let key = inner.next_key;
            row.insert(key_field.to_string(), Value::from(key));
            key
        }
    };

    if !replace && inner.rows.contains_key(&key) {
        return Err(StoreError::Other {
            message: format!("duplicate key: {}", key),
        });
    }

    // Keep the generator ahead of explicit keys so later inserts never
    // collide with them. Saturate so an explicit u64::MAX key cannot
    // overflow the generator; the worst case is a duplicate-key error on
    // a later keyless insert, never a panic.
    inner.next_key = inner.next_key.max(key.saturating_add(1));
    inner.rows.insert(key, Value::Object(row));
    Ok(key)
}

/// A merge may not touch the key field: rows are keyed by it, and a
/// rewritten key would leave the row stranded under its old map entry.
fn reject_key_change(key_field: &str, changes: &Map<String, Value>) -> Result<(), StoreError> {
    if changes.contains_key(key_field) {
        return Err(StoreError::Other {
            message: format!("cannot change key field: {}", key_field),
        });
    }
    Ok(())
}

fn key_of(value: &Value) -> Result<u64, StoreError> {
    value.as_u64().ok_or_else(|| StoreError::InvalidKey {
        key: value.clone(),
    })
}

fn as_object(what: &'static str, value: Value) -> Result<Map<String, Value>, StoreError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::NotAnObject { what, value: other }),
    }
}

/// Shallow-merge `changes` into an object row.
fn merge_into(row: &mut Value, changes: &Map<String, Value>) -> Result<(), StoreError> {
    let row = row.as_object_mut().ok_or_else(|| StoreError::NotAnObject {
        what: "row",
        value: Value::Null,
    })?;
    for (field, value) in changes {
        row.insert(field.clone(), value.clone());
    }
    Ok(())
}

fn lock<'a>(
    tables: &'a Mutex<HashMap<String, Arc<MemoryTable>>>,
) -> MutexGuard<'a, HashMap<String, Arc<MemoryTable>>> {
    tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock_inner(inner: &Mutex<TableInner>) -> MutexGuard<'_, TableInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

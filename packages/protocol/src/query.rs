//! The query descriptor grammar and its text codec.
//!
//! A query crosses the boundary as *data*: a small, closed grammar of table
//! operations whose operand slots are named references into an argument
//! map. The client encodes the body to JSON text (the envelope's string
//! field supplies the escaping needed to survive transport); the host
//! decodes the text, validates it against the grammar, and binds the
//! placeholders to concrete values before anything executes. Text that
//! names an operation or an argument we do not know is rejected with an
//! error — it is never interpreted as code.
//!
//! ## Example
//!
//! ```ignore
//! use crosstable_protocol::{QueryBody, ArgRef, QueryDescriptor};
//! use serde_json::json;
//!
//! let descriptor = QueryDescriptor::new("todos", QueryBody::add("item"))
//!     .arg("item", json!({"title": "a", "completed": false}));
//!
//! let text = descriptor.body.encode()?;
//! let bound = QueryBody::decode(&text)?.bind(&descriptor.args)?;
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ProtocolError;

/// A named placeholder resolved against the argument map at bind time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArgRef {
    pub arg: String,
}

impl ArgRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { arg: name.into() }
    }

    fn resolve(&self, args: &Map<String, Value>) -> Result<Value, ProtocolError> {
        args.get(&self.arg)
            .cloned()
            .ok_or_else(|| ProtocolError::UnknownArgument {
                name: self.arg.clone(),
            })
    }
}

/// A table operation, as shipped across the boundary.
///
/// This is the complete vocabulary the host will execute. Decoding anything
/// outside it fails; there is no escape hatch to arbitrary logic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum QueryBody {
    /// Fetch every row in the table.
    ToArray,
    /// Fetch one row by primary key.
    Get { key: ArgRef },
    /// Insert a row, generating a fresh primary key.
    Add { item: ArgRef },
    /// Insert or replace a row carrying its own key.
    Put { item: ArgRef },
    /// Merge `changes` into the row with the given key.
    Update { key: ArgRef, changes: ArgRef },
    /// Merge `changes` into every row whose `field` equals a value.
    Modify {
        field: String,
        equals: ArgRef,
        changes: ArgRef,
    },
    /// Delete one row by primary key.
    Delete { key: ArgRef },
    /// Delete every row.
    Clear,
    /// Count the rows.
    Count,
}

impl QueryBody {
    pub fn get(key: impl Into<String>) -> Self {
        QueryBody::Get {
            key: ArgRef::new(key),
        }
    }

    pub fn add(item: impl Into<String>) -> Self {
        QueryBody::Add {
            item: ArgRef::new(item),
        }
    }

    pub fn put(item: impl Into<String>) -> Self {
        QueryBody::Put {
            item: ArgRef::new(item),
        }
    }

    pub fn update(key: impl Into<String>, changes: impl Into<String>) -> Self {
        QueryBody::Update {
            key: ArgRef::new(key),
            changes: ArgRef::new(changes),
        }
    }

    pub fn modify(
        field: impl Into<String>,
        equals: impl Into<String>,
        changes: impl Into<String>,
    ) -> Self {
        QueryBody::Modify {
            field: field.into(),
            equals: ArgRef::new(equals),
            changes: ArgRef::new(changes),
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        QueryBody::Delete {
            key: ArgRef::new(key),
        }
    }

    /// Encode as text for the envelope's `body` field.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode and validate body text received from the boundary.
    ///
    /// Unlike envelope decoding this is *not* silent: by the time we are
    /// looking at a body the message was addressed to us, so a bad body is
    /// reported back to the client as a failed query.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::InvalidBody {
            message: e.to_string(),
        })
    }

    /// Resolve every placeholder against `args`, producing an executable
    /// query. A dangling reference fails the whole query.
    pub fn bind(&self, args: &Map<String, Value>) -> Result<BoundQuery, ProtocolError> {
        let bound = match self {
            QueryBody::ToArray => BoundQuery::ToArray,
            QueryBody::Get { key } => BoundQuery::Get {
                key: key.resolve(args)?,
            },
            QueryBody::Add { item } => BoundQuery::Add {
                item: item.resolve(args)?,
            },
            QueryBody::Put { item } => BoundQuery::Put {
                item: item.resolve(args)?,
            },
            QueryBody::Update { key, changes } => BoundQuery::Update {
                key: key.resolve(args)?,
                changes: changes.resolve(args)?,
            },
            QueryBody::Modify {
                field,
                equals,
                changes,
            } => BoundQuery::Modify {
                field: field.clone(),
                equals: equals.resolve(args)?,
                changes: changes.resolve(args)?,
            },
            QueryBody::Delete { key } => BoundQuery::Delete {
                key: key.resolve(args)?,
            },
            QueryBody::Clear => BoundQuery::Clear,
            QueryBody::Count => BoundQuery::Count,
        };
        Ok(bound)
    }
}

/// A query with every placeholder resolved to a concrete value.
///
/// This is what the store capability surface executes.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundQuery {
    ToArray,
    Get { key: Value },
    Add { item: Value },
    Put { item: Value },
    Update { key: Value, changes: Value },
    Modify {
        field: String,
        equals: Value,
        changes: Value,
    },
    Delete { key: Value },
    Clear,
    Count,
}

/// A complete client-side query: target table, body, and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub table: String,
    pub args: Map<String, Value>,
    pub body: QueryBody,
}

impl QueryDescriptor {
    pub fn new(table: impl Into<String>, body: QueryBody) -> Self {
        Self {
            table: table.into(),
            args: Map::new(),
            body,
        }
    }

    /// Attach a named argument. Arguments are wire values, never closures.
    pub fn arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }
}

//! Persistence seam
//!
//! The repository never talks to a storage engine directly. It reads rows and
//! commits change sets through the [`Store`] trait, which a production engine
//! implements on top of its own driver. Rows are JSON objects keyed by column
//! name; primary keys are normalised into [`Key`] so integer and UUID keys
//! compare and order the same way everywhere.
//!
//! [`MemoryStore`] is the bundled implementation. It enforces primary keys,
//! unique columns and foreign keys (RESTRICT on delete) and applies each
//! change set atomically.

mod memory;

use std::fmt;
use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::entity::Entity;

pub use memory::MemoryStore;

/// A stored row: column name to JSON value
pub type Row = serde_json::Map<String, Value>;

/// Normalised primary key value
///
/// Integer keys order numerically, text keys (UUIDs) lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Integer key (i32/i64 columns)
    Int(i64),
    /// Text key (UUID columns)
    Text(String),
}

impl Key {
    /// Read a key out of a JSON column value
    ///
    /// Returns `None` for null and for values that cannot be keys.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Key::Int),
            Value::String(s) => Some(Key::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(n) => write!(f, "{n}"),
            Key::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A foreign key column and the table it references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references: &'static str,
}

/// Constraints the store enforces for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub unique: &'static [&'static str],
    pub foreign_keys: Vec<ForeignKey>,
}

impl TableSchema {
    /// Derive the schema from an entity's static metadata
    ///
    /// Every declared relation becomes a foreign key on this table.
    pub fn of<E: Entity>() -> Self {
        Self {
            name: E::TABLE,
            primary_key: E::PRIMARY_KEY,
            unique: E::UNIQUE,
            foreign_keys: E::RELATIONS
                .iter()
                .map(|relation| ForeignKey {
                    column: relation.foreign_key,
                    references: relation.table,
                })
                .collect(),
        }
    }
}

/// One staged mutation
#[derive(Debug, Clone, PartialEq)]
pub enum Change {
    Insert {
        table: &'static str,
        key: Key,
        row: Row,
    },
    Update {
        table: &'static str,
        key: Key,
        row: Row,
    },
    Delete {
        table: &'static str,
        key: Key,
    },
}

impl Change {
    pub fn table(&self) -> &'static str {
        match self {
            Change::Insert { table, .. }
            | Change::Update { table, .. }
            | Change::Delete { table, .. } => table,
        }
    }

    pub fn key(&self) -> &Key {
        match self {
            Change::Insert { key, .. } | Change::Update { key, .. } | Change::Delete { key, .. } => {
                key
            }
        }
    }
}

/// Failures reported by a [`Store`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("unknown table '{0}'")]
    UnknownTable(String),

    #[error("duplicate primary key {key} in {table}")]
    DuplicateKey { table: String, key: String },

    #[error("row {key} does not exist in {table}")]
    MissingRow { table: String, key: String },

    #[error("unique constraint on {table}.{column} violated by value {value}")]
    UniqueViolation {
        table: String,
        column: String,
        value: String,
    },

    #[error("{table}.{column} references missing row {value} in {referenced_table}")]
    ForeignKeyViolation {
        table: String,
        column: String,
        referenced_table: String,
        value: String,
    },

    #[error("row {key} in {table} is still referenced by {referencing_table}.{column}")]
    RowReferenced {
        table: String,
        key: String,
        referencing_table: String,
        column: String,
    },

    #[error("malformed row in {table}: {reason}")]
    MalformedRow { table: String, reason: String },
}

/// Storage engine seam
///
/// Reads always observe committed state. `commit` applies a change set
/// atomically: either every change is applied or none is, and the first
/// violated constraint is reported.
pub trait Store: Send + Sync + 'static {
    /// All committed rows of a table, in primary key order
    fn scan(&self, table: &str) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;

    /// One committed row by primary key
    fn fetch(
        &self,
        table: &str,
        key: &Key,
    ) -> impl Future<Output = Result<Option<Row>, StoreError>> + Send;

    /// Committed rows for a batch of primary keys; missing keys are skipped
    fn fetch_many(
        &self,
        table: &str,
        keys: &[Key],
    ) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;

    /// Reserve the next integer key for a table
    fn next_sequence(&self, table: &str) -> impl Future<Output = Result<i64, StoreError>> + Send;

    /// Apply a change set atomically, returning the number of affected rows
    fn commit(&self, changes: Vec<Change>) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

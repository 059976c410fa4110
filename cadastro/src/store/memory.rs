//! In-process store
//!
//! Tables live in a shared `Arc<RwLock<..>>`, so cloning a [`MemoryStore`]
//! hands out another handle to the same data. A change set is applied to a
//! working copy of the tables and swapped in only when every change passed
//! its constraints.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use super::{Change, Key, Row, Store, StoreError, TableSchema};
use crate::entity::Entity;

type TableRows = BTreeMap<Key, Row>;

#[derive(Debug, Default)]
struct Tables {
    schemas: HashMap<&'static str, TableSchema>,
    rows: HashMap<&'static str, TableRows>,
    sequences: HashMap<&'static str, i64>,
}

/// Shared in-memory store enforcing keys, unique columns and foreign keys
#[derive(Debug, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    online: Arc<AtomicBool>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store with no tables
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            online: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Register the table backing an entity type
    ///
    /// ```rust,ignore
    /// let store = MemoryStore::new().with_entity::<Marca>().with_entity::<Veiculo>();
    /// ```
    #[must_use]
    pub fn with_entity<E: Entity>(self) -> Self {
        self.register(TableSchema::of::<E>());
        self
    }

    /// Register a table schema, keeping any rows already stored under that name
    pub fn register(&self, schema: TableSchema) {
        if let Ok(mut tables) = self.tables.write() {
            let name = schema.name;
            tables.schemas.insert(name, schema);
            tables.rows.entry(name).or_default();
        }
    }

    /// Toggle availability; while offline every operation fails with [`StoreError::Unavailable`]
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of committed rows in a table
    pub fn len(&self, table: &str) -> usize {
        self.read()
            .ok()
            .and_then(|tables| tables.rows.get(table).map(BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    fn ensure_online(&self) -> Result<(), StoreError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>, StoreError> {
        self.ensure_online()?;
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("table lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>, StoreError> {
        self.ensure_online()?;
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("table lock poisoned".to_string()))
    }
}

fn table_rows<'a>(
    rows: &'a HashMap<&'static str, TableRows>,
    table: &str,
) -> Result<&'a TableRows, StoreError> {
    rows.get(table)
        .ok_or_else(|| StoreError::UnknownTable(table.to_string()))
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn check_row_key(schema: &TableSchema, key: &Key, row: &Row) -> Result<(), StoreError> {
    match row.get(schema.primary_key).and_then(Key::from_value) {
        Some(ref found) if found == key => Ok(()),
        _ => Err(StoreError::MalformedRow {
            table: schema.name.to_string(),
            reason: format!("column '{}' does not hold key {key}", schema.primary_key),
        }),
    }
}

fn check_unique(
    schema: &TableSchema,
    rows: &TableRows,
    key: &Key,
    row: &Row,
) -> Result<(), StoreError> {
    for column in schema.unique {
        let Some(value) = row.get(*column).filter(|v| !v.is_null()) else {
            continue;
        };
        let clash = rows
            .iter()
            .any(|(other_key, other)| other_key != key && other.get(*column) == Some(value));
        if clash {
            return Err(StoreError::UniqueViolation {
                table: schema.name.to_string(),
                column: (*column).to_string(),
                value: render(value),
            });
        }
    }
    Ok(())
}

fn check_foreign_keys(
    schema: &TableSchema,
    all_rows: &HashMap<&'static str, TableRows>,
    row: &Row,
) -> Result<(), StoreError> {
    for fk in &schema.foreign_keys {
        let Some(value) = row.get(fk.column).filter(|v| !v.is_null()) else {
            continue;
        };
        let present = Key::from_value(value)
            .and_then(|key| all_rows.get(fk.references).map(|t| t.contains_key(&key)))
            .unwrap_or(false);
        if !present {
            return Err(StoreError::ForeignKeyViolation {
                table: schema.name.to_string(),
                column: fk.column.to_string(),
                referenced_table: fk.references.to_string(),
                value: render(value),
            });
        }
    }
    Ok(())
}

fn check_not_referenced(
    table: &str,
    key: &Key,
    schemas: &HashMap<&'static str, TableSchema>,
    all_rows: &HashMap<&'static str, TableRows>,
) -> Result<(), StoreError> {
    for schema in schemas.values() {
        for fk in schema.foreign_keys.iter().filter(|fk| fk.references == table) {
            let referenced = all_rows.get(schema.name).is_some_and(|rows| {
                rows.values().any(|row| {
                    row.get(fk.column).and_then(Key::from_value).as_ref() == Some(key)
                })
            });
            if referenced {
                return Err(StoreError::RowReferenced {
                    table: table.to_string(),
                    key: key.to_string(),
                    referencing_table: schema.name.to_string(),
                    column: fk.column.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn apply(
    schemas: &HashMap<&'static str, TableSchema>,
    working: &mut HashMap<&'static str, TableRows>,
    change: Change,
) -> Result<(), StoreError> {
    let table = change.table();
    let schema = schemas
        .get(table)
        .ok_or_else(|| StoreError::UnknownTable(table.to_string()))?;

    match change {
        Change::Insert { key, row, .. } => {
            check_row_key(schema, &key, &row)?;
            let rows = table_rows(working, table)?;
            if rows.contains_key(&key) {
                return Err(StoreError::DuplicateKey {
                    table: table.to_string(),
                    key: key.to_string(),
                });
            }
            check_unique(schema, rows, &key, &row)?;
            check_foreign_keys(schema, working, &row)?;
            if let Some(rows) = working.get_mut(table) {
                rows.insert(key, row);
            }
        }
        Change::Update { key, row, .. } => {
            check_row_key(schema, &key, &row)?;
            let rows = table_rows(working, table)?;
            if !rows.contains_key(&key) {
                return Err(StoreError::MissingRow {
                    table: table.to_string(),
                    key: key.to_string(),
                });
            }
            check_unique(schema, rows, &key, &row)?;
            check_foreign_keys(schema, working, &row)?;
            if let Some(rows) = working.get_mut(table) {
                rows.insert(key, row);
            }
        }
        Change::Delete { key, .. } => {
            if !table_rows(working, table)?.contains_key(&key) {
                return Err(StoreError::MissingRow {
                    table: table.to_string(),
                    key: key.to_string(),
                });
            }
            check_not_referenced(table, &key, schemas, working)?;
            if let Some(rows) = working.get_mut(table) {
                rows.remove(&key);
            }
        }
    }
    Ok(())
}

impl Store for MemoryStore {
    async fn scan(&self, table: &str) -> Result<Vec<Row>, StoreError> {
        let tables = self.read()?;
        Ok(table_rows(&tables.rows, table)?.values().cloned().collect())
    }

    async fn fetch(&self, table: &str, key: &Key) -> Result<Option<Row>, StoreError> {
        let tables = self.read()?;
        Ok(table_rows(&tables.rows, table)?.get(key).cloned())
    }

    async fn fetch_many(&self, table: &str, keys: &[Key]) -> Result<Vec<Row>, StoreError> {
        let tables = self.read()?;
        let rows = table_rows(&tables.rows, table)?;
        Ok(keys.iter().filter_map(|key| rows.get(key).cloned()).collect())
    }

    async fn next_sequence(&self, table: &str) -> Result<i64, StoreError> {
        let mut tables = self.write()?;
        let Some((&name, rows)) = tables.rows.get_key_value(table) else {
            return Err(StoreError::UnknownTable(table.to_string()));
        };
        let highest = rows
            .keys()
            .filter_map(|key| match key {
                Key::Int(n) => Some(*n),
                Key::Text(_) => None,
            })
            .max()
            .unwrap_or(0);
        let sequence = tables.sequences.entry(name).or_insert(0);
        *sequence = (*sequence).max(highest) + 1;
        Ok(*sequence)
    }

    async fn commit(&self, changes: Vec<Change>) -> Result<u64, StoreError> {
        let mut tables = self.write()?;
        let mut working = tables.rows.clone();
        let affected = changes.len() as u64;

        for change in changes {
            apply(&tables.schemas, &mut working, change)?;
        }

        tables.rows = working;
        Ok(affected)
    }
}

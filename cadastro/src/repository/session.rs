//! Change-tracking session
//!
//! The session is the unit of work behind a repository. Mutations are staged
//! as [`Change`]s and only reach the store on [`Session::save_changes`].
//! Rows fetched for a mutation are remembered in an identity map, so repeated
//! lookups of the same key inside one unit of work see the same snapshot.
//!
//! Lookups for mutation read through the staged view: a staged removal hides
//! the row and a staged insert or update is visible.

use std::collections::HashMap;

use serde_json::Value;

use crate::entity::{Entity, EntityKey};
use crate::store::{Change, Key, Row, Store, StoreError};

use super::error::{RepositoryError, RepositoryOperation};

/// Staged changes plus identity-map snapshots over a [`Store`]
#[derive(Debug)]
pub struct Session<S> {
    store: S,
    staged: Vec<Change>,
    snapshots: HashMap<(&'static str, Key), Row>,
}

impl<S: Store> Session<S> {
    /// Empty session over `store`
    ///
    /// ```rust
    /// use cadastro::repository::Session;
    /// use cadastro::store::MemoryStore;
    ///
    /// let session = Session::new(MemoryStore::new());
    /// assert_eq!(session.pending(), 0);
    /// assert!(!session.has_pending());
    /// ```
    pub fn new(store: S) -> Self {
        Self {
            store,
            staged: Vec::new(),
            snapshots: HashMap::new(),
        }
    }

    /// The underlying store; reads through it see committed state only
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of staged changes
    pub fn pending(&self) -> usize {
        self.staged.len()
    }

    /// Whether any change waits for [`Session::save_changes`]
    pub fn has_pending(&self) -> bool {
        !self.staged.is_empty()
    }

    /// Row for `key` as this unit of work sees it
    ///
    /// Returns `None` when the row does not exist or its removal is staged.
    pub async fn lookup(
        &mut self,
        table: &'static str,
        key: &Key,
    ) -> Result<Option<Row>, StoreError> {
        for change in self.staged.iter().rev() {
            if change.table() != table || change.key() != key {
                continue;
            }
            return Ok(match change {
                Change::Insert { row, .. } | Change::Update { row, .. } => Some(row.clone()),
                Change::Delete { .. } => None,
            });
        }

        if let Some(row) = self.snapshots.get(&(table, key.clone())) {
            return Ok(Some(row.clone()));
        }

        let row = self.store.fetch(table, key).await?;
        if let Some(ref row) = row {
            self.snapshots.insert((table, key.clone()), row.clone());
        }
        Ok(row)
    }

    /// Assign a key to a new entity when it has none
    ///
    /// Integer keys reserve the next value of the table's sequence; UUID
    /// keys are generated locally. Keys already set are left alone.
    pub async fn assign_key<E: Entity>(&self, entity: &mut E) -> Result<(), RepositoryError> {
        if !entity.id().is_unassigned() {
            return Ok(());
        }
        let sequence = if <E::Id as EntityKey>::SEQUENTIAL {
            Some(
                self.store
                    .next_sequence(E::TABLE)
                    .await
                    .map_err(|e| RepositoryError::from(e).with_operation(RepositoryOperation::Create))?,
            )
        } else {
            None
        };
        let id = <E::Id as EntityKey>::allocate(sequence).ok_or_else(|| {
            RepositoryError::validation_failed(format!(
                "Não foi possível gerar a chave de {}",
                E::NAME
            ))
        })?;
        entity.set_id(id);
        Ok(())
    }

    /// Queue a change for the next commit
    ///
    /// Nothing is validated here; constraints are checked by the store on
    /// commit.
    pub fn stage(&mut self, change: Change) {
        self.staged.push(change);
    }

    /// Commit every staged change atomically
    ///
    /// On success the staged list and identity map are cleared. On failure
    /// both are kept, so the caller decides whether to retry or discard.
    pub async fn save_changes(&mut self) -> Result<u64, StoreError> {
        if self.staged.is_empty() {
            return Ok(0);
        }
        let affected = self.store.commit(self.staged.clone()).await?;
        self.staged.clear();
        self.snapshots.clear();
        Ok(affected)
    }

    /// Discard staged changes and identity-map snapshots
    pub fn clear(&mut self) {
        self.staged.clear();
        self.snapshots.clear();
    }
}

/// Serialize an entity into a storable row, dropping navigation properties
pub(crate) fn to_row<E: Entity>(
    entity: &E,
    operation: RepositoryOperation,
) -> Result<Row, RepositoryError> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(mut row)) => {
            strip_navigation::<E>(&mut row);
            Ok(row)
        }
        Ok(_) => Err(RepositoryError::serialization_error(
            operation,
            format!("{} não serializa como objeto", E::NAME),
        )),
        Err(e) => Err(RepositoryError::serialization_error(
            operation,
            format!("Falha ao serializar {}: {e}", E::NAME),
        )),
    }
}

pub(crate) fn strip_navigation<E: Entity>(row: &mut Row) {
    for relation in E::RELATIONS {
        row.remove(relation.name);
    }
}

pub(crate) fn from_row<E: Entity>(
    row: Row,
    operation: RepositoryOperation,
) -> Result<E, RepositoryError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        RepositoryError::serialization_error(operation, format!("Falha ao ler {}: {e}", E::NAME))
    })
}

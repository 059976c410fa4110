//! Specification evaluation and query execution
//!
//! [`evaluate`] is pure: it appends the steps a [`Specification`] describes
//! onto a [`Query`] and returns the extended description. Steps are appended
//! in a fixed order: predicate, eager-loading, ordering, paging. Nothing
//! touches the store until [`execute`] runs the query.
//!
//! Execution always starts from the table's rows in primary key order and
//! every sort is stable, so the primary key is the final tie-breaker of any
//! ordering. Predicates placed before eager-loading see scalar columns only.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::entity::{Entity, Relation};
use crate::store::{Key, Row, Store, StoreError};

use super::error::{RepositoryError, RepositoryOperation};
use super::ordering::OrderBy;
use super::session::from_row;
use super::specification::{Predicate, Specification};

/// One step of a query pipeline
pub enum Step<E> {
    Filter(Predicate<E>),
    Include(String),
    Order(OrderBy<E>),
    Skip(u64),
    Take(u64),
}

impl<E> Clone for Step<E> {
    fn clone(&self) -> Self {
        match self {
            Step::Filter(predicate) => Step::Filter(predicate.clone()),
            Step::Include(path) => Step::Include(path.clone()),
            Step::Order(order) => Step::Order(order.clone()),
            Step::Skip(n) => Step::Skip(*n),
            Step::Take(n) => Step::Take(*n),
        }
    }
}

impl<E> fmt::Debug for Step<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Filter(_) => write!(f, "Filter"),
            Step::Include(path) => write!(f, "Include({path})"),
            Step::Order(order) => write!(f, "{order:?}"),
            Step::Skip(n) => write!(f, "Skip({n})"),
            Step::Take(n) => write!(f, "Take({n})"),
        }
    }
}

/// Deferred description of a query over one entity table
pub struct Query<E> {
    steps: Vec<Step<E>>,
}

impl<E> Clone for Query<E> {
    fn clone(&self) -> Self {
        Self {
            steps: self.steps.clone(),
        }
    }
}

impl<E> fmt::Debug for Query<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.steps).finish()
    }
}

impl<E> Default for Query<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Query<E> {
    /// All rows of the table, in primary key order
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    #[must_use]
    pub fn filter(mut self, predicate: Predicate<E>) -> Self {
        self.steps.push(Step::Filter(predicate));
        self
    }

    #[must_use]
    pub fn include(mut self, path: impl Into<String>) -> Self {
        self.steps.push(Step::Include(path.into()));
        self
    }

    /// Sort by `order`, eager-loading whatever relations its keys read first
    #[must_use]
    pub fn order_by(mut self, order: OrderBy<E>) -> Self {
        for include in order.includes() {
            self.steps.push(Step::Include(include.clone()));
        }
        self.steps.push(Step::Order(order));
        self
    }

    #[must_use]
    pub fn skip(mut self, n: u64) -> Self {
        self.steps.push(Step::Skip(n));
        self
    }

    #[must_use]
    pub fn take(mut self, n: u64) -> Self {
        self.steps.push(Step::Take(n));
        self
    }

    pub fn steps(&self) -> &[Step<E>] {
        &self.steps
    }
}

/// Extend `query` with the steps described by `spec`
///
/// An absent specification leaves the query unchanged.
pub fn evaluate<E>(query: Query<E>, spec: Option<&Specification<E>>) -> Query<E> {
    let Some(spec) = spec else {
        return query;
    };

    let mut query = query;
    if let Some(criteria) = spec.criteria() {
        query = query.filter(criteria.clone());
    }
    for include in spec.includes() {
        query = query.include(include.clone());
    }
    if let Some(order) = spec.order() {
        query = query.order_by(order.clone());
    }
    if let Some(skip) = spec.skip() {
        query = query.skip(skip);
    }
    if let Some(take) = spec.take() {
        query = query.take(take);
    }
    query
}

/// Node of a resolved include tree
#[derive(Debug)]
struct IncludeNode {
    relation: &'static Relation,
    children: Vec<IncludeNode>,
}

fn resolve_includes<E: Entity>(
    paths: &[&str],
    operation: RepositoryOperation,
) -> Result<Vec<IncludeNode>, RepositoryError> {
    let mut roots: Vec<IncludeNode> = Vec::new();
    for path in paths {
        let unknown = || {
            RepositoryError::invalid_query(
                operation,
                format!("Relação '{path}' não existe em {}", E::NAME),
            )
        };
        let mut level = &mut roots;
        let mut available: Option<&'static [Relation]> = None;
        for segment in path.split('.') {
            let relation = match available {
                None => E::relation(segment),
                Some(nested) => nested.iter().find(|relation| relation.name == segment),
            }
            .ok_or_else(unknown)?;
            let index = match level.iter().position(|node| node.relation.name == segment) {
                Some(index) => index,
                None => {
                    level.push(IncludeNode {
                        relation,
                        children: Vec::new(),
                    });
                    level.len() - 1
                }
            };
            available = Some(relation.nested);
            level = &mut level[index].children;
        }
    }
    Ok(roots)
}

type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;

/// Batch-load each relation once for all rows at this level, then recurse
fn load_includes<'a, S: Store>(
    store: &'a S,
    rows: &'a mut [Row],
    nodes: &'a [IncludeNode],
) -> LoadFuture<'a> {
    Box::pin(async move {
        for node in nodes {
            let relation = node.relation;
            let mut keys: Vec<Key> = rows
                .iter()
                .filter_map(|row| row.get(relation.foreign_key).and_then(Key::from_value))
                .collect();
            keys.sort();
            keys.dedup();

            let mut related = if keys.is_empty() {
                Vec::new()
            } else {
                store.fetch_many(relation.table, &keys).await?
            };
            if !node.children.is_empty() {
                load_includes(store, &mut related, &node.children).await?;
            }

            let by_key: HashMap<Key, Row> = related
                .into_iter()
                .filter_map(|row| {
                    let key = row.get(relation.table_key).and_then(Key::from_value)?;
                    Some((key, row))
                })
                .collect();

            for row in rows.iter_mut() {
                let value = row
                    .get(relation.foreign_key)
                    .and_then(Key::from_value)
                    .and_then(|key| by_key.get(&key))
                    .map_or(Value::Null, |related| Value::Object(related.clone()));
                row.insert(relation.name.to_string(), value);
            }
        }
        Ok(())
    })
}

/// Row with its decoded entity, re-decoded after eager-loading changes the row
struct Slot<E> {
    row: Row,
    entity: Option<E>,
}

fn materialize<E: Entity>(
    slots: &mut [Slot<E>],
    operation: RepositoryOperation,
) -> Result<(), RepositoryError> {
    for slot in slots.iter_mut().filter(|slot| slot.entity.is_none()) {
        slot.entity = Some(from_row(slot.row.clone(), operation)?);
    }
    Ok(())
}

/// Run a query against committed store state
pub(crate) async fn execute<S: Store, E: Entity>(
    store: &S,
    query: &Query<E>,
    operation: RepositoryOperation,
) -> Result<Vec<E>, RepositoryError> {
    let mut rows = store
        .scan(E::TABLE)
        .await
        .map_err(|e| RepositoryError::from(e).with_operation(operation))?;
    rows.sort_by_cached_key(|row| row.get(E::PRIMARY_KEY).and_then(Key::from_value));

    let mut slots: Vec<Slot<E>> = rows
        .into_iter()
        .map(|row| Slot { row, entity: None })
        .collect();

    let steps = query.steps();
    let mut index = 0;
    while index < steps.len() {
        match &steps[index] {
            Step::Filter(predicate) => {
                materialize(&mut slots, operation)?;
                slots.retain(|slot| slot.entity.as_ref().is_some_and(|e| predicate(e)));
            }
            Step::Include(_) => {
                let mut paths = Vec::new();
                while let Some(Step::Include(path)) = steps.get(index) {
                    paths.push(path.as_str());
                    index += 1;
                }
                let tree = resolve_includes::<E>(&paths, operation)?;
                let mut rows: Vec<Row> = slots.iter().map(|slot| slot.row.clone()).collect();
                load_includes(store, &mut rows, &tree)
                    .await
                    .map_err(|e| RepositoryError::from(e).with_operation(operation))?;
                slots = rows
                    .into_iter()
                    .map(|row| Slot { row, entity: None })
                    .collect();
                continue;
            }
            Step::Order(order) => {
                materialize(&mut slots, operation)?;
                slots.sort_by(|a, b| match (&a.entity, &b.entity) {
                    (Some(a), Some(b)) => order.compare(a, b),
                    _ => std::cmp::Ordering::Equal,
                });
            }
            Step::Skip(n) => {
                let n = usize::try_from(*n).unwrap_or(usize::MAX).min(slots.len());
                slots.drain(..n);
            }
            Step::Take(n) => {
                slots.truncate(usize::try_from(*n).unwrap_or(usize::MAX));
            }
        }
        index += 1;
    }

    materialize(&mut slots, operation)?;
    let entities: Vec<E> = slots.into_iter().filter_map(|slot| slot.entity).collect();
    tracing::debug!(
        entity = E::NAME,
        table = E::TABLE,
        steps = steps.len(),
        rows = entities.len(),
        "Query executed"
    );
    Ok(entities)
}

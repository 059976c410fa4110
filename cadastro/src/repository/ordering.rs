//! Composite ordering and the dynamic order builder
//!
//! [`OrderBy`] is an ordered list of sort keys; the first key is primary and
//! later keys break ties. [`OrderBy::from_columns`] resolves textual column
//! paths (`"nome"`, `"marca.nome"`) against an entity's field table at
//! runtime, failing fast on unknown paths.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::entity::{Entity, FieldValue};

use super::error::{RepositoryError, RepositoryOperation};
use super::pagination::SortColumn;

type KeyFn<E> = Arc<dyn Fn(&E) -> FieldValue + Send + Sync>;

struct SortKey<E> {
    label: String,
    read: KeyFn<E>,
    descending: bool,
}

impl<E> Clone for SortKey<E> {
    fn clone(&self) -> Self {
        Self {
            label: self.label.clone(),
            read: Arc::clone(&self.read),
            descending: self.descending,
        }
    }
}

/// Composite ordering over an entity type
pub struct OrderBy<E> {
    keys: Vec<SortKey<E>>,
    includes: Vec<String>,
}

impl<E> Clone for OrderBy<E> {
    fn clone(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            includes: self.includes.clone(),
        }
    }
}

impl<E> fmt::Debug for OrderBy<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .keys
            .iter()
            .map(|k| format!("{} {}", k.label, if k.descending { "desc" } else { "asc" }))
            .collect();
        f.debug_struct("OrderBy")
            .field("keys", &keys)
            .field("includes", &self.includes)
            .finish()
    }
}

impl<E> Default for OrderBy<E> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            includes: Vec::new(),
        }
    }
}

impl<E> OrderBy<E> {
    pub fn asc(
        label: impl Into<String>,
        read: impl Fn(&E) -> FieldValue + Send + Sync + 'static,
    ) -> Self {
        Self::default().then_by(label, read, false)
    }

    pub fn desc(
        label: impl Into<String>,
        read: impl Fn(&E) -> FieldValue + Send + Sync + 'static,
    ) -> Self {
        Self::default().then_by(label, read, true)
    }

    /// Append a tie-breaking key
    #[must_use]
    pub fn then_by(
        mut self,
        label: impl Into<String>,
        read: impl Fn(&E) -> FieldValue + Send + Sync + 'static,
        descending: bool,
    ) -> Self {
        self.keys.push(SortKey {
            label: label.into(),
            read: Arc::new(read),
            descending,
        });
        self
    }

    /// Append all keys of another ordering as tie-breakers
    #[must_use]
    pub fn then(mut self, other: OrderBy<E>) -> Self {
        self.keys.extend(other.keys);
        for include in other.includes {
            if !self.includes.contains(&include) {
                self.includes.push(include);
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Include paths the sort keys read from
    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        for key in &self.keys {
            let ordering = (key.read)(a).compare(&(key.read)(b));
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort; rows equal under every key keep their input order
    pub fn sort(&self, items: &mut [E]) {
        if !self.keys.is_empty() {
            items.sort_by(|a, b| self.compare(a, b));
        }
    }
}

impl<E: Entity> OrderBy<E> {
    /// Build an ordering from `(column path, descending)` pairs
    ///
    /// Paths are looked up in [`Entity::FIELDS`]; fields backed by a
    /// relation register that relation as an include.
    pub fn from_columns(columns: &[SortColumn]) -> Result<Self, RepositoryError> {
        let mut order = Self::default();
        for column in columns {
            let field = E::field(&column.column).ok_or_else(|| {
                RepositoryError::invalid_query(
                    RepositoryOperation::Paginate,
                    format!(
                        "Coluna de ordenação '{}' não existe em {}",
                        column.column,
                        E::NAME
                    ),
                )
            })?;
            let read = field.read;
            order = order.then_by(field.path, read, column.descending);
            if let Some(relation) = field.relation {
                if !order.includes.iter().any(|i| i == relation) {
                    order.includes.push(relation.to_string());
                }
            }
        }
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Field;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Linha {
        id: i32,
        nome: String,
        valor: i64,
        #[serde(default)]
        grupo: Option<Grupo>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Grupo {
        id: i32,
        nome: String,
    }

    impl Entity for Linha {
        type Id = i32;
        const TABLE: &'static str = "linhas";
        const NAME: &'static str = "Linha";
        const FIELDS: &'static [Field<Self>] = &[
            Field::scalar("nome", |l: &Self| FieldValue::from(l.nome.as_str())),
            Field::scalar("valor", |l: &Self| FieldValue::from(l.valor)),
            Field::related("grupo.nome", "grupo", |l: &Self| {
                FieldValue::from(l.grupo.as_ref().map(|g| g.nome.clone()))
            }),
        ];

        fn id(&self) -> i32 {
            self.id
        }

        fn set_id(&mut self, id: i32) {
            self.id = id;
        }
    }

    fn linha(id: i32, nome: &str, valor: i64) -> Linha {
        Linha {
            id,
            nome: nome.to_string(),
            valor,
            grupo: None,
        }
    }

    #[test]
    fn test_composite_ordering_breaks_ties() {
        let mut items = vec![linha(1, "b", 1), linha(2, "a", 2), linha(3, "a", 1)];
        let order = OrderBy::asc("nome", |l: &Linha| FieldValue::from(l.nome.as_str()))
            .then_by("valor", |l: &Linha| FieldValue::from(l.valor), true);
        order.sort(&mut items);
        let ids: Vec<i32> = items.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut items = vec![linha(1, "a", 5), linha(2, "a", 5), linha(3, "a", 5)];
        OrderBy::desc("valor", |l: &Linha| FieldValue::from(l.valor)).sort(&mut items);
        let ids: Vec<i32> = items.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_from_columns_resolves_paths() {
        let order = OrderBy::<Linha>::from_columns(&[
            SortColumn::desc("valor"),
            SortColumn::asc("nome"),
        ])
        .unwrap();
        let mut items = vec![linha(1, "z", 1), linha(2, "b", 3), linha(3, "a", 3)];
        order.sort(&mut items);
        let ids: Vec<i32> = items.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert!(order.includes().is_empty());
    }

    #[test]
    fn test_from_columns_registers_relation_include() {
        let order = OrderBy::<Linha>::from_columns(&[SortColumn::asc("grupo.nome")]).unwrap();
        assert_eq!(order.includes(), ["grupo".to_string()]);
    }

    #[test]
    fn test_from_columns_rejects_unknown_path() {
        let error = OrderBy::<Linha>::from_columns(&[SortColumn::asc("inexistente")]).unwrap_err();
        assert_eq!(error.kind, crate::repository::RepositoryErrorKind::InvalidQuery);
        assert!(error.message.contains("inexistente"));
    }

    #[test]
    fn test_empty_columns_is_identity() {
        let order = OrderBy::<Linha>::from_columns(&[]).unwrap();
        assert!(order.is_empty());
        let mut items = vec![linha(2, "b", 1), linha(1, "a", 1)];
        order.sort(&mut items);
        assert_eq!(items[0].id, 2);
    }
}

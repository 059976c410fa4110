//! Query specifications
//!
//! A [`Specification`] bundles what a caller wants from a listing: a
//! predicate, the relations to eager-load, an ordering and optional paging
//! bounds. Builder methods consume and return the specification, so a built
//! value is never mutated afterwards and can be shared freely.
//!
//! # Example
//!
//! ```rust,ignore
//! let spec = Specification::<Veiculo>::new(|v| v.ano >= 2020)
//!     .include("modelo.marca")
//!     .order_by(OrderBy::desc("ano", |v: &Veiculo| FieldValue::from(v.ano)))
//!     .paged(0, 10);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::entity::{Entity, EntityKey};

use super::ordering::OrderBy;

/// Shared predicate over an entity
pub type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Declarative description of a query over `E`
pub struct Specification<E> {
    criteria: Option<Predicate<E>>,
    includes: Vec<String>,
    order: Option<OrderBy<E>>,
    skip: Option<u64>,
    take: Option<u64>,
}

impl<E> Clone for Specification<E> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            includes: self.includes.clone(),
            order: self.order.clone(),
            skip: self.skip,
            take: self.take,
        }
    }
}

impl<E> fmt::Debug for Specification<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("criteria", &self.criteria.is_some())
            .field("includes", &self.includes)
            .field("order", &self.order)
            .field("skip", &self.skip)
            .field("take", &self.take)
            .finish()
    }
}

impl<E: 'static> Default for Specification<E> {
    fn default() -> Self {
        Self::all()
    }
}

impl<E: 'static> Specification<E> {
    /// Specification matching rows that satisfy `predicate`
    pub fn new(predicate: impl Fn(&E) -> bool + Send + Sync + 'static) -> Self {
        Self {
            criteria: Some(Arc::new(predicate)),
            ..Self::all()
        }
    }

    /// Match-all specification
    pub fn all() -> Self {
        Self {
            criteria: None,
            includes: Vec::new(),
            order: None,
            skip: None,
            take: None,
        }
    }

    /// Keyword search; a blank keyword matches everything
    ///
    /// `matches` receives the trimmed keyword.
    pub fn search(
        keyword: &str,
        matches: impl Fn(&E, &str) -> bool + Send + Sync + 'static,
    ) -> Self {
        let keyword = keyword.trim().to_string();
        if keyword.is_empty() {
            Self::all()
        } else {
            Self::new(move |entity| matches(entity, &keyword))
        }
    }

    /// Eager-load a relation; dotted paths reach nested relations
    #[must_use]
    pub fn include(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        if !self.includes.contains(&path) {
            self.includes.push(path);
        }
        self
    }

    #[must_use]
    pub fn order_by(mut self, order: OrderBy<E>) -> Self {
        self.order = Some(order);
        self
    }

    /// Paging bounds applied after filtering and ordering
    #[must_use]
    pub fn paged(mut self, skip: u64, take: u64) -> Self {
        self.skip = Some(skip);
        self.take = Some(take);
        self
    }

    /// Same specification with its paging bounds removed
    #[must_use]
    pub fn without_paging(mut self) -> Self {
        self.skip = None;
        self.take = None;
        self
    }

    /// Both predicates must hold; includes are unioned and orderings concatenated
    #[must_use]
    pub fn and(self, other: Specification<E>) -> Self {
        let criteria = match (self.criteria, other.criteria) {
            (Some(a), Some(b)) => {
                let combined: Predicate<E> = Arc::new(move |entity: &E| a(entity) && b(entity));
                Some(combined)
            }
            (a, b) => a.or(b),
        };
        let order = match (self.order, other.order) {
            (Some(a), Some(b)) => Some(a.then(b)),
            (a, b) => a.or(b),
        };
        let mut includes = self.includes;
        for include in other.includes {
            if !includes.contains(&include) {
                includes.push(include);
            }
        }
        Self {
            criteria,
            includes,
            order,
            skip: self.skip.or(other.skip),
            take: self.take.or(other.take),
        }
    }
}

impl<E> Specification<E> {
    pub fn is_satisfied_by(&self, entity: &E) -> bool {
        self.criteria.as_ref().map_or(true, |criteria| criteria(entity))
    }

    pub fn criteria(&self) -> Option<&Predicate<E>> {
        self.criteria.as_ref()
    }

    pub fn includes(&self) -> &[String] {
        &self.includes
    }

    pub fn order(&self) -> Option<&OrderBy<E>> {
        self.order.as_ref()
    }

    pub fn skip(&self) -> Option<u64> {
        self.skip
    }

    pub fn take(&self) -> Option<u64> {
        self.take
    }
}

impl<E: Entity> Specification<E> {
    /// Rows whose key differs from `id`, for uniqueness checks on update
    pub fn excluding_id(id: E::Id) -> Self {
        Self::new(move |entity: &E| entity.id() != id)
    }

    /// Rows whose key equals `id`
    pub fn by_id(id: E::Id) -> Self {
        let key = id.to_key();
        Self::new(move |entity: &E| entity.id().to_key() == key)
    }
}

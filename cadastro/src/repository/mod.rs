//! Specification-driven generic repository
//!
//! This module provides the data-access core shared by CRUD services:
//!
//! - **Specifications**: [`Specification`] bundles a predicate, eager-loaded
//!   relations, an ordering and paging bounds
//! - **Evaluation**: [`evaluate`] turns a specification into a deferred [`Query`]
//! - **Dynamic ordering**: [`OrderBy::from_columns`] resolves textual column
//!   paths (including dotted paths through relations) at runtime
//! - **Generic CRUD**: [`Repository`] with staged mutations and explicit
//!   [`Repository::save_changes`]
//! - **Outcomes**: [`Outcome`] separates success, partial success and failure
//! - **Bulk deletes**: [`Repository::delete_many`] commits item by item and
//!   reports "N de M registros excluídos" on partial failure
//!
//! # Example
//!
//! ```rust,ignore
//! use cadastro::prelude::*;
//!
//! let mut repo = Repository::new(store);
//!
//! let spec = Specification::search(&keyword, |t: &Tarifa, k| t.descricao.contains(k))
//!     .include("categoria");
//! let page = repo
//!     .get_paginated::<Tarifa, TarifaDto>(2, 10, Some(&spec))
//!     .await?;
//!
//! let removed = repo.delete_many::<Tarifa>(&[4, 8, 15]).await;
//! if let Outcome::PartialSuccess { message, .. } = &removed {
//!     tracing::warn!("{message}");
//! }
//! ```

mod bulk;
mod error;
mod evaluator;
mod generic;
mod ordering;
mod outcome;
mod pagination;
mod session;
mod specification;

// Re-export all public types
pub use bulk::{delete_each, BulkReport};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use evaluator::{evaluate, Query, Step};
pub use generic::{Repository, RepositoryResult};
pub use ordering::OrderBy;
pub use outcome::Outcome;
pub use pagination::{PaginatedResult, Pagination, SortColumn, TableFilter};
pub use session::Session;
pub use specification::{Predicate, Specification};

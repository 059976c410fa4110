//! # cadastro
//!
//! Specification-driven generic repository for CRUD services.
//!
//! ## Features
//!
//! - **Specifications**: predicates, eager-loaded relations, ordering and paging in one value
//! - **Dynamic ordering**: sort by textual column paths, including dotted paths through relations
//! - **Projection & pagination**: pages of read-only views with total counts
//! - **Unit of work**: staged create/update/remove committed atomically by `save_changes`
//! - **Outcomes**: `Success`, `PartialSuccess` and `Fail` instead of exceptions for expected conditions
//! - **Bulk deletes**: item-by-item commits that tolerate partial failure
//! - **Pluggable store**: any engine behind the [`Store`](store::Store) trait; an in-memory store ships with the crate
//!
//! ## Example
//!
//! ```rust,no_run
//! use cadastro::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Distrito {
//!     id: i32,
//!     nome: String,
//! }
//!
//! impl Entity for Distrito {
//!     type Id = i32;
//!     const TABLE: &'static str = "distritos";
//!     const NAME: &'static str = "Distrito";
//!
//!     fn id(&self) -> i32 { self.id }
//!     fn set_id(&mut self, id: i32) { self.id = id; }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let store = MemoryStore::new().with_entity::<Distrito>();
//!     let mut repo = Repository::new(store).with_pagination(config.pagination);
//!
//!     let _ = repo.create(Distrito { id: 0, nome: "Centro".into() }).await?;
//!     let _ = repo.save_changes().await?;
//!
//!     let spec = Specification::search("cen", |d: &Distrito, k| d.nome.to_lowercase().contains(k));
//!     let found = repo.get_list(Some(&spec)).await?;
//!     assert_eq!(found.value().map(Vec::len), Some(1));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entity;
pub mod error;
pub mod observability;
pub mod repository;
pub mod store;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, PaginationConfig};
    pub use crate::entity::{Entity, EntityKey, Field, FieldValue, Projection, Relation};
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        evaluate, BulkReport, OrderBy, Outcome, PaginatedResult, Query, Repository,
        RepositoryError, RepositoryErrorKind, RepositoryResult, SortColumn, Specification,
        TableFilter,
    };
    pub use crate::store::{MemoryStore, Store};
}
